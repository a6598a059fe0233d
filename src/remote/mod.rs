// Remote module: access to the mirrored Maven repository

pub mod fetch_trait;
pub mod http;

pub use fetch_trait::Fetch;
pub use http::HttpFetcher;
