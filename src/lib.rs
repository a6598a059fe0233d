//! # maven-exploder
//!
//! Mirrors a remote Maven repository into a local directory tree, unpacks
//! every downloaded artifact and writes a bytecode listing next to each
//! class file it contains.
//!
//! ## Architecture
//!
//! - **model**: Namespace, artifact, version and file type identifiers and the URLs built from them
//! - **index**: Streaming parsers for the master index, group indexes and POM packaging
//! - **remote**: HTTP transport behind the `Fetch` trait
//! - **pipeline**: Order-preserving parallel map used by every phase
//! - **extract**: Archive explosion, including the nested `classes.jar`
//! - **disassemble**: Class file parsing and listing backends (native and `javap`)
//! - **orchestrator**: The six sequential phases of a run and their summary
//! - **config**: Settings merged from CLI flags, `exploder.toml` and defaults
//! - **ui**: Progress bars and styled terminal output

pub mod cli;
pub mod config;
pub mod constants;
pub mod disassemble;
pub mod error;
pub mod extract;
pub mod index;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod remote;
pub mod ui;
