// Error types shared by every pipeline stage

use std::path::PathBuf;

use crate::disassemble::DisassemblyFailure;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {message} ({url})")]
    Http {
        url: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response (connect failure, timeout, broken body).
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed {document}: {reason}")]
    MalformedIndex { document: String, reason: String },

    #[error("failed to extract {}", archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("failed to disassemble {}", path.display())]
    Disassembly {
        path: PathBuf,
        #[source]
        source: DisassemblyFailure,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("worker task did not complete")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn malformed(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedIndex {
            document: document.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that came back from the remote side rather than local I/O.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Http { .. } | Error::Transport { .. })
    }
}

/// Cause of a failed archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}
