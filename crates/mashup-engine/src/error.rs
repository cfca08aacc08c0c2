use std::path::PathBuf;

use thiserror::Error;

/// Fallback shown when a failure carries no usable description.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("no generated image to download")]
    NothingToDownload,

    #[error("generated image payload is corrupt: {0}")]
    CorruptPayload(String),

    #[error("failed writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Every way a generation call can fail, collapsed to one message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The text shown to the user; never empty.
    pub fn display_message(&self) -> &str {
        let trimmed = self.message.trim();
        if trimmed.is_empty() {
            GENERIC_FAILURE_MESSAGE
        } else {
            trimmed
        }
    }
}
