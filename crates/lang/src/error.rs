use std::time::Duration;
use thiserror::Error;

/// Result type for language integration operations
pub type Result<T> = std::result::Result<T, IntegrationError>;

/// Errors raised by a language integration. All of these are recoverable
/// from the coordinator's point of view: a failing file or probe is skipped
/// and discovery continues with the next candidate.
#[derive(Error, Debug)]
pub enum IntegrationError {
    /// Source file failed extraction
    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// Tree-sitter grammar could not be installed
    #[error("grammar error: {0}")]
    Grammar(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Runtime probe exceeded its hard timeout
    #[error("runtime probe timed out after {timeout:?}")]
    ProbeTimeout { timeout: Duration },

    /// Runtime probe produced more output than allowed
    #[error("runtime probe output exceeded {limit} bytes")]
    ProbeOutputOverflow { limit: usize },

    /// Runtime probe process failed
    #[error("runtime probe failed: {0}")]
    ProbeFailed(String),

    /// Runtime probe printed something that is not the expected JSON
    #[error("malformed probe output: {0}")]
    MalformedProbeOutput(#[from] serde_json::Error),
}

impl IntegrationError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
