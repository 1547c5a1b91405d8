use thiserror::Error;

/// Result type for signature operations
pub type Result<T> = std::result::Result<T, SignatureError>;

/// Errors that can occur while building or normalizing a signature
#[derive(Error, Debug)]
pub enum SignatureError {
    /// Name pattern failed to compile
    #[error("invalid name pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Unsupported pattern flag character
    #[error("unsupported pattern flag '{flag}' in '{flags}'")]
    UnsupportedFlag { flag: char, flags: String },
}
