use thiserror::Error;

/// Core error type shared across casegen crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A field case name could not be parsed.
    #[error("unknown field case: {0}")]
    UnknownCase(String),
    /// A character set id is not registered.
    #[error("unknown character set: {0}")]
    UnknownCharacterSet(String),
    /// A character set definition is unusable.
    #[error("invalid character set '{id}': {reason}")]
    InvalidCharacterSet { id: String, reason: String },
}

/// Convenience alias for results returned by casegen crates.
pub type Result<T> = std::result::Result<T, CoreError>;
