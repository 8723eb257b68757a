//! Error types for dictionary construction and serialization.

use thiserror::Error;

/// Error variants for dictionary operations.
///
/// A missing key is never an error: `lookup` signals absence with
/// `Option`. These variants cover the build and (de)serialization
/// surfaces only.
#[derive(Debug, Error)]
pub enum Error {
    /// The input key list violates the construction contract
    /// (empty, unsorted, or containing duplicates).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An I/O error occurred while saving or loading a dictionary.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialized dictionary failed a structural check
    /// (bad magic, truncated section, inconsistent index sizes,
    /// or a misaligned memory-mapped region).
    #[error("corrupt data: {0}")]
    CorruptData(String),
}

/// A specialized Result type for dictionary operations.
pub type Result<T> = std::result::Result<T, Error>;
