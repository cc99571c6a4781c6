//! Error types

use thiserror::Error;

/// Errors returned by encoding detection
#[derive(Debug, Error)]
pub enum DetectError {
    /// Opening, inspecting or reading the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is larger than the configured ceiling
    #[error("file size {size_mb} MB is at or above the configured limit of {limit_mb} MB")]
    SizeLimitExceeded { size_mb: f64, limit_mb: f64 },

    /// The leading lines carry a declaration that cannot be honoured
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// No candidate codec decodes the sampled content
    #[error("none of the {candidates} candidate codecs can decode the content")]
    Undetectable { candidates: usize },
}

/// A malformed encoding declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// The cookie names a codec nobody knows
    #[error("unknown encoding declared: {name}")]
    UnknownEncoding { name: String },

    /// A UTF-8 byte order mark followed by a cookie naming something else
    #[error("encoding problem: utf-8 byte order mark conflicts with declared {declared}")]
    BomMismatch { declared: String },
}

pub type Result<T> = std::result::Result<T, DetectError>;
