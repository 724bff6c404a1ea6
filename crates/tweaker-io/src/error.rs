//! Error types for mesh loading and writing.

use thiserror::Error;
use tweaker::TweakError;

/// Errors that can occur while reading or writing mesh files.
#[derive(Error, Debug)]
pub enum IoError {
    /// I/O error from the standard library.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension is neither `.stl` nor `.3mf`.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Malformed STL content.
    #[error("STL error: {0}")]
    Stl(String),

    /// Malformed 3MF archive or model.
    #[error("3MF error: {0}")]
    ThreeMf(String),

    /// The loaded mesh was rejected by the orientation search.
    #[error(transparent)]
    Mesh(#[from] TweakError),
}

/// Result type for mesh I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;
