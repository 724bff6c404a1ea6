//! Error types for the orientation search.

use thiserror::Error;

/// Errors that can occur while searching for a print orientation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweakError {
    /// Point stream is empty or not grouped in triangles.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Every facet is too small to score.
    #[error("mesh has degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Invalid search settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for orientation operations.
pub type Result<T> = std::result::Result<T, TweakError>;
