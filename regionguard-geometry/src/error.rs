//! Error types for shape construction.

use thiserror::Error;

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while building a shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// A polygon needs at least three vertices.
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),
}
