//! Error types shared across the core.

use crate::lattice::PointKind;
use thiserror::Error;

/// Errors raised by the editor core.
///
/// Every variant marks a programming or configuration defect rather than bad
/// user input: ids are produced internally, query specs are static data and
/// the gesture table covers every supported pointer combination.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid point id: {0:?}")]
    InvalidPointId(String),
    #[error("Unsupported query transition: {from:?} -> {to:?}")]
    UnsupportedTransition { from: PointKind, to: PointKind },
    #[error("Query leaf {leaf} is not defined for {kind:?} points")]
    UnsupportedLeaf { kind: PointKind, leaf: &'static str },
    #[error("Path filling exceeded {limit} steps")]
    PathLimitExceeded { limit: usize },
    #[error("Outline walk exceeded {limit} steps")]
    OutlineLimitExceeded { limit: usize },
    #[error("Gesture logic error: {0}")]
    GestureLogic(String),
    #[error("No storage for layer {layer:?} in grid {grid:?}")]
    MissingStorage { grid: String, layer: String },
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
