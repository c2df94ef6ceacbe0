//! Error types for layout search and request validation.

use thiserror::Error;

/// Failure of a single tournament trial.
///
/// Trials never abort a run: the tournament logs the error and drops the
/// trial from the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("{trial}: piece {a} overlaps piece {b}")]
    Overlap { trial: String, a: String, b: String },

    #[error("{trial}: piece {id} at ({x}, {y}) leaves the {bin_w}x{bin_h} bin")]
    OutOfBounds {
        trial: String,
        id: String,
        x: u32,
        y: u32,
        bin_w: u32,
        bin_h: u32,
    },

    #[error("exact model limited to {limit} pieces, got {count}")]
    TooManyItems { count: usize, limit: usize },
}

/// Rejected optimization request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("stock dimensions must be non-zero")]
    EmptyStock,

    #[error("piece id must not be empty")]
    EmptyPieceId,

    #[error("piece {id}: dimensions must be non-zero")]
    EmptyPiece { id: String },

    #[error("piece {id}: quantity must be non-zero")]
    ZeroQuantity { id: String },

    #[error("duplicate piece id {id}")]
    DuplicatePieceId { id: String },

    #[error("piece id {id} clashes with a unit of piece {base} (quantity {quantity})")]
    InstanceIdClash {
        id: String,
        base: String,
        quantity: u32,
    },

    #[error("{field} must be a finite, non-negative number, got {value}")]
    InvalidParameter { field: &'static str, value: f64 },
}
