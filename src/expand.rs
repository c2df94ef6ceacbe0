//! Quantity expansion and up-front feasibility filtering.

use crate::types::{Piece, PieceInstance, Stock};

/// Instances ready for the search, plus the ids that can never fit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub instances: Vec<PieceInstance>,
    pub impossible: Vec<String>,
}

/// Expands every piece into one instance per unit of quantity, padding each
/// side by `kerf`. An instance whose padded size fits the stock in no
/// permitted orientation goes to `impossible` and never reaches the search.
pub fn expand(pieces: &[Piece], kerf: u32, stock: Stock, allow_rotate: bool) -> Expansion {
    let mut expansion = Expansion::default();

    for piece in pieces {
        let padded = piece.rect.padded(kerf);
        let rotatable = allow_rotate && !piece.grain_locked;
        let fits = stock.admits(padded) || (rotatable && stock.admits(padded.rotated()));

        for n in 1..=piece.qty {
            let id = if piece.qty == 1 {
                piece.id.clone()
            } else {
                format!("{}-{}", piece.id, n)
            };
            if fits {
                expansion.instances.push(PieceInstance {
                    id,
                    piece_id: piece.id.clone(),
                    rect: piece.rect,
                    padded,
                    allow_rotate: rotatable,
                });
            } else {
                expansion.impossible.push(id);
            }
        }
    }

    tracing::debug!(
        instances = expansion.instances.len(),
        impossible = expansion.impossible.len(),
        kerf,
        "expanded pieces"
    );
    expansion
}
