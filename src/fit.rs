//! Shared scoring for free-rectangle placement.

use crate::types::{Rect, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::enum_variant_names)]
pub enum FitRule {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
}

impl FitRule {
    /// Leftover margin of `piece` inside `free`; lower is tighter.
    /// `piece` must fit in `free`.
    pub fn score(self, piece: Rect, free: Rect) -> (u64, u64) {
        let dw = (free.w - piece.w) as u64;
        let dh = (free.h - piece.h) as u64;
        let short = dw.min(dh);
        let long = dw.max(dh);
        match self {
            FitRule::BestAreaFit => (free.area() - piece.area(), short),
            FitRule::BestShortSideFit => (short, long),
            FitRule::BestLongSideFit => (long, short),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            FitRule::BestAreaFit => "baf",
            FitRule::BestShortSideFit => "bssf",
            FitRule::BestLongSideFit => "blsf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeRect {
    pub x: u32,
    pub y: u32,
    pub rect: Rect,
}

impl FreeRect {
    pub fn right(&self) -> u32 {
        self.x + self.rect.w
    }

    pub fn top(&self) -> u32 {
        self.y + self.rect.h
    }

    pub fn contains(&self, other: &FreeRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredPlacement {
    pub free_idx: usize,
    pub rotated: bool,
    pub score: (u64, u64),
    pub x: u32,
    pub y: u32,
}

impl ScoredPlacement {
    /// Equal scores prefer the lower, then left-most position.
    fn key(&self) -> (u64, u64, u32, u32) {
        (self.score.0, self.score.1, self.y, self.x)
    }
}

/// Free space inside one bin: picks where a piece goes and splits what is
/// left over.
pub trait FreeSpace {
    fn find_best(&self, piece: Rect, allow_rotate: bool) -> Option<ScoredPlacement>;

    /// Commits a placement found by `find_best` for the same `piece`.
    fn place(&mut self, scored: ScoredPlacement, piece: Rect) -> (u32, u32, Rect);

    /// Places `piece` if any free rectangle admits it.
    fn insert(&mut self, index: usize, piece: Rect, allow_rotate: bool) -> Option<Slot> {
        let scored = self.find_best(piece, allow_rotate)?;
        let (x, y, rect) = self.place(scored, piece);
        Some(Slot {
            index,
            x,
            y,
            rect,
            rotated: scored.rotated,
        })
    }
}

/// Tries every free rectangle in both permitted orientations and keeps the
/// tightest fit under `rule`.
pub fn best_fit(
    free_rects: &[FreeRect],
    piece: Rect,
    allow_rotate: bool,
    rule: FitRule,
) -> Option<ScoredPlacement> {
    let mut best: Option<ScoredPlacement> = None;
    let orientations: &[bool] = if allow_rotate && !piece.is_square() {
        &[false, true]
    } else {
        &[false]
    };

    for (idx, free) in free_rects.iter().enumerate() {
        for &rotated in orientations {
            let oriented = if rotated { piece.rotated() } else { piece };
            if !oriented.fits_in(&free.rect) {
                continue;
            }
            let candidate = ScoredPlacement {
                free_idx: idx,
                rotated,
                score: rule.score(oriented, free.rect),
                x: free.x,
                y: free.y,
            };
            if best.is_none_or(|b| candidate.key() < b.key()) {
                best = Some(candidate);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(x: u32, y: u32, w: u32, h: u32) -> FreeRect {
        FreeRect { x, y, rect: Rect::new(w, h) }
    }

    #[test]
    fn test_short_side_prefers_snug_edge() {
        let rects = [free(0, 0, 100, 100), free(100, 0, 52, 400)];
        let best = best_fit(&rects, Rect::new(50, 50), false, FitRule::BestShortSideFit).unwrap();
        assert_eq!(best.free_idx, 1);
    }

    #[test]
    fn test_area_fit_prefers_small_rect() {
        let rects = [free(0, 0, 60, 400), free(60, 0, 100, 100)];
        let best = best_fit(&rects, Rect::new(50, 50), false, FitRule::BestAreaFit).unwrap();
        assert_eq!(best.free_idx, 1);
    }

    #[test]
    fn test_rotation_chosen_when_tighter() {
        let rects = [free(0, 0, 30, 100)];
        let best = best_fit(&rects, Rect::new(100, 30), true, FitRule::BestShortSideFit).unwrap();
        assert!(best.rotated);
        assert_eq!(best.score, (0, 0));
    }

    #[test]
    fn test_ties_prefer_lowest_position() {
        let rects = [free(0, 500, 100, 100), free(0, 0, 100, 100)];
        let best = best_fit(&rects, Rect::new(40, 40), false, FitRule::BestAreaFit).unwrap();
        assert_eq!((best.x, best.y), (0, 0));
    }

    #[test]
    fn test_nothing_fits() {
        let rects = [free(0, 0, 10, 10)];
        assert!(best_fit(&rects, Rect::new(11, 5), false, FitRule::BestLongSideFit).is_none());
    }
}
