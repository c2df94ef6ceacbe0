use crate::fit::{FitRule, FreeRect, FreeSpace, ScoredPlacement, best_fit};
use crate::types::Rect;

/// How the L-shaped remainder around a placed piece is cut in two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitRule {
    /// Cut along the axis with the shorter leftover.
    ShorterLeftoverAxis,
    /// Cut so the smaller remainder is as small as possible.
    MinArea,
}

impl SplitRule {
    pub fn code(self) -> &'static str {
        match self {
            SplitRule::ShorterLeftoverAxis => "slas",
            SplitRule::MinArea => "minas",
        }
    }

    /// True when the bottom remainder should span the full free width.
    fn horizontal(self, free: Rect, placed: Rect) -> bool {
        let left_w = (free.w - placed.w) as u64;
        let left_h = (free.h - placed.h) as u64;
        match self {
            SplitRule::ShorterLeftoverAxis => left_w < left_h,
            SplitRule::MinArea => placed.w as u64 * left_h > left_w * placed.h as u64,
        }
    }
}

/// Disjoint free rectangles, each produced by a full straight cut.
#[derive(Debug, Clone)]
pub struct GuillotineBin {
    rule: FitRule,
    split: SplitRule,
    pub free_rects: Vec<FreeRect>,
}

impl GuillotineBin {
    pub fn new(bin: Rect, rule: FitRule, split: SplitRule) -> Self {
        Self {
            rule,
            split,
            free_rects: vec![FreeRect {
                x: 0,
                y: 0,
                rect: bin,
            }],
        }
    }

    /// Cuts the leftover around `placed` into at most two rectangles. Only
    /// one of them covers the corner diagonal to the piece.
    fn split(&mut self, free: FreeRect, placed: Rect) {
        let (right_h, bottom_w) = if self.split.horizontal(free.rect, placed) {
            (placed.h, free.rect.w)
        } else {
            (free.rect.h, placed.w)
        };
        let right = FreeRect {
            x: free.x + placed.w,
            y: free.y,
            rect: Rect::new(free.rect.w - placed.w, right_h),
        };
        let bottom = FreeRect {
            x: free.x,
            y: free.y + placed.h,
            rect: Rect::new(bottom_w, free.rect.h - placed.h),
        };
        self.free_rects
            .extend([right, bottom].into_iter().filter(|r| r.rect.area() > 0));
    }

    fn merge_free_rects(&mut self) {
        while let Some((i, j, joined)) = self.mergeable_pair() {
            self.free_rects[i] = joined;
            self.free_rects.swap_remove(j);
        }
    }

    fn mergeable_pair(&self) -> Option<(usize, usize, FreeRect)> {
        let rects = &self.free_rects;
        (0..rects.len()).find_map(|i| {
            (i + 1..rects.len()).find_map(|j| join(rects[i], rects[j]).map(|m| (i, j, m)))
        })
    }
}

/// The rectangle covering both `a` and `b` when they share a full edge.
fn join(a: FreeRect, b: FreeRect) -> Option<FreeRect> {
    let (lo, hi) = if (a.y, a.x) <= (b.y, b.x) { (a, b) } else { (b, a) };
    let rect = if lo.y == hi.y && lo.rect.h == hi.rect.h && lo.right() == hi.x {
        Rect::new(lo.rect.w + hi.rect.w, lo.rect.h)
    } else if lo.x == hi.x && lo.rect.w == hi.rect.w && lo.top() == hi.y {
        Rect::new(lo.rect.w, lo.rect.h + hi.rect.h)
    } else {
        return None;
    };
    Some(FreeRect { rect, ..lo })
}

impl FreeSpace for GuillotineBin {
    fn find_best(&self, piece: Rect, allow_rotate: bool) -> Option<ScoredPlacement> {
        best_fit(&self.free_rects, piece, allow_rotate, self.rule)
    }

    fn place(&mut self, scored: ScoredPlacement, piece: Rect) -> (u32, u32, Rect) {
        let free = self.free_rects[scored.free_idx];
        let placed = if scored.rotated {
            piece.rotated()
        } else {
            piece
        };

        self.free_rects.swap_remove(scored.free_idx);
        self.split(free, placed);
        self.merge_free_rects();

        (free.x, free.y, placed)
    }
}
