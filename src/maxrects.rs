use crate::fit::{FitRule, FreeRect, FreeSpace, ScoredPlacement, best_fit};
use crate::types::Rect;

/// Maximal free rectangles. Free rectangles may overlap each other; after
/// every placement each one hit by the piece is cut into the up to four
/// maximal pieces around it, and rectangles contained in another are dropped.
#[derive(Debug, Clone)]
pub struct MaxRectsBin {
    rule: FitRule,
    pub free_rects: Vec<FreeRect>,
}

impl MaxRectsBin {
    pub fn new(bin: Rect, rule: FitRule) -> Self {
        Self {
            rule,
            free_rects: vec![FreeRect {
                x: 0,
                y: 0,
                rect: bin,
            }],
        }
    }

    fn split_around(&mut self, used: FreeRect) {
        let mut next = Vec::with_capacity(self.free_rects.len() + 4);
        for free in self.free_rects.drain(..) {
            let disjoint = used.x >= free.right()
                || used.right() <= free.x
                || used.y >= free.top()
                || used.top() <= free.y;
            if disjoint {
                next.push(free);
                continue;
            }
            if used.x > free.x {
                next.push(FreeRect {
                    x: free.x,
                    y: free.y,
                    rect: Rect::new(used.x - free.x, free.rect.h),
                });
            }
            if used.right() < free.right() {
                next.push(FreeRect {
                    x: used.right(),
                    y: free.y,
                    rect: Rect::new(free.right() - used.right(), free.rect.h),
                });
            }
            if used.y > free.y {
                next.push(FreeRect {
                    x: free.x,
                    y: free.y,
                    rect: Rect::new(free.rect.w, used.y - free.y),
                });
            }
            if used.top() < free.top() {
                next.push(FreeRect {
                    x: free.x,
                    y: used.top(),
                    rect: Rect::new(free.rect.w, free.top() - used.top()),
                });
            }
        }
        self.free_rects = next;
    }

    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free_rects.len() {
            let mut removed_i = false;
            let mut j = i + 1;
            while j < self.free_rects.len() {
                if self.free_rects[j].contains(&self.free_rects[i]) {
                    self.free_rects.swap_remove(i);
                    removed_i = true;
                    break;
                }
                if self.free_rects[i].contains(&self.free_rects[j]) {
                    self.free_rects.swap_remove(j);
                } else {
                    j += 1;
                }
            }
            if !removed_i {
                i += 1;
            }
        }
    }
}

impl FreeSpace for MaxRectsBin {
    fn find_best(&self, piece: Rect, allow_rotate: bool) -> Option<ScoredPlacement> {
        best_fit(&self.free_rects, piece, allow_rotate, self.rule)
    }

    fn place(&mut self, scored: ScoredPlacement, piece: Rect) -> (u32, u32, Rect) {
        let placed = if scored.rotated {
            piece.rotated()
        } else {
            piece
        };
        let used = FreeRect {
            x: scored.x,
            y: scored.y,
            rect: placed,
        };
        self.split_around(used);
        self.prune();
        (scored.x, scored.y, placed)
    }
}
