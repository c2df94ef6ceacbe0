use std::time::Instant;

use crate::allocate::{Allocation, SheetAllocator, allocate_roll};
use crate::config::SolverConfig;
use crate::expand::expand;
use crate::refine::refine;
use crate::types::{Bin, Layout, Piece, PieceInstance, Placement, Rect, Stock};

pub struct Solver {
    stock: Stock,
    kerf: u32,
    grain_lock: bool,
    pieces: Vec<Piece>,
    config: SolverConfig,
}

impl Solver {
    pub fn new(stock: Stock, kerf: u32, pieces: Vec<Piece>) -> Self {
        Self {
            stock,
            kerf,
            grain_lock: false,
            pieces,
            config: SolverConfig::default(),
        }
    }

    /// Forbids rotating any piece.
    pub fn with_grain_lock(mut self, grain_lock: bool) -> Self {
        self.grain_lock = grain_lock;
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Never fails: pieces that cannot be placed are reported in the layout.
    pub fn solve(&self) -> Layout {
        let started = Instant::now();
        let expansion = expand(&self.pieces, self.kerf, self.stock, !self.grain_lock);
        let instances = &expansion.instances;
        let all: Vec<usize> = (0..instances.len()).collect();

        let (allocation, bin_size) = match self.stock {
            Stock::Sheet { size } => {
                let first = SheetAllocator::new(instances, &all, size, &self.config).run();
                let allocation = if self.config.refine {
                    refine(instances, &all, size, &first, &self.config).unwrap_or(first)
                } else {
                    first
                };
                (allocation, size)
            }
            Stock::Roll { width } => {
                let (allocation, length) = allocate_roll(instances, &all, width, &self.config);
                (allocation, Rect::new(width, length))
            }
        };

        let layout = Self::to_layout(bin_size, allocation, instances, expansion.impossible);
        tracing::info!(
            bins = layout.bin_count(),
            placed = layout.placed_count(),
            impossible = layout.impossible.len(),
            unplaced = layout.unplaced.len(),
            waste_percent = layout.total_waste_percent(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "layout solved"
        );
        layout
    }

    fn to_layout(
        bin_size: Rect,
        allocation: Allocation,
        instances: &[PieceInstance],
        impossible: Vec<String>,
    ) -> Layout {
        let bins = allocation
            .bins
            .into_iter()
            .enumerate()
            .map(|(i, mut slots)| {
                slots.sort_by_key(|s| (s.y, s.x));
                Bin {
                    index: i + 1,
                    size: bin_size,
                    placements: slots
                        .into_iter()
                        .map(|s| {
                            let inst = &instances[s.index];
                            Placement {
                                id: inst.id.clone(),
                                piece_id: inst.piece_id.clone(),
                                x: s.x,
                                y: s.y,
                                rect: inst.oriented(s.rotated),
                                rotated: s.rotated,
                            }
                        })
                        .collect(),
                }
            })
            .collect();

        Layout {
            bins,
            impossible,
            unplaced: allocation
                .unplaced
                .into_iter()
                .map(|i| instances[i].id.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn piece(id: &str, w: u32, h: u32, qty: u32) -> Piece {
        Piece {
            id: id.to_string(),
            rect: Rect::new(w, h),
            qty,
            grain_locked: false,
        }
    }

    fn sheet(w: u32, h: u32) -> Stock {
        Stock::Sheet { size: Rect::new(w, h) }
    }

    /// Validates a complete layout:
    /// 1. Every placement fits within its bin
    /// 2. No two placements on the same bin overlap
    /// 3. Every instance id is accounted for exactly once
    fn assert_layout_valid(layout: &Layout, expected_pieces: usize) {
        let mut seen = HashSet::new();
        for bin in &layout.bins {
            for (i, a) in bin.placements.iter().enumerate() {
                assert!(
                    a.x + a.rect.w <= bin.size.w && a.y + a.rect.h <= bin.size.h,
                    "bin {}: piece {} ({} @ ({},{})) exceeds {}",
                    bin.index, a.id, a.rect, a.x, a.y, bin.size
                );
                for b in &bin.placements[i + 1..] {
                    let overlaps = a.x < b.x + b.rect.w
                        && b.x < a.x + a.rect.w
                        && a.y < b.y + b.rect.h
                        && b.y < a.y + a.rect.h;
                    assert!(!overlaps, "bin {}: {} overlaps {}", bin.index, a.id, b.id);
                }
                assert!(seen.insert(a.id.clone()), "{} placed twice", a.id);
            }
        }
        for id in layout.impossible.iter().chain(&layout.unplaced) {
            assert!(seen.insert(id.clone()), "{id} reported twice");
        }
        assert_eq!(seen.len(), expected_pieces);
    }

    #[test]
    fn test_single_piece() {
        let layout = Solver::new(sheet(100, 100), 0, vec![piece("a", 50, 50, 1)]).solve();
        assert_layout_valid(&layout, 1);
        assert_eq!(layout.bin_count(), 1);
    }

    #[test]
    fn test_exact_fit_four_pieces() {
        let layout = Solver::new(sheet(100, 100), 0, vec![piece("a", 50, 50, 4)])
            .with_grain_lock(true)
            .solve();
        assert_layout_valid(&layout, 4);
        assert_eq!(layout.bin_count(), 1);
    }

    #[test]
    fn test_one_per_sheet() {
        let layout = Solver::new(sheet(100, 100), 0, vec![piece("a", 60, 60, 4)])
            .with_grain_lock(true)
            .solve();
        assert_layout_valid(&layout, 4);
        assert_eq!(layout.bin_count(), 4);
    }

    #[test]
    fn test_rotation_helps() {
        let layout = Solver::new(sheet(100, 50), 0, vec![piece("a", 50, 100, 1)]).solve();
        assert_layout_valid(&layout, 1);
        assert!(layout.bins[0].placements[0].rotated);
        assert_eq!(layout.bins[0].placements[0].rect, Rect::new(100, 50));
    }

    #[test]
    fn test_no_pieces() {
        let layout = Solver::new(sheet(100, 100), 0, vec![]).solve();
        assert_layout_valid(&layout, 0);
        assert_eq!(layout.bin_count(), 0);
    }

    #[test]
    fn test_kerf_reduces_capacity() {
        let no_kerf = Solver::new(sheet(100, 100), 0, vec![piece("a", 50, 100, 2)])
            .with_grain_lock(true)
            .solve();
        assert_layout_valid(&no_kerf, 2);
        assert_eq!(no_kerf.bin_count(), 1);

        // Padded to 55x105: two still fit side by side in 110x110
        let kerf = Solver::new(sheet(110, 110), 5, vec![piece("a", 50, 100, 2)])
            .with_grain_lock(true)
            .solve();
        assert_layout_valid(&kerf, 2);
        assert_eq!(kerf.bin_count(), 1);

        // 105 exceeds a 100x100 sheet either way
        let tight = Solver::new(sheet(100, 100), 5, vec![piece("a", 50, 100, 2)])
            .with_grain_lock(true)
            .solve();
        assert_eq!(tight.impossible, ["a-1", "a-2"]);
        assert_eq!(tight.bin_count(), 0);
    }

    #[test]
    fn test_kerf_not_reported() {
        let layout = Solver::new(sheet(1000, 1000), 4, vec![piece("a", 300, 200, 5)]).solve();
        assert_layout_valid(&layout, 5);
        for p in layout.bins.iter().flat_map(|b| &b.placements) {
            let expected = if p.rotated { Rect::new(200, 300) } else { Rect::new(300, 200) };
            assert_eq!(p.rect, expected);
        }
    }

    #[test]
    fn test_grain_lock_never_rotates() {
        let pieces = vec![piece("a", 700, 300, 6), piece("b", 200, 450, 5)];
        let layout = Solver::new(sheet(1000, 1000), 0, pieces).with_grain_lock(true).solve();
        assert_layout_valid(&layout, 11);
        assert!(layout.bins.iter().flat_map(|b| &b.placements).all(|p| !p.rotated));
    }

    #[test]
    fn test_complex_mixed_sizes() {
        let stock = Rect::new(2440, 1220);
        let pieces = vec![
            piece("a", 800, 600, 5),
            piece("b", 400, 300, 8),
            piece("c", 600, 400, 4),
            piece("d", 1200, 600, 3),
            piece("e", 300, 200, 6),
            Piece { grain_locked: true, ..piece("f", 500, 500, 4) },
        ];
        let layout = Solver::new(Stock::Sheet { size: stock }, 3, pieces).solve();
        assert_layout_valid(&layout, 30);
        assert!(layout.unplaced.is_empty());
        let min_sheets = layout.used_area().div_ceil(stock.area()) as usize;
        assert!(layout.bin_count() >= min_sheets);
    }

    #[test]
    fn test_refinement_never_adds_sheets() {
        let pieces = vec![
            piece("a", 700, 500, 6),
            piece("b", 350, 250, 5),
            piece("c", 1000, 400, 3),
            piece("d", 600, 300, 7),
        ];
        let stock = sheet(2440, 1220);
        let plain = Solver::new(stock, 0, pieces.clone())
            .with_config(SolverConfig::default().with_refine(false))
            .solve();
        let refined = Solver::new(stock, 0, pieces).solve();
        assert_layout_valid(&refined, 21);
        assert!(refined.bin_count() <= plain.bin_count());
    }

    #[test]
    fn test_roll_layout() {
        let layout = Solver::new(Stock::Roll { width: 1000 }, 0, vec![piece("a", 1000, 300, 3)]).solve();
        assert_layout_valid(&layout, 3);
        assert_eq!(layout.bin_count(), 1);
        assert_eq!(layout.bins[0].size, Rect::new(1000, 900));
    }
}
