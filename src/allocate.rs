//! Bin-by-bin allocation for sheets and single-pass allocation for rolls.

use crate::config::SolverConfig;
use crate::tournament::{Objective, Tournament};
use crate::types::{PieceInstance, Rect, Slot};

/// Slots per bin plus the instances left without a place. Indices refer to
/// the instance slice the allocator was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub bins: Vec<Vec<Slot>>,
    pub unplaced: Vec<usize>,
}

impl Allocation {
    pub fn placed_count(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// One more bin was filled with `placed` pieces.
    Filled { placed: usize },
    /// The tournament could not place anything; remaining pieces stay unplaced.
    Stalled,
    /// Nothing left to place.
    Finished,
}

/// Fills one sheet at a time with the tournament winner for whatever is
/// still unplaced.
pub struct SheetAllocator<'a> {
    tournament: Tournament<'a>,
    remaining: Vec<usize>,
    bins: Vec<Vec<Slot>>,
}

impl<'a> SheetAllocator<'a> {
    pub fn new(
        instances: &'a [PieceInstance],
        subset: &[usize],
        sheet: Rect,
        config: &'a SolverConfig,
    ) -> Self {
        Self {
            tournament: Tournament::new(instances, sheet, Objective::FillSheet, config),
            remaining: subset.to_vec(),
            bins: Vec::new(),
        }
    }

    pub fn step(&mut self) -> Step {
        if self.remaining.is_empty() {
            return Step::Finished;
        }
        match self.tournament.run(&self.remaining) {
            Some(winner) if !winner.slots.is_empty() => {
                self.remaining
                    .retain(|i| !winner.slots.iter().any(|s| s.index == *i));
                tracing::debug!(
                    bin = self.bins.len() + 1,
                    trial = %winner.label,
                    placed = winner.slots.len(),
                    remaining = self.remaining.len(),
                    "sheet filled"
                );
                let placed = winner.slots.len();
                self.bins.push(winner.slots);
                Step::Filled { placed }
            }
            _ => Step::Stalled,
        }
    }

    pub fn run(mut self) -> Allocation {
        loop {
            match self.step() {
                Step::Filled { .. } => continue,
                Step::Stalled => {
                    tracing::warn!(unplaced = self.remaining.len(), "no trial placed any piece");
                    break;
                }
                Step::Finished => break,
            }
        }
        Allocation {
            bins: self.bins,
            unplaced: self.remaining,
        }
    }
}

/// A height no layout of `subset` on a roll can exceed: every piece stacked
/// in its taller orientation.
pub fn roll_length_bound(instances: &[PieceInstance], subset: &[usize]) -> u32 {
    subset
        .iter()
        .map(|&i| instances[i].padded.long_side() as u64)
        .sum::<u64>()
        .min(u32::MAX as u64) as u32
}

/// One tournament over everything against a roll of unbounded length.
/// Pieces it does not place stay unplaced. Returns the allocation and the
/// consumed length.
pub fn allocate_roll(
    instances: &[PieceInstance],
    subset: &[usize],
    width: u32,
    config: &SolverConfig,
) -> (Allocation, u32) {
    let bin = Rect::new(width, roll_length_bound(instances, subset));
    let tournament = Tournament::new(instances, bin, Objective::MinLength, config);

    let Some(winner) = tournament.run(subset).filter(|w| !w.slots.is_empty()) else {
        return (
            Allocation {
                bins: vec![],
                unplaced: subset.to_vec(),
            },
            0,
        );
    };

    let unplaced: Vec<usize> = subset
        .iter()
        .copied()
        .filter(|i| !winner.slots.iter().any(|s| s.index == *i))
        .collect();
    tracing::debug!(
        trial = %winner.label,
        length = winner.length,
        placed = winner.slots.len(),
        unplaced = unplaced.len(),
        "roll allocated"
    );
    (
        Allocation {
            bins: vec![winner.slots],
            unplaced,
        },
        winner.length,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(id: &str, w: u32, h: u32, allow_rotate: bool) -> PieceInstance {
        PieceInstance {
            id: id.to_string(),
            piece_id: id.to_string(),
            rect: Rect::new(w, h),
            padded: Rect::new(w, h),
            allow_rotate,
        }
    }

    #[test]
    fn test_sheet_steps_until_finished() {
        let pieces: Vec<_> = (0..3).map(|i| inst(&i.to_string(), 60, 60, false)).collect();
        let subset: Vec<usize> = (0..3).collect();
        let config = SolverConfig::default();
        let mut alloc = SheetAllocator::new(&pieces, &subset, Rect::new(100, 100), &config);
        for _ in 0..3 {
            assert_eq!(alloc.step(), Step::Filled { placed: 1 });
        }
        assert_eq!(alloc.step(), Step::Finished);
    }

    #[test]
    fn test_sheet_stalls_on_unplaceable() {
        // Not filtered up front, so the allocator must stop instead of looping
        let pieces = [inst("a", 50, 50, false), inst("huge", 500, 500, false)];
        let config = SolverConfig::default();
        let alloc = SheetAllocator::new(&pieces, &[0, 1], Rect::new(100, 100), &config).run();
        assert_eq!(alloc.bins.len(), 1);
        assert_eq!(alloc.unplaced, [1]);
    }

    #[test]
    fn test_roll_stacks_rows() {
        let pieces: Vec<_> = (0..3).map(|i| inst(&i.to_string(), 1000, 300, true)).collect();
        let config = SolverConfig::default();
        let (alloc, length) = allocate_roll(&pieces, &[0, 1, 2], 1000, &config);
        assert_eq!(alloc.bins.len(), 1);
        assert_eq!(alloc.placed_count(), 3);
        assert_eq!(length, 900);
    }

    #[test]
    fn test_roll_packs_side_by_side() {
        let pieces: Vec<_> = (0..4).map(|i| inst(&i.to_string(), 500, 200, true)).collect();
        let config = SolverConfig::default();
        let (_, length) = allocate_roll(&pieces, &[0, 1, 2, 3], 1000, &config);
        assert_eq!(length, 400);
    }

    #[test]
    fn test_roll_nothing_to_place() {
        let config = SolverConfig::default();
        let (alloc, length) = allocate_roll(&[], &[], 1000, &config);
        assert!(alloc.bins.is_empty());
        assert_eq!(length, 0);
    }
}
