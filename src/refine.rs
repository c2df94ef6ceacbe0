//! Tries to save one sheet by re-packing everything into one bin fewer.

use rayon::prelude::*;

use crate::allocate::Allocation;
use crate::config::SolverConfig;
use crate::error::LayoutError;
use crate::policy::Combination;
use crate::tournament::validate;
use crate::types::{PieceInstance, Rect, Slot};

struct Refined {
    rank: usize,
    label: String,
    bins: Vec<Vec<Slot>>,
    last_waste: u64,
}

/// Re-packs `subset` with every combination into at most one sheet fewer
/// than `current` uses. A combination counts only if it places everything;
/// among those the one wasting least area in its last sheet wins.
pub fn refine(
    instances: &[PieceInstance],
    subset: &[usize],
    sheet: Rect,
    current: &Allocation,
    config: &SolverConfig,
) -> Option<Allocation> {
    let target = current.bins.len().checked_sub(1).filter(|&t| t > 0)?;

    let padded_area: u64 = subset.iter().map(|&i| instances[i].padded.area()).sum();
    if padded_area > sheet.area() * target as u64 {
        tracing::debug!(target, "refinement skipped: pieces exceed the area of fewer sheets");
        return None;
    }

    let combos: Vec<Combination> = Combination::all().collect();
    let attempt = |(rank, combo): (usize, &Combination)| {
        match pack_into(instances, subset, sheet, target, *combo) {
            Ok(Some(bins)) => {
                let last = bins.last().map_or(0, |slots| {
                    slots.iter().map(|s| instances[s.index].rect.area()).sum::<u64>()
                });
                Some(Refined {
                    rank,
                    label: combo.to_string(),
                    bins,
                    last_waste: sheet.area() - last,
                })
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "refinement trial skipped");
                None
            }
        }
    };
    let better = |a: Refined, b: Refined| {
        if (b.last_waste, b.rank) < (a.last_waste, a.rank) {
            b
        } else {
            a
        }
    };

    let best = if config.parallel {
        combos
            .par_iter()
            .enumerate()
            .filter_map(attempt)
            .reduce_with(better)
    } else {
        combos.iter().enumerate().filter_map(attempt).reduce(better)
    };

    match best {
        Some(refined) => {
            tracing::info!(
                from = current.bins.len(),
                to = refined.bins.len(),
                trial = %refined.label,
                "refinement saved a sheet"
            );
            Some(Allocation {
                bins: refined.bins,
                unplaced: vec![],
            })
        }
        None => {
            tracing::debug!(bins = current.bins.len(), "refinement found no smaller layout");
            None
        }
    }
}

/// Fills up to `max_bins` sheets in turn with one combination. `None` when
/// something is left over.
fn pack_into(
    instances: &[PieceInstance],
    subset: &[usize],
    sheet: Rect,
    max_bins: usize,
    combo: Combination,
) -> Result<Option<Vec<Vec<Slot>>>, LayoutError> {
    let mut remaining = combo.order.apply(instances, subset);
    let mut bins = Vec::with_capacity(max_bins);
    let label = combo.to_string();

    while !remaining.is_empty() && bins.len() < max_bins {
        let slots = combo.policy.pack(instances, &remaining, sheet);
        if slots.is_empty() {
            break;
        }
        validate(&label, &slots, sheet, instances)?;
        remaining.retain(|i| !slots.iter().any(|s| s.index == *i));
        bins.push(slots);
    }

    Ok(remaining.is_empty().then_some(bins))
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

    fn slot(index: usize) -> Slot {
        Slot { index, x: 0, y: 0, rect: Rect::new(50, 50), rotated: false }
    }

    #[test]
    fn test_merges_wasteful_split() {
        // Four 50x50 squares fit one 100x100 sheet; start from a two-sheet layout
        let pieces: Vec<_> = (0..4).map(|i| inst(&i.to_string(), 50, 50, false)).collect();
        let current = Allocation {
            bins: vec![vec![slot(0), slot(1), slot(2)], vec![slot(3)]],
            unplaced: vec![],
        };
        let config = SolverConfig::default();
        let refined = refine(&pieces, &[0, 1, 2, 3], Rect::new(100, 100), &current, &config).unwrap();
        assert_eq!(refined.bins.len(), 1);
        assert_eq!(refined.placed_count(), 4);
    }

    #[test]
    fn test_keeps_tight_layout() {
        let pieces: Vec<_> = (0..2).map(|i| inst(&i.to_string(), 60, 60, false)).collect();
        let current = Allocation {
            bins: vec![vec![slot(0)], vec![slot(1)]],
            unplaced: vec![],
        };
        let config = SolverConfig::default();
        assert!(refine(&pieces, &[0, 1], Rect::new(100, 100), &current, &config).is_none());
    }

    #[test]
    fn test_single_sheet_not_refined() {
        let pieces = [inst("a", 10, 10, false)];
        let current = Allocation {
            bins: vec![vec![slot(0)]],
            unplaced: vec![],
        };
        let config = SolverConfig::default();
        assert!(refine(&pieces, &[0], Rect::new(100, 100), &current, &config).is_none());
    }

    #[test]
    fn test_pack_into_reports_leftovers() {
        let pieces: Vec<_> = (0..3).map(|i| inst(&i.to_string(), 60, 60, false)).collect();
        let combo = Combination::all().next().unwrap();
        let packed = pack_into(&pieces, &[0, 1, 2], Rect::new(100, 100), 2, combo).unwrap();
        assert!(packed.is_none());
        let packed = pack_into(&pieces, &[0, 1, 2], Rect::new(100, 100), 3, combo).unwrap();
        assert_eq!(packed.map(|b| b.len()), Some(3));
    }
}
