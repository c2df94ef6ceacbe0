//! Runs every ordering × placement combination (and optionally the exact
//! model) against one bin and keeps the best result.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::config::SolverConfig;
use crate::error::LayoutError;
use crate::exact::{ExactModel, ExactObjective};
use crate::policy::Combination;
use crate::types::{PieceInstance, Rect, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Maximize placed area in a fixed sheet, then placed count.
    FillSheet,
    /// Minimize consumed length of an unbounded roll among the candidates
    /// that place the most pieces.
    MinLength,
}

impl Objective {
    /// `Greater` when `a` beats `b`. Remaining ties go to the earlier trial,
    /// so the winner does not depend on evaluation order.
    pub fn compare(self, a: &Candidate, b: &Candidate) -> Ordering {
        let primary = match self {
            Objective::FillSheet => (a.used_area, a.slots.len()).cmp(&(b.used_area, b.slots.len())),
            Objective::MinLength => a
                .slots
                .len()
                .cmp(&b.slots.len())
                .then(b.length.cmp(&a.length)),
        };
        primary.then(b.rank.cmp(&a.rank))
    }

    pub fn pick(self, a: Candidate, b: Candidate) -> Candidate {
        if self.compare(&b, &a) == Ordering::Greater {
            b
        } else {
            a
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trial {
    Heuristic(Combination),
    Exact,
}

/// Outcome of one trial. Only lives until the tournament picks a winner.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub label: String,
    pub rank: usize,
    pub slots: Vec<Slot>,
    /// Unpadded piece area placed.
    pub used_area: u64,
    /// Highest unpadded piece edge.
    pub length: u32,
}

impl Candidate {
    pub fn new(label: String, rank: usize, slots: Vec<Slot>, instances: &[PieceInstance]) -> Self {
        let used_area = slots.iter().map(|s| instances[s.index].rect.area()).sum();
        let length = slots
            .iter()
            .map(|s| s.y + instances[s.index].oriented(s.rotated).h)
            .max()
            .unwrap_or(0);
        Self {
            label,
            rank,
            slots,
            used_area,
            length,
        }
    }
}

pub struct Tournament<'a> {
    instances: &'a [PieceInstance],
    bin: Rect,
    objective: Objective,
    config: &'a SolverConfig,
}

impl<'a> Tournament<'a> {
    pub fn new(
        instances: &'a [PieceInstance],
        bin: Rect,
        objective: Objective,
        config: &'a SolverConfig,
    ) -> Self {
        Self {
            instances,
            bin,
            objective,
            config,
        }
    }

    fn trials(&self, subset: &[usize]) -> Vec<Trial> {
        let mut trials: Vec<Trial> = Combination::all().map(Trial::Heuristic).collect();
        if self.config.exact {
            if subset.len() <= self.config.exact_max_items {
                trials.push(Trial::Exact);
            } else {
                tracing::debug!(
                    pieces = subset.len(),
                    limit = self.config.exact_max_items,
                    "exact model skipped"
                );
            }
        }
        trials
    }

    /// Best candidate for `subset` (indices into the instance slice), or
    /// `None` when the subset is empty or every trial failed.
    pub fn run(&self, subset: &[usize]) -> Option<Candidate> {
        if subset.is_empty() {
            return None;
        }
        let trials = self.trials(subset);
        let evaluate = |(rank, trial): (usize, &Trial)| match self.evaluate(*trial, rank, subset) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                tracing::warn!(error = %e, "trial skipped");
                None
            }
        };

        let best = if self.config.parallel {
            trials
                .par_iter()
                .enumerate()
                .filter_map(evaluate)
                .reduce_with(|a, b| self.objective.pick(a, b))
        } else {
            trials
                .iter()
                .enumerate()
                .filter_map(evaluate)
                .reduce(|a, b| self.objective.pick(a, b))
        };

        if let Some(winner) = &best {
            tracing::debug!(
                trial = %winner.label,
                pieces = winner.slots.len(),
                of = subset.len(),
                used_area = winner.used_area,
                length = winner.length,
                "tournament winner"
            );
        }
        best
    }

    fn evaluate(&self, trial: Trial, rank: usize, subset: &[usize]) -> Result<Candidate, LayoutError> {
        let (label, slots) = match trial {
            Trial::Heuristic(combo) => (combo.to_string(), combo.pack(self.instances, subset, self.bin)),
            Trial::Exact => {
                let objective = match self.objective {
                    Objective::FillSheet => ExactObjective::MaxPlacedArea,
                    Objective::MinLength => ExactObjective::MinHeight,
                };
                let outcome = ExactModel::new(
                    self.instances,
                    subset,
                    self.bin,
                    objective,
                    self.config.exact_max_items,
                    self.config.exact_time_limit,
                )?
                .solve();
                tracing::debug!(
                    status = %outcome.status,
                    nodes = outcome.nodes,
                    placed = outcome.slots.len(),
                    "exact model finished"
                );
                (format!("exact({})", outcome.status), outcome.slots)
            }
        };
        validate(&label, &slots, self.bin, self.instances)?;
        Ok(Candidate::new(label, rank, slots, self.instances))
    }
}

/// Checks containment and pairwise no-overlap of one bin's slots.
pub fn validate(
    trial: &str,
    slots: &[Slot],
    bin: Rect,
    instances: &[PieceInstance],
) -> Result<(), LayoutError> {
    for (i, a) in slots.iter().enumerate() {
        if a.x as u64 + a.rect.w as u64 > bin.w as u64 || a.y as u64 + a.rect.h as u64 > bin.h as u64 {
            return Err(LayoutError::OutOfBounds {
                trial: trial.to_string(),
                id: instances[a.index].id.clone(),
                x: a.x,
                y: a.y,
                bin_w: bin.w,
                bin_h: bin.h,
            });
        }
        if let Some(b) = slots[i + 1..].iter().find(|b| a.overlaps(b)) {
            return Err(LayoutError::Overlap {
                trial: trial.to_string(),
                a: instances[a.index].id.clone(),
                b: instances[b.index].id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn inst(id: &str, w: u32, h: u32, allow_rotate: bool) -> PieceInstance {
        PieceInstance {
            id: id.to_string(),
            piece_id: id.to_string(),
            rect: Rect::new(w, h),
            padded: Rect::new(w, h),
            allow_rotate,
        }
    }

    fn candidate(rank: usize, slots: usize, used_area: u64, length: u32) -> Candidate {
        let slot = Slot { index: 0, x: 0, y: 0, rect: Rect::new(1, 1), rotated: false };
        Candidate {
            label: format!("t{rank}"),
            rank,
            slots: vec![slot; slots],
            used_area,
            length,
        }
    }

    #[test]
    fn test_sheet_prefers_fill_then_count() {
        let obj = Objective::FillSheet;
        assert_eq!(obj.pick(candidate(0, 5, 100, 0), candidate(1, 2, 120, 0)).rank, 1);
        assert_eq!(obj.pick(candidate(0, 2, 100, 0), candidate(1, 3, 100, 0)).rank, 1);
        assert_eq!(obj.pick(candidate(1, 3, 100, 0), candidate(0, 3, 100, 0)).rank, 0);
    }

    #[test]
    fn test_roll_prefers_short_length() {
        let obj = Objective::MinLength;
        assert_eq!(obj.pick(candidate(0, 3, 0, 900), candidate(1, 3, 0, 600)).rank, 1);
        // An empty candidate never wins on length alone
        assert_eq!(obj.pick(candidate(0, 3, 0, 900), candidate(1, 0, 0, 0)).rank, 0);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let pieces: Vec<_> = [(400, 300), (250, 250), (600, 120), (300, 300), (150, 500), (220, 180)]
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| inst(&i.to_string(), w, h, true))
            .collect();
        let subset: Vec<usize> = (0..pieces.len()).collect();
        let bin = Rect::new(1000, 700);
        let par = SolverConfig::default();
        let seq = SolverConfig::default().with_parallel(false);
        let a = Tournament::new(&pieces, bin, Objective::FillSheet, &par).run(&subset).unwrap();
        let b = Tournament::new(&pieces, bin, Objective::FillSheet, &seq).run(&subset).unwrap();
        assert_eq!(a.label, b.label);
        assert_eq!(a.slots, b.slots);
    }

    #[test]
    fn test_exact_joins_when_small() {
        let pieces: Vec<_> = (0..4).map(|i| inst(&i.to_string(), 60, 40, true)).collect();
        let subset: Vec<usize> = (0..4).collect();
        let config = SolverConfig::default()
            .with_exact(true)
            .with_exact_time_limit(Duration::from_secs(5));
        let best = Tournament::new(&pieces, Rect::new(100, 100), Objective::FillSheet, &config)
            .run(&subset)
            .unwrap();
        assert_eq!(best.slots.len(), 4);
    }

    #[test]
    fn test_exact_trial_on_roll_minimizes_length() {
        let pieces = [
            inst("a", 500, 300, true),
            inst("b", 500, 300, true),
            inst("c", 300, 200, true),
            inst("d", 700, 200, true),
        ];
        let subset = [0, 1, 2, 3];
        let config = SolverConfig::default()
            .with_exact(true)
            .with_exact_time_limit(Duration::from_secs(5));
        let roll = Rect::new(1000, 1500);
        let t = Tournament::new(&pieces, roll, Objective::MinLength, &config);
        assert!(t.trials(&subset).contains(&Trial::Exact));

        let exact = t.evaluate(Trial::Exact, 35, &subset).unwrap();
        assert_eq!(exact.label, "exact(optimal)");
        assert_eq!(exact.slots.len(), 4);
        assert_eq!(exact.length, 500);

        let best = t.run(&subset).unwrap();
        assert_eq!(best.length, 500);
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let pieces = [inst("a", 10, 10, false), inst("b", 10, 10, false)];
        let slots = [
            Slot { index: 0, x: 0, y: 0, rect: Rect::new(10, 10), rotated: false },
            Slot { index: 1, x: 5, y: 5, rect: Rect::new(10, 10), rotated: false },
        ];
        let err = validate("t", &slots, Rect::new(100, 100), &pieces).unwrap_err();
        assert!(matches!(err, LayoutError::Overlap { .. }));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let pieces = [inst("a", 10, 10, false)];
        let slots = [Slot { index: 0, x: 95, y: 0, rect: Rect::new(10, 10), rotated: false }];
        let err = validate("t", &slots, Rect::new(100, 100), &pieces).unwrap_err();
        assert!(matches!(err, LayoutError::OutOfBounds { .. }));
    }

    #[test]
    fn test_empty_subset() {
        let config = SolverConfig::default();
        let t = Tournament::new(&[], Rect::new(10, 10), Objective::FillSheet, &config);
        assert!(t.run(&[]).is_none());
    }
}
