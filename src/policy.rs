//! Registry of piece orderings and placement policies.
//!
//! Every strategy is a plain tagged value; the tournament enumerates the
//! registries and invokes them all the same way.

use std::cmp::Reverse;

use crate::fit::{FitRule, FreeSpace};
use crate::guillotine::{GuillotineBin, SplitRule};
use crate::maxrects::MaxRectsBin;
use crate::types::{PieceInstance, Rect, Slot};

/// Order in which a trial offers pieces to the bin. All sorts are
/// descending and stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Area,
    ShortSide,
    LongSide,
    Perimeter,
    Unordered,
}

impl SortOrder {
    pub const ALL: [SortOrder; 5] = [
        SortOrder::Area,
        SortOrder::ShortSide,
        SortOrder::LongSide,
        SortOrder::Perimeter,
        SortOrder::Unordered,
    ];

    pub fn code(self) -> &'static str {
        match self {
            SortOrder::Area => "area",
            SortOrder::ShortSide => "short",
            SortOrder::LongSide => "long",
            SortOrder::Perimeter => "perimeter",
            SortOrder::Unordered => "none",
        }
    }

    fn key(self, r: Rect) -> (u64, u64) {
        match self {
            SortOrder::Area => (r.area(), r.long_side() as u64),
            SortOrder::ShortSide => (r.short_side() as u64, r.long_side() as u64),
            SortOrder::LongSide => (r.long_side() as u64, r.short_side() as u64),
            SortOrder::Perimeter => (r.w as u64 + r.h as u64, r.area()),
            SortOrder::Unordered => (0, 0),
        }
    }

    /// Reorders `subset` (indices into `instances`).
    pub fn apply(self, instances: &[PieceInstance], subset: &[usize]) -> Vec<usize> {
        let mut order = subset.to_vec();
        if self != SortOrder::Unordered {
            order.sort_by_key(|&i| Reverse(self.key(instances[i].padded)));
        }
        order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementPolicy {
    MaxRects(FitRule),
    Guillotine(FitRule, SplitRule),
}

impl PlacementPolicy {
    pub const ALL: [PlacementPolicy; 7] = [
        PlacementPolicy::MaxRects(FitRule::BestShortSideFit),
        PlacementPolicy::MaxRects(FitRule::BestLongSideFit),
        PlacementPolicy::MaxRects(FitRule::BestAreaFit),
        PlacementPolicy::Guillotine(FitRule::BestShortSideFit, SplitRule::ShorterLeftoverAxis),
        PlacementPolicy::Guillotine(FitRule::BestShortSideFit, SplitRule::MinArea),
        PlacementPolicy::Guillotine(FitRule::BestAreaFit, SplitRule::ShorterLeftoverAxis),
        PlacementPolicy::Guillotine(FitRule::BestAreaFit, SplitRule::MinArea),
    ];

    /// Places as many of `order` as fit into one empty `bin`, in order.
    /// Pieces that find no room are skipped.
    pub fn pack(self, instances: &[PieceInstance], order: &[usize], bin: Rect) -> Vec<Slot> {
        match self {
            PlacementPolicy::MaxRects(rule) => fill(MaxRectsBin::new(bin, rule), instances, order),
            PlacementPolicy::Guillotine(rule, split) => {
                fill(GuillotineBin::new(bin, rule, split), instances, order)
            }
        }
    }
}

impl std::fmt::Display for PlacementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementPolicy::MaxRects(rule) => write!(f, "maxrects-{}", rule.code()),
            PlacementPolicy::Guillotine(rule, split) => {
                write!(f, "guillotine-{}-{}", rule.code(), split.code())
            }
        }
    }
}

fn fill(mut space: impl FreeSpace, instances: &[PieceInstance], order: &[usize]) -> Vec<Slot> {
    order
        .iter()
        .filter_map(|&i| {
            let inst = &instances[i];
            space.insert(i, inst.padded, inst.can_rotate())
        })
        .collect()
}

/// One ordering × placement combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combination {
    pub order: SortOrder,
    pub policy: PlacementPolicy,
}

impl Combination {
    /// Full cross product, orderings outermost.
    pub fn all() -> impl Iterator<Item = Combination> {
        SortOrder::ALL.into_iter().flat_map(|order| {
            PlacementPolicy::ALL
                .into_iter()
                .map(move |policy| Combination { order, policy })
        })
    }

    pub fn pack(self, instances: &[PieceInstance], subset: &[usize], bin: Rect) -> Vec<Slot> {
        let order = self.order.apply(instances, subset);
        self.policy.pack(instances, &order, bin)
    }
}

impl std::fmt::Display for Combination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.order.code(), self.policy)
    }
}
