//! Bounded exact model for a single bin.
//!
//! Placement is searched depth-first over normal-pattern coordinates: every
//! feasible packing can be pushed left and down until each origin coordinate
//! is a sum of other pieces' extents, so restricting origins to those sums
//! loses no solution. Each piece branches over its permitted orientations
//! and every non-overlapping position inside the bin, plus a "not placed"
//! branch when maximizing placed area. The search honours a wall-clock
//! deadline and returns the best assignment seen when it expires.

use std::time::{Duration, Instant};

use crate::error::LayoutError;
use crate::types::{PieceInstance, Rect, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactObjective {
    /// Maximize total placed piece area; pieces may be left out.
    MaxPlacedArea,
    /// Place every piece and minimize the highest occupied edge.
    MinHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactStatus {
    /// Search space exhausted before the deadline.
    Optimal,
    /// Deadline reached with a feasible assignment in hand.
    Feasible,
    /// Deadline reached before any assignment was found.
    Timeout,
}

impl std::fmt::Display for ExactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Feasible => write!(f, "feasible"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExactOutcome {
    pub slots: Vec<Slot>,
    pub status: ExactStatus,
    pub nodes: u64,
}

#[derive(Debug)]
struct Item {
    index: usize,
    orientations: Vec<(Rect, bool)>,
    area: u64,
    /// Previous item with identical size and rotation freedom.
    twin_of: Option<usize>,
}

pub struct ExactModel {
    items: Vec<Item>,
    bin: Rect,
    objective: ExactObjective,
    xs: Vec<u32>,
    ys: Vec<u32>,
    /// `suffix_area[d]` is the area of items `d..`.
    suffix_area: Vec<u64>,
    height_floor: u32,
    deadline: Instant,
    nodes: u64,
    timed_out: bool,
    proven: bool,
    best: Option<(Vec<Slot>, u64, u32)>,
}

impl ExactModel {
    pub fn new(
        instances: &[PieceInstance],
        subset: &[usize],
        bin: Rect,
        objective: ExactObjective,
        max_items: usize,
        time_limit: Duration,
    ) -> Result<Self, LayoutError> {
        if subset.len() > max_items {
            return Err(LayoutError::TooManyItems {
                count: subset.len(),
                limit: max_items,
            });
        }

        let mut order = subset.to_vec();
        order.sort_by_key(|&i| {
            let p = instances[i].padded;
            std::cmp::Reverse((p.area(), p.long_side(), p.short_side()))
        });

        let mut items: Vec<Item> = Vec::with_capacity(order.len());
        for &index in &order {
            let inst = &instances[index];
            let mut orientations = vec![(inst.padded, false)];
            if inst.can_rotate() {
                orientations.push((inst.padded.rotated(), true));
            }
            orientations.retain(|(r, _)| r.fits_in(&bin));
            let twin_of = items.len().checked_sub(1).filter(|&prev| {
                let p = &instances[items[prev].index];
                p.padded == inst.padded && p.can_rotate() == inst.can_rotate()
            });
            items.push(Item {
                index,
                orientations,
                area: inst.rect.area(),
                twin_of,
            });
        }

        let xs = normal_pattern(&items, bin.w, |r| r.w);
        let ys = normal_pattern(&items, bin.h, |r| r.h);

        let mut suffix_area = vec![0u64; items.len() + 1];
        for d in (0..items.len()).rev() {
            suffix_area[d] = suffix_area[d + 1] + items[d].area;
        }

        // Area spread over the bin width, or the shortest orientation of the tallest piece
        let padded_area: u64 = items
            .iter()
            .filter_map(|it| it.orientations.first().map(|(r, _)| r.area()))
            .sum();
        let area_floor = if bin.w == 0 {
            0
        } else {
            padded_area.div_ceil(bin.w as u64).min(u32::MAX as u64) as u32
        };
        let piece_floor = items
            .iter()
            .filter_map(|it| it.orientations.iter().map(|(r, _)| r.h).min())
            .max()
            .unwrap_or(0);

        Ok(Self {
            items,
            bin,
            objective,
            xs,
            ys,
            suffix_area,
            height_floor: area_floor.max(piece_floor),
            deadline: Instant::now() + time_limit,
            nodes: 0,
            timed_out: false,
            proven: false,
            best: None,
        })
    }

    pub fn solve(mut self) -> ExactOutcome {
        let mut placed: Vec<Slot> = Vec::with_capacity(self.items.len());
        let mut positions: Vec<Option<(u32, u32)>> = vec![None; self.items.len()];
        self.search(0, &mut placed, &mut positions, 0, 0);

        let status = if !self.timed_out {
            ExactStatus::Optimal
        } else if self.best.is_some() {
            ExactStatus::Feasible
        } else {
            ExactStatus::Timeout
        };
        ExactOutcome {
            slots: self.best.map(|(slots, _, _)| slots).unwrap_or_default(),
            status,
            nodes: self.nodes,
        }
    }

    fn best_height(&self) -> Option<u32> {
        self.best.as_ref().map(|b| b.2)
    }

    fn should_stop(&mut self) -> bool {
        if self.proven || self.timed_out {
            return true;
        }
        if Instant::now() >= self.deadline {
            self.timed_out = true;
            return true;
        }
        false
    }

    fn search(
        &mut self,
        depth: usize,
        placed: &mut Vec<Slot>,
        positions: &mut [Option<(u32, u32)>],
        area: u64,
        height: u32,
    ) {
        self.nodes += 1;
        if self.should_stop() {
            return;
        }

        match self.objective {
            ExactObjective::MaxPlacedArea => {
                let best_area = self.best.as_ref().map_or(0, |b| b.1);
                if area + self.suffix_area[depth] <= best_area && self.best.is_some() {
                    return;
                }
            }
            ExactObjective::MinHeight => {
                if let Some(best_height) = self.best_height()
                    && height.max(self.height_floor) >= best_height
                {
                    return;
                }
            }
        }

        if depth == self.items.len() {
            self.record(placed, area, height);
            return;
        }

        let (index, item_area, twin_of) = {
            let item = &self.items[depth];
            (item.index, item.area, item.twin_of)
        };
        // Twins are interchangeable: keep their positions in increasing order
        let after = match twin_of {
            Some(prev) => match positions[prev] {
                Some(pos) => Some(pos),
                None if self.objective == ExactObjective::MaxPlacedArea => {
                    self.search(depth + 1, placed, positions, area, height);
                    return;
                }
                None => None,
            },
            None => None,
        };

        for oi in 0..self.items[depth].orientations.len() {
            let (rect, rotated) = self.items[depth].orientations[oi];
            for yi in 0..self.ys.len() {
                let y = self.ys[yi];
                if y as u64 + rect.h as u64 > self.bin.h as u64 {
                    break;
                }
                if let Some(best_height) = self.best_height()
                    && self.objective == ExactObjective::MinHeight
                    && y + rect.h >= best_height
                {
                    break;
                }
                for xi in 0..self.xs.len() {
                    let x = self.xs[xi];
                    if x as u64 + rect.w as u64 > self.bin.w as u64 {
                        break;
                    }
                    if after.is_some_and(|(py, px)| (y, x) <= (py, px)) {
                        continue;
                    }
                    let slot = Slot {
                        index,
                        x,
                        y,
                        rect,
                        rotated,
                    };
                    if placed.iter().any(|p| p.overlaps(&slot)) {
                        continue;
                    }

                    placed.push(slot);
                    positions[depth] = Some((y, x));
                    self.search(
                        depth + 1,
                        placed,
                        positions,
                        area + item_area,
                        height.max(slot.top()),
                    );
                    positions[depth] = None;
                    placed.pop();

                    if self.should_stop() {
                        return;
                    }
                }
            }
        }

        if self.objective == ExactObjective::MaxPlacedArea {
            self.search(depth + 1, placed, positions, area, height);
        }
    }

    fn record(&mut self, placed: &[Slot], area: u64, height: u32) {
        let improves = match (&self.best, self.objective) {
            (None, ExactObjective::MaxPlacedArea) => true,
            (None, ExactObjective::MinHeight) => placed.len() == self.items.len(),
            (Some(b), ExactObjective::MaxPlacedArea) => area > b.1,
            (Some(b), ExactObjective::MinHeight) => height < b.2,
        };
        if !improves {
            return;
        }
        self.best = Some((placed.to_vec(), area, height));

        self.proven = match self.objective {
            ExactObjective::MaxPlacedArea => {
                area == self.suffix_area[0] || area >= self.bin.area()
            }
            ExactObjective::MinHeight => height <= self.height_floor,
        };
    }
}

/// All sums of piece extents along one axis that stay below `limit`,
/// sorted ascending and starting at 0.
fn normal_pattern(items: &[Item], limit: u32, extent: impl Fn(Rect) -> u32) -> Vec<u32> {
    let mut sums = vec![0u32];
    for item in items {
        let mut extents: Vec<u32> = item.orientations.iter().map(|(r, _)| extent(*r)).collect();
        extents.dedup();
        let mut next = sums.clone();
        for &s in &sums {
            for &e in &extents {
                if let Some(v) = s.checked_add(e)
                    && v < limit
                {
                    next.push(v);
                }
            }
        }
        next.sort_unstable();
        next.dedup();
        sums = next;
    }
    sums
}
