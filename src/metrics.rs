//! Manufacturing figures derived from a finished layout.

use serde::Serialize;

use crate::types::Layout;

/// Machine parameters used for the cut estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CuttingParams {
    /// Cut length per unit of time (mm per minute gives minutes).
    pub cutting_speed: f64,
    pub thickness: f64,
    pub depth_per_pass: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub bins_used: usize,
    pub total_pieces: usize,
    pub placed_pieces: usize,
    pub waste_percent: f64,
    pub material_area: u64,
    pub total_cut_length: u64,
    pub passes: u32,
    pub estimated_cut_time: f64,
}

/// Passes needed to get through `thickness`; one when either figure is
/// missing.
pub fn pass_count(thickness: f64, depth_per_pass: f64) -> u32 {
    if thickness > 0.0 && depth_per_pass > 0.0 {
        (thickness / depth_per_pass).ceil() as u32
    } else {
        1
    }
}

pub fn compute(layout: &Layout, params: &CuttingParams) -> Metrics {
    // Every piece is cut along its full perimeter
    let total_cut_length: u64 = layout
        .bins
        .iter()
        .flat_map(|b| &b.placements)
        .map(|p| 2 * (p.rect.w as u64 + p.rect.h as u64))
        .sum();
    let passes = pass_count(params.thickness, params.depth_per_pass);
    let estimated_cut_time = if params.cutting_speed > 0.0 {
        total_cut_length as f64 * passes as f64 / params.cutting_speed
    } else {
        0.0
    };

    Metrics {
        bins_used: layout.bin_count(),
        total_pieces: layout.total_pieces(),
        placed_pieces: layout.placed_count(),
        waste_percent: layout.total_waste_percent(),
        material_area: layout.material_area(),
        total_cut_length,
        passes,
        estimated_cut_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bin, Placement, Rect};

    fn layout() -> Layout {
        let placement = |id: &str, x, y, w, h| Placement {
            id: id.to_string(),
            piece_id: id.to_string(),
            x,
            y,
            rect: Rect::new(w, h),
            rotated: false,
        };
        Layout {
            bins: vec![Bin {
                index: 1,
                size: Rect::new(100, 100),
                placements: vec![placement("a", 0, 0, 50, 100), placement("b", 50, 0, 50, 50)],
            }],
            impossible: vec!["c".to_string()],
            unplaced: vec![],
        }
    }

    #[test]
    fn test_pass_count() {
        assert_eq!(pass_count(18.0, 6.0), 3);
        assert_eq!(pass_count(19.0, 6.0), 4);
        assert_eq!(pass_count(0.0, 6.0), 1);
        assert_eq!(pass_count(18.0, 0.0), 1);
    }

    #[test]
    fn test_compute() {
        let params = CuttingParams {
            cutting_speed: 100.0,
            thickness: 10.0,
            depth_per_pass: 5.0,
        };
        let m = compute(&layout(), &params);
        assert_eq!(m.bins_used, 1);
        assert_eq!(m.total_pieces, 3);
        assert_eq!(m.placed_pieces, 2);
        assert_eq!(m.material_area, 10_000);
        assert!((m.waste_percent - 25.0).abs() < 1e-9);
        assert_eq!(m.total_cut_length, 300 + 200);
        assert_eq!(m.passes, 2);
        assert!((m.estimated_cut_time - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_speed() {
        let m = compute(&layout(), &CuttingParams::default());
        assert_eq!(m.estimated_cut_time, 0.0);
        assert_eq!(m.passes, 1);
    }
}
