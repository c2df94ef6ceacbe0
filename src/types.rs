use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(rename = "width", deserialize_with = "deserialize_u32_from_number")]
    pub w: u32,
    #[serde(rename = "height", deserialize_with = "deserialize_u32_from_number")]
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    pub fn is_square(&self) -> bool {
        self.w == self.h
    }

    pub fn short_side(&self) -> u32 {
        self.w.min(self.h)
    }

    pub fn long_side(&self) -> u32 {
        self.w.max(self.h)
    }

    /// Grows both sides by `pad`, saturating at `u32::MAX`.
    pub fn padded(&self, pad: u32) -> Self {
        Self {
            w: self.w.saturating_add(pad),
            h: self.h.saturating_add(pad),
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Accepts any non-negative JSON number and rounds it to whole millimetres.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value.round() > u32::MAX as f64 {
        return Err(D::Error::custom(format!(
            "expected a non-negative dimension, got {value}"
        )));
    }
    Ok(value.round() as u32)
}

/// A requested piece, before quantity expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: String,
    pub rect: Rect,
    pub qty: u32,
    pub grain_locked: bool,
}

/// One physical unit to cut. `padded` carries the kerf and is what the
/// search packs; `rect` is what gets reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceInstance {
    pub id: String,
    pub piece_id: String,
    pub rect: Rect,
    pub padded: Rect,
    pub allow_rotate: bool,
}

impl PieceInstance {
    /// Rotation only changes anything for non-square pieces.
    pub fn can_rotate(&self) -> bool {
        self.allow_rotate && !self.padded.is_square()
    }

    /// Unpadded size in the given orientation.
    pub fn oriented(&self, rotated: bool) -> Rect {
        if rotated {
            self.rect.rotated()
        } else {
            self.rect
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stock {
    Sheet { size: Rect },
    Roll { width: u32 },
}

impl Stock {
    /// Whether `piece` fits the stock as given. Rolls only constrain width.
    pub fn admits(&self, piece: Rect) -> bool {
        match self {
            Stock::Sheet { size } => piece.fits_in(size),
            Stock::Roll { width } => piece.w <= *width,
        }
    }
}

/// A padded piece positioned inside one bin during the search.
/// `index` refers to the instance slice the search was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub rect: Rect,
    pub rotated: bool,
}

impl Slot {
    pub fn right(&self) -> u32 {
        self.x + self.rect.w
    }

    pub fn top(&self) -> u32 {
        self.y + self.rect.h
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

/// A reported placement: original piece size in placed orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub id: String,
    pub piece_id: String,
    pub x: u32,
    pub y: u32,
    #[serde(flatten)]
    pub rect: Rect,
    pub rotated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin {
    pub index: usize,
    pub size: Rect,
    pub placements: Vec<Placement>,
}

impl Bin {
    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.rect.area()).sum()
    }

    pub fn fill_percent(&self) -> f64 {
        let area = self.size.area();
        if area == 0 {
            return 0.0;
        }
        self.used_area() as f64 / area as f64 * 100.0
    }
}

/// Finished engine output. Every instance id lands in exactly one of
/// the bins, `impossible` or `unplaced`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub bins: Vec<Bin>,
    pub impossible: Vec<String>,
    pub unplaced: Vec<String>,
}

impl Layout {
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn placed_count(&self) -> usize {
        self.bins.iter().map(|b| b.placements.len()).sum()
    }

    pub fn total_pieces(&self) -> usize {
        self.placed_count() + self.impossible.len() + self.unplaced.len()
    }

    /// Area of stock consumed: whole sheets, or the used roll length.
    pub fn material_area(&self) -> u64 {
        self.bins.iter().map(|b| b.size.area()).sum()
    }

    pub fn used_area(&self) -> u64 {
        self.bins.iter().map(|b| b.used_area()).sum()
    }

    pub fn total_waste_percent(&self) -> f64 {
        let material = self.material_area();
        if material == 0 {
            return 0.0;
        }
        (material - self.used_area()) as f64 / material as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_from_float() {
        let r: Rect = serde_json::from_str(r#"{"width": 600.4, "height": 300}"#).unwrap();
        assert_eq!(r, Rect::new(600, 300));
    }

    #[test]
    fn test_negative_dimension_rejected() {
        let r = serde_json::from_str::<Rect>(r#"{"width": -1, "height": 300}"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_slot_overlap_is_strict() {
        let a = Slot { index: 0, x: 0, y: 0, rect: Rect::new(10, 10), rotated: false };
        let touching = Slot { index: 1, x: 10, y: 0, rect: Rect::new(10, 10), rotated: false };
        let crossing = Slot { index: 2, x: 9, y: 9, rect: Rect::new(10, 10), rotated: false };
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&crossing));
    }

    #[test]
    fn test_roll_admits_any_length() {
        let roll = Stock::Roll { width: 1000 };
        assert!(roll.admits(Rect::new(1000, 50_000)));
        assert!(!roll.admits(Rect::new(1001, 10)));
    }

    #[test]
    fn test_waste_without_bins() {
        let layout = Layout {
            bins: vec![],
            impossible: vec![],
            unplaced: vec![],
        };
        assert_eq!(layout.total_waste_percent(), 0.0);
    }
}
