//! Request and response shapes shared by the CLI and the HTTP server.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::error::RequestError;
use crate::metrics::{self, CuttingParams, Metrics};
use crate::solver::Solver;
use crate::types::{Layout, Piece, Placement, Rect, Stock, deserialize_u32_from_number};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Sheet,
    Roll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRequest {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    /// Ignored for rolls.
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceRequest {
    pub id: String,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(default = "default_quantity", deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
    #[serde(default)]
    pub grain_locked: bool,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub material: MaterialKind,
    pub stock: StockRequest,
    pub pieces: Vec<PieceRequest>,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub kerf: u32,
    /// Forbids rotation for every piece.
    #[serde(default)]
    pub grain_lock: bool,
    #[serde(default)]
    pub cutting_speed: f64,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub depth_per_pass: f64,
    #[serde(default)]
    pub exact: Option<bool>,
    #[serde(default)]
    pub exact_time_limit_ms: Option<u64>,
    #[serde(default)]
    pub exact_max_items: Option<usize>,
}

impl OptimizeRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let stock_empty = match self.material {
            MaterialKind::Sheet => self.stock.width == 0 || self.stock.height == 0,
            MaterialKind::Roll => self.stock.width == 0,
        };
        if stock_empty {
            return Err(RequestError::EmptyStock);
        }

        let mut ids = HashSet::new();
        for p in &self.pieces {
            if p.id.is_empty() {
                return Err(RequestError::EmptyPieceId);
            }
            if p.width == 0 || p.height == 0 {
                return Err(RequestError::EmptyPiece { id: p.id.clone() });
            }
            if p.quantity == 0 {
                return Err(RequestError::ZeroQuantity { id: p.id.clone() });
            }
            if !ids.insert(p.id.as_str()) {
                return Err(RequestError::DuplicatePieceId { id: p.id.clone() });
            }
        }
        self.check_instance_ids()?;

        for (field, value) in [
            ("cutting_speed", self.cutting_speed),
            ("thickness", self.thickness),
            ("depth_per_pass", self.depth_per_pass),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RequestError::InvalidParameter { field, value });
            }
        }
        Ok(())
    }

    /// A piece of quantity k > 1 expands to `<id>-1` .. `<id>-k`, so a
    /// single piece named like one of those units would share its id.
    /// Expanded ids of two multi-unit pieces cannot meet: the numeric
    /// suffix after the last `-` pins down the base id.
    fn check_instance_ids(&self) -> Result<(), RequestError> {
        let multi: HashMap<&str, u32> = self
            .pieces
            .iter()
            .filter(|p| p.quantity > 1)
            .map(|p| (p.id.as_str(), p.quantity))
            .collect();

        for p in self.pieces.iter().filter(|p| p.quantity == 1) {
            let Some((base, suffix)) = p.id.rsplit_once('-') else {
                continue;
            };
            let Some(&quantity) = multi.get(base) else {
                continue;
            };
            let unit = suffix.parse::<u32>().ok().filter(|n| n.to_string() == suffix);
            if unit.is_some_and(|n| (1..=quantity).contains(&n)) {
                return Err(RequestError::InstanceIdClash {
                    id: p.id.clone(),
                    base: base.to_string(),
                    quantity,
                });
            }
        }
        Ok(())
    }

    pub fn stock(&self) -> Stock {
        match self.material {
            MaterialKind::Sheet => Stock::Sheet {
                size: Rect::new(self.stock.width, self.stock.height),
            },
            MaterialKind::Roll => Stock::Roll {
                width: self.stock.width,
            },
        }
    }

    pub fn pieces(&self) -> Vec<Piece> {
        self.pieces
            .iter()
            .map(|p| Piece {
                id: p.id.clone(),
                rect: Rect::new(p.width, p.height),
                qty: p.quantity,
                grain_locked: p.grain_locked,
            })
            .collect()
    }

    pub fn cutting_params(&self) -> CuttingParams {
        CuttingParams {
            cutting_speed: self.cutting_speed,
            thickness: self.thickness,
            depth_per_pass: self.depth_per_pass,
        }
    }

    /// Applies the request's overrides on top of `base`.
    pub fn config(&self, base: SolverConfig) -> SolverConfig {
        let mut config = base;
        if let Some(exact) = self.exact {
            config = config.with_exact(exact);
        }
        if let Some(ms) = self.exact_time_limit_ms {
            config = config.with_exact_time_limit(Duration::from_millis(ms));
        }
        if let Some(max) = self.exact_max_items {
            config = config.with_exact_max_items(max);
        }
        config
    }

    pub fn solve(&self, base: SolverConfig) -> Result<OptimizeResponse, RequestError> {
        self.validate()?;
        let layout = Solver::new(self.stock(), self.kerf, self.pieces())
            .with_grain_lock(self.grain_lock)
            .with_config(self.config(base))
            .solve();
        let metrics = metrics::compute(&layout, &self.cutting_params());
        Ok(OptimizeResponse::new(layout, metrics))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinResponse {
    pub index: usize,
    pub dimensions: Rect,
    pub placements: Vec<Placement>,
    pub piece_count: usize,
    pub used_area: u64,
    pub efficiency_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeResponse {
    pub bins: Vec<BinResponse>,
    pub impossible_ids: Vec<String>,
    pub unplaced_ids: Vec<String>,
    pub metrics: Metrics,
}

impl OptimizeResponse {
    pub fn new(layout: Layout, metrics: Metrics) -> Self {
        let bins = layout
            .bins
            .into_iter()
            .map(|bin| BinResponse {
                index: bin.index,
                dimensions: bin.size,
                piece_count: bin.placements.len(),
                used_area: bin.used_area(),
                efficiency_percent: (bin.fill_percent() * 100.0).round() / 100.0,
                placements: bin.placements,
            })
            .collect();
        Self {
            bins,
            impossible_ids: layout.impossible,
            unplaced_ids: layout.unplaced,
            metrics,
        }
    }
}
