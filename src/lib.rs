//! Rectangular cutting-layout optimization for sheets and rolls.

pub mod allocate;
pub mod config;
pub mod error;
pub mod exact;
pub mod expand;
pub mod fit;
pub mod guillotine;
pub mod maxrects;
pub mod metrics;
pub mod policy;
pub mod refine;
pub mod render;
pub mod request;
pub mod solver;
pub mod tournament;
pub mod types;
