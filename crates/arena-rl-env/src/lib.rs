//! Environment side of the tile-arena trainer
//!
//! This crate provides:
//! - the per-cell visitation grid ([`GridVisitationTracker`])
//! - observation encoding and exploration reward shaping
//! - a small deterministic tile-arena engine ([`ArenaSim`])
//! - [`ExplorationEnv`], which wires them together behind the
//!   [`Environment`](arena_rl_core::Environment) contract
//! - [`Normalize`], which rescales observations before they reach a policy

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod arena;
pub mod clock;
pub mod encoder;
pub mod exploration;
pub mod grid;
pub mod shaping;
pub mod wrappers;

pub use arena::ArenaSim;
pub use clock::FrameClock;
pub use encoder::{ObservationEncoder, OBSERVATION_DIM};
pub use exploration::{ExplorationConfig, ExplorationEnv};
pub use grid::{CellState, GridCoord, GridVisitationTracker};
pub use shaping::{PositionHistory, RewardShaper, HISTORY_LEN};
pub use wrappers::Normalize;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ArenaSim, ExplorationConfig, ExplorationEnv, GridVisitationTracker, Normalize,
    };
    pub use arena_rl_core::prelude::*;
}
