//! Core reinforcement learning traits and types for the tile-arena trainer
//!
//! This crate holds the contracts shared by the environment and agent crates:
//! the discrete action set, observation vectors, rewards, episode buffers and
//! the simulation / policy collaborator traits.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod shutdown;
pub mod trajectory;

// Re-export core traits and types
pub use action::{ActionLog, ArenaAction, Facing, ACTION_LOG_LEN};
pub use environment::{
    Environment, KillCounters, MapGeometry, PixelPos, RawState, SimConfig, Simulation, Step,
    TickOutcome,
};
pub use error::{OutputStage, RLError, Result};
pub use observation::VectorObservation;
pub use policy::{Policy, PolicySnapshot, TrainingBatch};
pub use reward::Reward;
pub use shutdown::ShutdownSignal;
pub use trajectory::{reward_to_go, EpisodeBuffer, Transition};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ArenaAction, Environment, Policy, Result, Reward, Simulation, Step, VectorObservation,
    };
}
