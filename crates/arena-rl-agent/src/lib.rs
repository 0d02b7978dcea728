//! Policy-gradient agent and training loop for the tile-arena trainer
//!
//! This crate provides:
//! - [`MlpPolicy`], a categorical MLP trained with vanilla policy gradient
//! - [`RandomPolicy`] for baseline comparisons
//! - [`BatchAggregator`] and [`EpisodeRunner`]
//! - [`TrainingLoop`] with checkpointing and resumption

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod checkpoint;
pub mod config;
pub mod optim;
pub mod policy;
pub mod random;
pub mod runner;
pub mod training;

pub use buffer::BatchAggregator;
pub use checkpoint::{Checkpoint, CheckpointStore, RESUME_FILE};
pub use config::{TaskMode, TrainingConfig};
pub use optim::Adam;
pub use policy::{MlpConfig, MlpPolicy, MLP_KIND};
pub use random::{RandomPolicy, RANDOM_KIND};
pub use runner::{EpisodeOutcome, EpisodeRunner, Termination};
pub use training::{watch, EpisodeStats, StatsLog, TrainingLoop, TrainingSummary};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BatchAggregator, EpisodeRunner, MlpConfig, MlpPolicy, RandomPolicy, TaskMode,
        TrainingConfig, TrainingLoop,
    };
    pub use arena_rl_core::prelude::*;
}
