//! Simulation and environment contracts
//!
//! A [`Simulation`] is the combat engine seen through a narrow query
//! interface. An [`Environment`] wraps one and turns raw state into
//! observations and shaped rewards, one engine tick per `step`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ArenaAction, Facing, Reward, VectorObservation};

/// Top-left pixel of a unit or tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPos {
    /// Horizontal pixel offset
    pub x: i32,
    /// Vertical pixel offset
    pub y: i32,
}

impl PixelPos {
    /// Create a position
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Adversary bookkeeping reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillCounters {
    /// Adversaries destroyed during the latest tick
    pub this_tick: usize,
    /// Adversaries destroyed since reset
    pub total: usize,
    /// Adversaries currently on the map
    pub alive: usize,
    /// Adversaries still waiting to spawn
    pub pending: usize,
}

/// Static shape of the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapGeometry {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    /// Cell edge in pixels
    pub cell_px: i32,
    /// Unit edge in cells
    pub unit_cells: usize,
}

/// Snapshot of the engine after reset or a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    /// Controlled unit position
    pub unit: PixelPos,
    /// Controlled unit facing
    pub facing: Facing,
    /// Adversary positions
    pub adversaries: Vec<PixelPos>,
    /// Kill bookkeeping
    pub kills: KillCounters,
}

/// Result of a single engine tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// State after the tick
    pub state: RawState,
    /// Engine-side reward, if the engine produced one
    pub reward: Option<Reward>,
    /// All adversaries defeated with none left to spawn
    pub terminal: bool,
}

/// Episode-level engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Adversaries to spawn over the episode
    pub enemy_count: usize,
    /// Seed for engine randomness
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            enemy_count: 0,
            seed: None,
        }
    }
}

/// The combat engine, consumed only through queries and ticks
#[async_trait]
pub trait Simulation: Send + Sync {
    /// Playfield shape
    fn geometry(&self) -> MapGeometry;

    /// Start a fresh episode
    async fn reset(&mut self, config: &SimConfig) -> crate::Result<RawState>;

    /// Advance exactly one engine tick with the given command
    async fn tick(&mut self, action: ArenaAction) -> crate::Result<TickOutcome>;

    /// Controlled unit position and adversary positions
    fn positions(&self) -> crate::Result<(PixelPos, Vec<PixelPos>)>;

    /// Controlled unit facing and adversary facings
    fn facings(&self) -> crate::Result<(Facing, Vec<Facing>)>;

    /// Top-left pixels of every immutable obstacle tile
    fn static_obstacles(&self) -> Vec<PixelPos>;

    /// Kill bookkeeping
    fn kill_counters(&self) -> KillCounters;

    /// Toggle drawing and real-time pacing
    fn set_render(&mut self, enabled: bool);

    /// Draw the current frame (optional)
    async fn render(&self) -> crate::Result<()> {
        Ok(())
    }
}

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step {
    /// Observation after the tick
    pub observation: VectorObservation,
    /// Shaped reward for the tick
    pub reward: Reward,
    /// Objective reached
    pub done: bool,
    /// Kill bookkeeping after the tick
    pub kills: KillCounters,
}

/// Training-facing view of a simulation
#[async_trait]
pub trait Environment: Send + Sync {
    /// Arity of every observation this environment emits
    fn observation_dim(&self) -> usize;

    /// Reset the environment and return the initial observation
    async fn reset(&mut self) -> crate::Result<VectorObservation>;

    /// Advance one engine tick
    async fn step(&mut self, action: ArenaAction) -> crate::Result<Step>;

    /// Toggle drawing and real-time pacing
    fn set_render(&mut self, enabled: bool);

    /// Render the environment (optional)
    async fn render(&self) -> crate::Result<()> {
        Ok(())
    }
}
