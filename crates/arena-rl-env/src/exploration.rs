//! The exploration environment
//!
//! Wraps any [`Simulation`] and owns the per-episode visitation grid, position
//! history, reward shaper and observation encoder. Every `step` is exactly one
//! engine tick.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use arena_rl_core::{
    ArenaAction, Environment, Facing, MapGeometry, PixelPos, Result, Reward, SimConfig,
    Simulation, Step, VectorObservation,
};

use crate::arena::ArenaSim;
use crate::encoder::{ObservationEncoder, PRIOR_POSITIONS};
use crate::grid::{CellState, GridCoord, GridVisitationTracker};
use crate::shaping::{PositionHistory, RewardShaper, DEFAULT_NOVELTY_SCALE};

/// Episode settings for [`ExplorationEnv`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Adversaries spawned per episode
    pub enemy_count: usize,
    /// Base seed; episode `n` uses `seed + n`
    pub seed: Option<u64>,
    /// Reward added per adversary destroyed during a tick
    pub kill_reward: f64,
    /// Novelty scale `K`
    pub novelty_scale: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            enemy_count: 0,
            seed: None,
            kill_reward: 0.0,
            novelty_scale: DEFAULT_NOVELTY_SCALE,
        }
    }
}

/// Environment producing shaped exploration rewards
#[derive(Clone)]
pub struct ExplorationEnv<S> {
    sim: S,
    config: ExplorationConfig,
    geometry: MapGeometry,
    tracker: GridVisitationTracker,
    history: PositionHistory,
    shaper: RewardShaper,
    encoder: ObservationEncoder,
    unknown: usize,
    resets: u64,
}

impl ExplorationEnv<ArenaSim> {
    /// Exploration environment over the bundled arena
    #[must_use]
    pub fn arena(config: ExplorationConfig) -> Self {
        Self::new(ArenaSim::new(), config)
    }
}

impl<S: Simulation> ExplorationEnv<S> {
    /// Wrap a simulation
    pub fn new(sim: S, config: ExplorationConfig) -> Self {
        let geometry = sim.geometry();
        Self {
            tracker: GridVisitationTracker::new(geometry.width, geometry.height),
            history: PositionHistory::new(),
            shaper: RewardShaper::new(config.novelty_scale),
            encoder: ObservationEncoder::new(geometry.unit_cells),
            unknown: geometry.width * geometry.height,
            geometry,
            sim,
            config,
            resets: 0,
        }
    }

    /// Episode settings
    #[must_use]
    pub fn config(&self) -> &ExplorationConfig {
        &self.config
    }

    /// Visitation grid of the current episode
    #[must_use]
    pub fn tracker(&self) -> &GridVisitationTracker {
        &self.tracker
    }

    /// Position history of the current episode
    #[must_use]
    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    /// The wrapped simulation
    #[must_use]
    pub fn simulation(&self) -> &S {
        &self.sim
    }

    /// Playfield shape the encoder works on
    #[must_use]
    pub fn geometry(&self) -> MapGeometry {
        self.geometry
    }

    /// Per-feature centre and spread of the observations this environment emits
    #[must_use]
    pub fn feature_stats(&self) -> (Vec<f64>, Vec<f64>) {
        self.encoder.feature_stats(self.geometry.width, self.geometry.height)
    }

    fn cell_of(&self, pos: PixelPos) -> GridCoord {
        GridCoord::from_pixel(pos.x, pos.y, self.geometry.cell_px)
    }

    fn encode(&self, current: GridCoord, facing: Facing) -> VectorObservation {
        let prior = self.history.recent_distinct(PRIOR_POSITIONS, current);
        self.encoder.encode(current, facing, &prior, &self.tracker)
    }
}

#[async_trait]
impl<S: Simulation> Environment for ExplorationEnv<S> {
    fn observation_dim(&self) -> usize {
        self.encoder.dim()
    }

    /// Start an episode on a fresh grid
    ///
    /// The position history is emptied and then seeded with the start cell,
    /// so idling on the first tick scores as a revisit. The start footprint
    /// stays unknown until the first tick marks it.
    async fn reset(&mut self) -> Result<VectorObservation> {
        let seed = self.config.seed.map(|s| s.wrapping_add(self.resets));
        self.resets += 1;
        let state = self
            .sim
            .reset(&SimConfig {
                enemy_count: self.config.enemy_count,
                seed,
            })
            .await?;

        self.geometry = self.sim.geometry();
        self.tracker.reset(self.geometry.width, self.geometry.height);
        for pos in self.sim.static_obstacles() {
            let cell = self.cell_of(pos);
            self.tracker.mark_obstacle(cell);
        }
        self.unknown = self.tracker.count_by_state(CellState::Unknown);

        let start = self.cell_of(state.unit);
        self.history.clear();
        self.history.push(start);
        debug!(
            obstacles = self.tracker.count_by_state(CellState::Obstacle),
            unknown = self.unknown,
            "exploration episode reset"
        );
        Ok(self.encode(start, state.facing))
    }

    #[allow(clippy::cast_precision_loss)]
    async fn step(&mut self, action: ArenaAction) -> Result<Step> {
        let outcome = self.sim.tick(action).await?;
        let (unit, _) = self.sim.positions()?;
        let (facing, _) = self.sim.facings()?;
        let kills = self.sim.kill_counters();

        let current = self.cell_of(unit);
        self.tracker.mark_footprint(current, self.geometry.unit_cells);
        let unknown = self.tracker.count_by_state(CellState::Unknown);
        let shaped = self.shaper.reward(
            self.unknown,
            unknown,
            &self.tracker,
            current,
            &mut self.history,
        );
        self.unknown = unknown;

        let reward = shaped
            + Reward(self.config.kill_reward * kills.this_tick as f64)
            + outcome.reward.unwrap_or_default();

        Ok(Step {
            observation: self.encode(current, facing),
            reward,
            done: outcome.terminal,
            kills,
        })
    }

    fn set_render(&mut self, enabled: bool) {
        self.sim.set_render(enabled);
    }

    async fn render(&self) -> Result<()> {
        self.sim.render().await
    }
}
