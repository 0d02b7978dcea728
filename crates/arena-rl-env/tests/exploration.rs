use approx::assert_relative_eq;
use async_trait::async_trait;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use arena_rl_core::{
    ArenaAction, Environment, Facing, KillCounters, MapGeometry, PixelPos, RLError, RawState,
    Result, SimConfig, Simulation, TickOutcome,
};
use arena_rl_env::{CellState, ExplorationConfig, ExplorationEnv, GridCoord, OBSERVATION_DIM};

/// A unit parked at a fixed pixel on an obstacle-free 25x26 grid
struct ParkedSim {
    unit: Option<PixelPos>,
}

impl ParkedSim {
    fn new() -> Self {
        Self { unit: None }
    }

    fn state(&self) -> Result<RawState> {
        let unit = self
            .unit
            .ok_or_else(|| RLError::Simulation("not reset".into()))?;
        Ok(RawState {
            unit,
            facing: Facing::Up,
            adversaries: Vec::new(),
            kills: KillCounters::default(),
        })
    }
}

#[async_trait]
impl Simulation for ParkedSim {
    fn geometry(&self) -> MapGeometry {
        MapGeometry {
            width: 25,
            height: 26,
            cell_px: 16,
            unit_cells: 2,
        }
    }

    async fn reset(&mut self, _config: &SimConfig) -> Result<RawState> {
        self.unit = Some(PixelPos::new(64, 64));
        self.state()
    }

    async fn tick(&mut self, _action: ArenaAction) -> Result<TickOutcome> {
        Ok(TickOutcome {
            state: self.state()?,
            reward: None,
            terminal: false,
        })
    }

    fn positions(&self) -> Result<(PixelPos, Vec<PixelPos>)> {
        Ok((self.state()?.unit, Vec::new()))
    }

    fn facings(&self) -> Result<(Facing, Vec<Facing>)> {
        Ok((self.state()?.facing, Vec::new()))
    }

    fn static_obstacles(&self) -> Vec<PixelPos> {
        Vec::new()
    }

    fn kill_counters(&self) -> KillCounters {
        KillCounters::default()
    }

    fn set_render(&mut self, _enabled: bool) {}
}

#[tokio::test]
async fn test_stationary_unit_uncovers_footprint_once() {
    let mut env = ExplorationEnv::new(ParkedSim::new(), ExplorationConfig::default());
    let initial = env.reset().await.unwrap();
    assert_eq!(initial.len(), OBSERVATION_DIM);
    assert_eq!(env.tracker().count_by_state(CellState::Visited), 0);

    let first = env.step(ArenaAction::Idle).await.unwrap();
    let tracker = env.tracker();
    assert_eq!(tracker.count_by_state(CellState::Visited), 4);
    assert_eq!(tracker.count_by_state(CellState::Unknown), 25 * 26 - 4);
    for (x, y) in [(4, 4), (5, 4), (4, 5), (5, 5)] {
        assert_eq!(tracker.cells()[x + y * 25], CellState::Visited);
    }
    // novelty 4 * 4 * 0.1 plus the revisit term for the seeded start cell
    assert_relative_eq!(first.reward.0, 1.6 + 1.0, epsilon = 1e-9);
    assert_relative_eq!(first.observation.data[3], 646.0);

    for _ in 0..5 {
        let next = env.step(ArenaAction::Idle).await.unwrap();
        assert_relative_eq!(next.reward.0, 1.0, epsilon = 1e-9);
        assert_eq!(env.tracker().count_by_state(CellState::Visited), 4);
    }
}

#[tokio::test]
async fn test_reset_clears_episode_state() {
    let mut env = ExplorationEnv::new(ParkedSim::new(), ExplorationConfig::default());
    env.reset().await.unwrap();
    for _ in 0..3 {
        env.step(ArenaAction::Fire).await.unwrap();
    }
    env.reset().await.unwrap();
    assert_eq!(env.tracker().count_by_state(CellState::Visited), 0);
    // only the start cell survives a reset
    let history: Vec<GridCoord> = env.history().iter().collect();
    assert_eq!(history, vec![GridCoord::new(4, 4)]);
}

#[tokio::test]
async fn test_arena_start_reports_blocked_edge() {
    let mut env = ExplorationEnv::arena(ExplorationConfig {
        seed: Some(1),
        ..ExplorationConfig::default()
    });
    let obs = env.reset().await.unwrap();
    assert_eq!(&obs.data[..3], &[8.0, 24.0, 0.0]);
    // down checks row 26, which is off the map
    assert_relative_eq!(obs.data[6], 0.0);
    assert!(obs.validate(env.observation_dim()).is_ok());
}

#[tokio::test]
async fn test_arena_obstacles_fixed_and_unknown_monotone() {
    let mut env = ExplorationEnv::arena(ExplorationConfig {
        enemy_count: 3,
        seed: Some(11),
        ..ExplorationConfig::default()
    });
    env.reset().await.unwrap();
    let obstacles = env.tracker().count_by_state(CellState::Obstacle);
    assert!(obstacles > 0);

    let mut rng = StdRng::seed_from_u64(5);
    let mut unknown = env.tracker().count_by_state(CellState::Unknown);
    for _ in 0..400 {
        let action = ArenaAction::ALL[rng.gen_range(0..ArenaAction::COUNT)];
        let step = env.step(action).await.unwrap();
        assert!(step.reward.0.is_finite());
        assert_eq!(env.tracker().count_by_state(CellState::Obstacle), obstacles);
        let now = env.tracker().count_by_state(CellState::Unknown);
        assert!(now <= unknown);
        unknown = now;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn history_stays_bounded(actions in prop::collection::vec(0usize..6, 1..200)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            let mut env = ExplorationEnv::arena(ExplorationConfig {
                seed: Some(2),
                ..ExplorationConfig::default()
            });
            env.reset().await.unwrap();
            for index in actions {
                let action = ArenaAction::try_from(index).unwrap();
                let step = env.step(action).await.unwrap();
                prop_assert!(env.history().len() <= 20);
                prop_assert_eq!(step.observation.len(), OBSERVATION_DIM);
            }
            Ok(())
        })?;
    }
}
