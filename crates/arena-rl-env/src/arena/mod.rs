//! A small deterministic tile-arena engine
//!
//! 26x26 tiles of 16 px, indestructible steel, one controlled 32 px unit,
//! adversaries that wander and spawn from the top row, and a single projectile
//! the controlled unit can have in flight. Both the controlled unit and the base
//! are invulnerable; the engine produces no reward of its own.

mod map;
mod render;
mod units;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use arena_rl_core::{
    ArenaAction, Facing, KillCounters, MapGeometry, PixelPos, RLError, RawState, Result,
    SimConfig, Simulation, TickOutcome,
};

use crate::clock::FrameClock;

pub use map::{Tile, TileMap, MAP_PX, MAP_TILES, TILE_PX};
pub use units::{Projectile, Rect, Tank, UNIT_PX};

/// Spawn position of the controlled unit
pub const PLAYER_START: PixelPos = PixelPos { x: 128, y: 384 };

/// Adversary spawn points, used round-robin
pub const SPAWN_POINTS: [PixelPos; 3] = [
    PixelPos { x: 0, y: 0 },
    PixelPos { x: 192, y: 0 },
    PixelPos { x: 384, y: 0 },
];

const PLAYER_SPEED: i32 = 2;
const ENEMY_SPEED: i32 = 1;
const PROJECTILE_SPEED: i32 = 5;
const SPAWN_INTERVAL_TICKS: u64 = 25;
const MAX_ALIVE: usize = 4;
const TURN_ONE_IN: u32 = 64;
const RENDER_FPS: u32 = 250;

/// The bundled simulation collaborator
#[derive(Clone)]
pub struct ArenaSim {
    map: TileMap,
    player: Option<Tank>,
    enemies: Vec<Tank>,
    projectile: Option<Projectile>,
    pending: usize,
    kills: KillCounters,
    ticks: u64,
    spawn_cursor: usize,
    rng: StdRng,
    clock: FrameClock,
    rendering: bool,
}

impl ArenaSim {
    /// Create an engine with the built-in level; call `reset` before ticking
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: TileMap::level_one(),
            player: None,
            enemies: Vec::new(),
            projectile: None,
            pending: 0,
            kills: KillCounters::default(),
            ticks: 0,
            spawn_cursor: 0,
            rng: StdRng::seed_from_u64(0),
            clock: FrameClock::new(RENDER_FPS),
            rendering: false,
        }
    }

    fn player(&self) -> Result<&Tank> {
        self.player
            .as_ref()
            .ok_or_else(|| RLError::Simulation("controlled unit does not exist".into()))
    }

    fn raw_state(&self) -> Result<RawState> {
        let player = self.player()?;
        Ok(RawState {
            unit: player.pos,
            facing: player.facing,
            adversaries: self.enemies.iter().map(|e| e.pos).collect(),
            kills: self.kill_counters(),
        })
    }

    fn blocked_for_player(&self, rect: Rect) -> bool {
        !rect.inside(MAP_PX)
            || self.map.collides(rect)
            || self.enemies.iter().any(|e| e.rect().overlaps(rect))
    }

    fn apply(&mut self, player: &mut Tank, action: ArenaAction) {
        if let Some(heading) = action.heading() {
            player.facing = heading;
            if !self.blocked_for_player(player.next_rect()) {
                player.advance();
            }
        } else if action == ArenaAction::Fire && self.projectile.is_none() {
            self.projectile = Some(Projectile::fired_by(player, PROJECTILE_SPEED));
        }
    }

    fn update_projectile(&mut self) {
        let Some(mut projectile) = self.projectile.take() else {
            return;
        };
        projectile.advance();
        let rect = projectile.rect();
        if !rect.inside(MAP_PX) || self.map.collides(rect) {
            return;
        }
        if let Some(hit) = self.enemies.iter().position(|e| e.rect().overlaps(rect)) {
            self.enemies.remove(hit);
            self.kills.this_tick += 1;
            self.kills.total += 1;
            debug!(total = self.kills.total, "adversary destroyed");
            return;
        }
        self.projectile = Some(projectile);
    }

    fn random_facing(&mut self) -> Facing {
        Facing::ALL[self.rng.gen_range(0..Facing::ALL.len())]
    }

    fn update_enemies(&mut self, player: &Tank) {
        for i in 0..self.enemies.len() {
            if self.rng.gen_ratio(1, TURN_ONE_IN) {
                self.enemies[i].facing = self.random_facing();
            }
            let next = self.enemies[i].next_rect();
            let blocked = !next.inside(MAP_PX)
                || self.map.collides(next)
                || player.rect().overlaps(next)
                || self
                    .enemies
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != i && other.rect().overlaps(next));
            if blocked {
                self.enemies[i].facing = self.random_facing();
            } else {
                self.enemies[i].advance();
            }
        }
    }

    fn maybe_spawn(&mut self, player: &Tank) {
        if self.ticks % SPAWN_INTERVAL_TICKS != 0
            || self.pending == 0
            || self.enemies.len() >= MAX_ALIVE
        {
            return;
        }
        let point = SPAWN_POINTS[self.spawn_cursor % SPAWN_POINTS.len()];
        let tank = Tank::new(point, Facing::Down, ENEMY_SPEED);
        let occupied = player.rect().overlaps(tank.rect())
            || self.enemies.iter().any(|e| e.rect().overlaps(tank.rect()));
        if occupied {
            return;
        }
        self.enemies.push(tank);
        self.pending -= 1;
        self.spawn_cursor += 1;
    }
}

impl Default for ArenaSim {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Simulation for ArenaSim {
    fn geometry(&self) -> MapGeometry {
        MapGeometry {
            width: MAP_TILES,
            height: MAP_TILES,
            cell_px: TILE_PX,
            unit_cells: 2,
        }
    }

    async fn reset(&mut self, config: &SimConfig) -> Result<RawState> {
        self.rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        self.player = Some(Tank::new(PLAYER_START, Facing::Up, PLAYER_SPEED));
        self.enemies.clear();
        self.projectile = None;
        self.pending = config.enemy_count;
        self.kills = KillCounters {
            pending: config.enemy_count,
            ..KillCounters::default()
        };
        self.ticks = 0;
        self.spawn_cursor = 0;
        self.raw_state()
    }

    async fn tick(&mut self, action: ArenaAction) -> Result<TickOutcome> {
        self.clock.tick().await;
        self.kills.this_tick = 0;

        let mut player = self
            .player
            .take()
            .ok_or_else(|| RLError::Simulation("tick before reset".into()))?;
        self.apply(&mut player, action);
        self.update_projectile();
        self.update_enemies(&player);
        self.ticks += 1;
        self.maybe_spawn(&player);
        self.player = Some(player);

        self.kills.alive = self.enemies.len();
        self.kills.pending = self.pending;
        let terminal = self.kills.this_tick > 0 && self.kills.alive == 0 && self.pending == 0;

        Ok(TickOutcome {
            state: self.raw_state()?,
            reward: None,
            terminal,
        })
    }

    fn positions(&self) -> Result<(PixelPos, Vec<PixelPos>)> {
        let player = self.player()?;
        Ok((player.pos, self.enemies.iter().map(|e| e.pos).collect()))
    }

    fn facings(&self) -> Result<(Facing, Vec<Facing>)> {
        let player = self.player()?;
        Ok((player.facing, self.enemies.iter().map(|e| e.facing).collect()))
    }

    fn static_obstacles(&self) -> Vec<PixelPos> {
        self.map.steel()
    }

    fn kill_counters(&self) -> KillCounters {
        self.kills
    }

    fn set_render(&mut self, enabled: bool) {
        self.rendering = enabled;
        self.clock.set_paced(enabled);
    }

    async fn render(&self) -> Result<()> {
        if !self.rendering {
            return Ok(());
        }
        let frame = render::draw(
            &self.map,
            self.player.as_ref(),
            &self.enemies,
            self.projectile.as_ref(),
            self.kills,
        );
        render::present(&frame)?;
        Ok(())
    }
}
