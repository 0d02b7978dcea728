//! Exploration reward shaping
//!
//! The shaped reward has two additive terms:
//! - novelty: `(previous_unknown - current_unknown) * visited_cells * K`, paid
//!   only on ticks where the unit's footprint uncovers new cells
//! - revisit: with `u` the recent history with duplicates removed, `|u|` when
//!   the current cell is in `u`, `|u| * 10` otherwise

use std::collections::VecDeque;

use arena_rl_core::Reward;

use crate::grid::{CellState, GridCoord, GridVisitationTracker};

/// Maximum number of recent positions kept
pub const HISTORY_LEN: usize = 20;

/// Default novelty scale `K`
pub const DEFAULT_NOVELTY_SCALE: f64 = 0.1;

/// Multiplier applied to the revisit term when the cell is absent from history
pub const FRESH_CELL_MULTIPLIER: f64 = 10.0;

/// Bounded record of the controlled unit's recent cells, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionHistory {
    entries: VecDeque<GridCoord>,
}

impl PositionHistory {
    /// Create an empty history
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_LEN + 1),
        }
    }

    /// Append a cell, evicting the oldest once more than [`HISTORY_LEN`] are held
    pub fn push(&mut self, coord: GridCoord) {
        self.entries.push_back(coord);
        while self.entries.len() > HISTORY_LEN {
            self.entries.pop_front();
        }
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, duplicates included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.entries.iter().copied()
    }

    /// Entries with duplicates removed, first occurrence kept, order preserved
    #[must_use]
    pub fn unique(&self) -> Vec<GridCoord> {
        let mut seen = Vec::with_capacity(self.entries.len());
        for &coord in &self.entries {
            if !seen.contains(&coord) {
                seen.push(coord);
            }
        }
        seen
    }

    /// Up to `n` distinct cells other than `current`, most recent first
    #[must_use]
    pub fn recent_distinct(&self, n: usize, current: GridCoord) -> Vec<GridCoord> {
        let mut out = Vec::with_capacity(n);
        for &coord in self.entries.iter().rev() {
            if out.len() == n {
                break;
            }
            if coord != current && !out.contains(&coord) {
                out.push(coord);
            }
        }
        out
    }
}

/// Turns visitation progress and movement history into a scalar reward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardShaper {
    novelty_scale: f64,
}

impl RewardShaper {
    /// Create a shaper with novelty scale `K`
    #[must_use]
    pub fn new(novelty_scale: f64) -> Self {
        Self { novelty_scale }
    }

    /// Reward for discovering new territory this tick
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn novelty(
        &self,
        previous_unknown: usize,
        current_unknown: usize,
        tracker: &GridVisitationTracker,
    ) -> f64 {
        let uncovered = previous_unknown.saturating_sub(current_unknown);
        let visited = tracker.count_by_state(CellState::Visited);
        uncovered as f64 * visited as f64 * self.novelty_scale
    }

    /// Reward for moving somewhere not seen in the recent history
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn revisit(current: GridCoord, history: &PositionHistory) -> f64 {
        let unique = history.unique();
        let n = unique.len() as f64;
        if unique.contains(&current) {
            n
        } else {
            n * FRESH_CELL_MULTIPLIER
        }
    }

    /// Compute the tick reward, then record `current` in `history`
    pub fn reward(
        &self,
        previous_unknown: usize,
        current_unknown: usize,
        tracker: &GridVisitationTracker,
        current: GridCoord,
        history: &mut PositionHistory,
    ) -> Reward {
        let value = self.novelty(previous_unknown, current_unknown, tracker)
            + Self::revisit(current, history);
        history.push(current);
        Reward(value)
    }
}

impl Default for RewardShaper {
    fn default() -> Self {
        Self::new(DEFAULT_NOVELTY_SCALE)
    }
}
