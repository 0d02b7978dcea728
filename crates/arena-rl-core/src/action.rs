//! Discrete actions, facings and the per-episode action log

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Number of recent decisions kept in an [`ActionLog`]
pub const ACTION_LOG_LEN: usize = 20;

/// The six commands the controlled unit understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArenaAction {
    /// Fire a projectile along the current facing
    Fire,
    /// Turn up and move
    Up,
    /// Turn right and move
    Right,
    /// Turn down and move
    Down,
    /// Turn left and move
    Left,
    /// Do nothing
    Idle,
}

impl ArenaAction {
    /// Every action, ordered by index
    pub const ALL: [Self; 6] = [
        Self::Fire,
        Self::Up,
        Self::Right,
        Self::Down,
        Self::Left,
        Self::Idle,
    ];

    /// Size of the action set
    pub const COUNT: usize = Self::ALL.len();

    /// Index of the action in the policy's output layer
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Fire => 0,
            Self::Up => 1,
            Self::Right => 2,
            Self::Down => 3,
            Self::Left => 4,
            Self::Idle => 5,
        }
    }

    /// Facing the unit turns to when this action is applied
    #[must_use]
    pub fn heading(self) -> Option<Facing> {
        match self {
            Self::Up => Some(Facing::Up),
            Self::Right => Some(Facing::Right),
            Self::Down => Some(Facing::Down),
            Self::Left => Some(Facing::Left),
            Self::Fire | Self::Idle => None,
        }
    }
}

impl TryFrom<usize> for ArenaAction {
    type Error = crate::RLError;

    fn try_from(index: usize) -> crate::Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| crate::RLError::InvalidAction(format!("no action with index {index}")))
    }
}

/// Direction a unit is pointing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Towards y = 0
    Up,
    /// Towards increasing x
    Right,
    /// Towards increasing y
    Down,
    /// Towards x = 0
    Left,
}

impl Facing {
    /// All facings in coding order
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Integer coding used in observation vectors
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    /// Unit step `(dx, dy)` in screen coordinates
    #[must_use]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

/// Fixed-length ring of the most recent decisions in an episode
///
/// Slots start out as `None` ("no action yet"). Every push evicts the oldest
/// slot, so the log always holds exactly [`ACTION_LOG_LEN`] entries ordered
/// oldest to newest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLog {
    entries: VecDeque<Option<ArenaAction>>,
}

impl ActionLog {
    /// Create a log filled with the "no action" sentinel
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: std::iter::repeat(None).take(ACTION_LOG_LEN).collect(),
        }
    }

    /// Record a decision
    pub fn push(&mut self, action: ArenaAction) {
        self.entries.pop_front();
        self.entries.push_back(Some(action));
    }

    /// Entries ordered oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = Option<ArenaAction>> + '_ {
        self.entries.iter().copied()
    }

    /// Most recent decision, if any
    #[must_use]
    pub fn last(&self) -> Option<ArenaAction> {
        self.entries.back().copied().flatten()
    }

    /// Always [`ACTION_LOG_LEN`]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true; the log is pre-filled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}
