//! Per-cell visitation map over the discretized playfield

use serde::{Deserialize, Serialize};

/// Exploration state of one map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Never visited
    Unknown,
    /// Static obstacle; terminal
    Obstacle,
    /// Covered by the controlled unit at least once
    Visited,
}

impl CellState {
    /// Integer coding (0 unknown, 1 obstacle, 2 visited)
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Obstacle => 1,
            Self::Visited => 2,
        }
    }

    fn slot(self) -> usize {
        usize::from(self.code())
    }
}

/// Cell coordinate; may lie outside the grid when probing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridCoord {
    /// Create a coordinate
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a pixel
    #[must_use]
    pub fn from_pixel(px: i32, py: i32, cell_px: i32) -> Self {
        Self {
            x: px.div_euclid(cell_px),
            y: py.div_euclid(cell_px),
        }
    }

    /// Coordinate shifted by `(dx, dy)`
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Flat `width * height` map addressed by `x + y * width`
///
/// Obstacles are stamped once per episode and never change afterwards;
/// visitation marks skip them. Per-state counts are maintained incrementally.
#[derive(Debug, Clone)]
pub struct GridVisitationTracker {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
    counts: [usize; 3],
}

impl GridVisitationTracker {
    /// Create an all-unknown grid
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let mut tracker = Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
            counts: [0; 3],
        };
        tracker.reset(width, height);
        tracker
    }

    /// Clear every cell to [`CellState::Unknown`], resizing if needed
    pub fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells.resize(width * height, CellState::Unknown);
        self.counts = [0; 3];
        self.counts[CellState::Unknown.slot()] = width * height;
    }

    /// Grid width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw cell states in `x + y * width` order
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        let x = usize::try_from(coord.x).ok()?;
        let y = usize::try_from(coord.y).ok()?;
        (x < self.width && y < self.height).then(|| x + y * self.width)
    }

    fn set(&mut self, idx: usize, state: CellState) {
        let old = self.cells[idx];
        if old != state {
            self.counts[old.slot()] -= 1;
            self.counts[state.slot()] += 1;
            self.cells[idx] = state;
        }
    }

    /// Whether a coordinate lies on the grid
    #[must_use]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        self.index(coord).is_some()
    }

    /// State of a cell; anything off the grid reads as an obstacle
    #[must_use]
    pub fn state_at(&self, coord: GridCoord) -> CellState {
        self.index(coord)
            .map_or(CellState::Obstacle, |idx| self.cells[idx])
    }

    /// Whether a cell blocks movement (obstacle or off-map)
    #[must_use]
    pub fn is_blocked(&self, coord: GridCoord) -> bool {
        self.state_at(coord) == CellState::Obstacle
    }

    /// Stamp a static obstacle. Off-grid coordinates are ignored.
    pub fn mark_obstacle(&mut self, coord: GridCoord) {
        if let Some(idx) = self.index(coord) {
            self.set(idx, CellState::Obstacle);
        }
    }

    /// Mark a cell visited. Returns `true` if it was unknown before.
    ///
    /// Obstacles and off-grid coordinates are left untouched.
    pub fn mark_visited(&mut self, coord: GridCoord) -> bool {
        let Some(idx) = self.index(coord) else {
            return false;
        };
        match self.cells[idx] {
            CellState::Obstacle | CellState::Visited => false,
            CellState::Unknown => {
                self.set(idx, CellState::Visited);
                true
            }
        }
    }

    /// Mark the `size x size` block whose top-left cell is `origin`
    ///
    /// Returns the number of cells that went from unknown to visited.
    pub fn mark_footprint(&mut self, origin: GridCoord, size: usize) -> usize {
        let size = i32::try_from(size).unwrap_or(i32::MAX);
        let mut uncovered = 0;
        for dy in 0..size {
            for dx in 0..size {
                if self.mark_visited(origin.offset(dx, dy)) {
                    uncovered += 1;
                }
            }
        }
        uncovered
    }

    /// Number of cells in a given state
    #[must_use]
    pub fn count_by_state(&self, state: CellState) -> usize {
        self.counts[state.slot()]
    }
}
