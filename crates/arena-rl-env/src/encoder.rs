//! Observation encoding
//!
//! Layout (16 features):
//!
//! | index | feature |
//! |---|---|
//! | 0, 1 | unit cell x, y |
//! | 2 | facing code |
//! | 3 | unknown cells remaining |
//! | 4..8 | up / right / down / left access (1 open, 0 blocked) |
//! | 8..16 | four most recent distinct prior cells, x then y, most recent first, `-1` padded |

use arena_rl_core::{Facing, VectorObservation};

use crate::grid::{CellState, GridCoord, GridVisitationTracker};

/// Number of prior cells included
pub const PRIOR_POSITIONS: usize = 4;

/// Arity of every encoded observation
pub const OBSERVATION_DIM: usize = 8 + 2 * PRIOR_POSITIONS;

const PADDING: f64 = -1.0;

/// Converts raw unit state plus the visitation grid into a feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationEncoder {
    unit_cells: usize,
}

impl ObservationEncoder {
    /// Encoder for a unit covering `unit_cells x unit_cells` cells
    #[must_use]
    pub fn new(unit_cells: usize) -> Self {
        Self { unit_cells }
    }

    /// Arity of the produced vectors
    #[must_use]
    pub fn dim(&self) -> usize {
        OBSERVATION_DIM
    }

    /// Centre and spread of every feature for a `width x height` grid
    ///
    /// Subtracting the centre and dividing by the spread maps each feature onto
    /// roughly `[-1, 1]`; padding slots land just below `-1`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn feature_stats(&self, width: usize, height: usize) -> (Vec<f64>, Vec<f64>) {
        let half_w = (width as f64 / 2.0).max(0.5);
        let half_h = (height as f64 / 2.0).max(0.5);
        let half_cells = (width as f64 * height as f64 / 2.0).max(0.5);

        let mut stats = vec![(half_w, half_w), (half_h, half_h), (1.5, 1.5)];
        stats.push((half_cells, half_cells));
        stats.extend([(0.5, 0.5); 4]);
        for _ in 0..PRIOR_POSITIONS {
            stats.push((half_w, half_w));
            stats.push((half_h, half_h));
        }
        stats.into_iter().unzip()
    }

    /// Cells directly ahead of the footprint's leading edge
    fn cells_ahead(&self, origin: GridCoord, facing: Facing) -> Vec<GridCoord> {
        let size = i32::try_from(self.unit_cells).unwrap_or(i32::MAX);
        (0..size)
            .map(|i| match facing {
                Facing::Up => origin.offset(i, -1),
                Facing::Right => origin.offset(size, i),
                Facing::Down => origin.offset(i, size),
                Facing::Left => origin.offset(-1, i),
            })
            .collect()
    }

    /// Whether the unit could move one cell in each direction, ordered up, right, down, left
    ///
    /// Off-grid cells ahead count as obstacles.
    #[must_use]
    pub fn access(&self, origin: GridCoord, tracker: &GridVisitationTracker) -> [bool; 4] {
        Facing::ALL.map(|facing| {
            self.cells_ahead(origin, facing)
                .into_iter()
                .all(|cell| tracker.state_at(cell) != CellState::Obstacle)
        })
    }

    /// Build the observation vector
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn encode(
        &self,
        origin: GridCoord,
        facing: Facing,
        prior: &[GridCoord],
        tracker: &GridVisitationTracker,
    ) -> VectorObservation {
        let mut data = Vec::with_capacity(OBSERVATION_DIM);
        data.push(f64::from(origin.x));
        data.push(f64::from(origin.y));
        data.push(f64::from(facing.code()));
        data.push(tracker.count_by_state(CellState::Unknown) as f64);
        data.extend(
            self.access(origin, tracker)
                .iter()
                .map(|&open| if open { 1.0 } else { 0.0 }),
        );
        for i in 0..PRIOR_POSITIONS {
            match prior.get(i) {
                Some(cell) => {
                    data.push(f64::from(cell.x));
                    data.push(f64::from(cell.y));
                }
                None => {
                    data.push(PADDING);
                    data.push(PADDING);
                }
            }
        }
        VectorObservation::new(data)
    }
}

impl Default for ObservationEncoder {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_stats_cover_layout() {
        let (centre, spread) = ObservationEncoder::default().feature_stats(26, 26);
        assert_eq!(centre.len(), OBSERVATION_DIM);
        assert_eq!(spread.len(), OBSERVATION_DIM);
        // full unknown grid maps to +1, access flags to -1 / +1
        assert!(((676.0 - centre[3]) / spread[3] - 1.0).abs() < 1e-12);
        assert!(((0.0 - centre[4]) / spread[4] + 1.0).abs() < 1e-12);
        assert!(((1.0 - centre[7]) / spread[7] - 1.0).abs() < 1e-12);
        assert!(spread.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn test_edges_are_blocked() {
        let tracker = GridVisitationTracker::new(6, 6);
        let encoder = ObservationEncoder::default();
        // top-left corner: up and left look off-grid
        assert_eq!(
            encoder.access(GridCoord::new(0, 0), &tracker),
            [false, true, true, false]
        );
        // bottom-right corner with a 2x2 footprint
        assert_eq!(
            encoder.access(GridCoord::new(4, 4), &tracker),
            [true, false, false, true]
        );
    }

    #[test]
    fn test_single_obstacle_blocks_direction() {
        let mut tracker = GridVisitationTracker::new(6, 6);
        tracker.mark_obstacle(GridCoord::new(3, 3));
        let encoder = ObservationEncoder::default();
        // down checks (2,3) and (3,3)
        assert_eq!(
            encoder.access(GridCoord::new(2, 1), &tracker),
            [true, true, false, true]
        );
        // left checks (3,2) and (3,3); right looks off-grid
        assert_eq!(
            encoder.access(GridCoord::new(4, 2), &tracker),
            [true, false, true, false]
        );
    }

    #[test]
    fn test_visited_cells_are_open() {
        let mut tracker = GridVisitationTracker::new(6, 6);
        tracker.mark_footprint(GridCoord::new(0, 2), 2);
        let encoder = ObservationEncoder::default();
        assert!(encoder.access(GridCoord::new(2, 2), &tracker)[3]);
    }

    #[test]
    fn test_encode_layout_and_padding() {
        let mut tracker = GridVisitationTracker::new(6, 6);
        tracker.mark_footprint(GridCoord::new(1, 1), 2);
        let encoder = ObservationEncoder::default();
        let obs = encoder.encode(
            GridCoord::new(1, 1),
            Facing::Left,
            &[GridCoord::new(1, 2)],
            &tracker,
        );
        assert_eq!(obs.len(), OBSERVATION_DIM);
        assert_eq!(&obs.data[..4], &[1.0, 1.0, 3.0, 32.0]);
        assert_eq!(&obs.data[8..12], &[1.0, 2.0, -1.0, -1.0]);
        assert!(obs.validate(OBSERVATION_DIM).is_ok());
    }
}
