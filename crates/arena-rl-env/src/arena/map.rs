//! Static terrain of the arena

use arena_rl_core::PixelPos;

use super::units::Rect;

/// Tile edge in pixels
pub const TILE_PX: i32 = 16;

/// Tiles per side
pub const MAP_TILES: usize = 26;

/// Playfield edge in pixels
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const MAP_PX: i32 = MAP_TILES as i32 * TILE_PX;

/// `#` steel, `B` base, `.` open ground
const LAYOUT: [&str; MAP_TILES] = [
    "..........................",
    "..........................",
    "..##..##..##..##..##..##..",
    "..##..##..##..##..##..##..",
    "..##..##..##..##..##..##..",
    "..##..##..##..##..##..##..",
    "..##..##..######..##..##..",
    "..##..##..######..##..##..",
    "..##..##..........##..##..",
    "..##..##..........##..##..",
    "..........##..##..........",
    "..........##..##..........",
    "##..####..........####..##",
    "##..####..........####..##",
    "..........##..##..........",
    "..........######..........",
    "..##..##..##..##..##..##..",
    "..##..##..##..##..##..##..",
    "..##..##..........##..##..",
    "..##..##..........##..##..",
    "..##..##..######..##..##..",
    "..##..##..######..##..##..",
    "..##..............##..##..",
    "..##.......####...##......",
    "...........#BB#...........",
    "...........#BB#...........",
];

/// Kind of terrain tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    /// Indestructible steel; the only terrain reported as an obstacle
    Steel,
    /// The invulnerable base; impassable but not terrain
    Base,
}

/// Immutable terrain, parsed once
#[derive(Debug, Clone)]
pub struct TileMap {
    tiles: Vec<(PixelPos, Tile)>,
}

impl TileMap {
    /// The built-in level
    #[must_use]
    pub fn level_one() -> Self {
        Self::parse(&LAYOUT)
    }

    fn parse(rows: &[&str]) -> Self {
        let mut tiles = Vec::new();
        for (y, row) in (0..).zip(rows) {
            for (x, ch) in (0..).zip(row.chars()) {
                let kind = match ch {
                    '#' => Tile::Steel,
                    'B' => Tile::Base,
                    _ => continue,
                };
                tiles.push((PixelPos::new(x * TILE_PX, y * TILE_PX), kind));
            }
        }
        Self { tiles }
    }

    /// Top-left pixels of all steel tiles
    #[must_use]
    pub fn steel(&self) -> Vec<PixelPos> {
        self.tiles
            .iter()
            .filter(|(_, kind)| *kind == Tile::Steel)
            .map(|(pos, _)| *pos)
            .collect()
    }

    /// Every tile with its kind
    pub fn tiles(&self) -> impl Iterator<Item = (PixelPos, Tile)> + '_ {
        self.tiles.iter().copied()
    }

    /// Whether a rectangle overlaps any impassable tile
    #[must_use]
    pub fn collides(&self, rect: Rect) -> bool {
        self.tiles
            .iter()
            .any(|(pos, _)| rect.overlaps(Rect::new(pos.x, pos.y, TILE_PX, TILE_PX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_square() {
        assert!(LAYOUT.iter().all(|row| row.len() == MAP_TILES));
    }

    #[test]
    fn test_base_is_not_reported_as_steel() {
        let map = TileMap::level_one();
        let steel = map.steel();
        assert!(!steel.contains(&PixelPos::new(12 * TILE_PX, 24 * TILE_PX)));
        assert!(steel.contains(&PixelPos::new(11 * TILE_PX, 24 * TILE_PX)));
    }
}
