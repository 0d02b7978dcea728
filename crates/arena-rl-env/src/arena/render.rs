//! Text renderer, one character per tile

use std::io::Write;

use arena_rl_core::{Facing, KillCounters, PixelPos, Result};

use super::map::{Tile, TileMap, MAP_TILES, TILE_PX};
use super::units::{Projectile, Tank};

fn cell_index(pos: PixelPos) -> Option<usize> {
    let x = usize::try_from(pos.x.div_euclid(TILE_PX)).ok()?;
    let y = usize::try_from(pos.y.div_euclid(TILE_PX)).ok()?;
    (x < MAP_TILES && y < MAP_TILES).then_some(y * MAP_TILES + x)
}

fn stamp_unit(canvas: &mut [char], pos: PixelPos, glyph: char) {
    for dy in 0..2 {
        for dx in 0..2 {
            let cell = PixelPos::new(pos.x + dx * TILE_PX, pos.y + dy * TILE_PX);
            if let Some(i) = cell_index(cell) {
                canvas[i] = glyph;
            }
        }
    }
}

/// Compose a frame
pub(super) fn draw(
    map: &TileMap,
    player: Option<&Tank>,
    enemies: &[Tank],
    projectile: Option<&Projectile>,
    kills: KillCounters,
) -> String {
    let mut canvas = vec!['.'; MAP_TILES * MAP_TILES];
    for (pos, tile) in map.tiles() {
        if let Some(i) = cell_index(pos) {
            canvas[i] = match tile {
                Tile::Steel => '#',
                Tile::Base => 'B',
            };
        }
    }
    for enemy in enemies {
        stamp_unit(&mut canvas, enemy.pos, 'E');
    }
    if let Some(player) = player {
        let glyph = match player.facing {
            Facing::Up => '^',
            Facing::Right => '>',
            Facing::Down => 'v',
            Facing::Left => '<',
        };
        stamp_unit(&mut canvas, player.pos, glyph);
    }
    if let Some(i) = projectile.and_then(|p| cell_index(p.pos)) {
        canvas[i] = '*';
    }

    let mut frame = String::with_capacity((MAP_TILES + 1) * (MAP_TILES + 1));
    frame.push_str(&format!(
        "kills {} | alive {} | pending {}\n",
        kills.total, kills.alive, kills.pending
    ));
    for row in canvas.chunks(MAP_TILES) {
        frame.extend(row.iter());
        frame.push('\n');
    }
    frame
}

/// Clear the terminal and print a frame
pub(super) fn present(frame: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    write!(out, "\x1b[2J\x1b[H{frame}")?;
    out.flush()?;
    Ok(())
}
