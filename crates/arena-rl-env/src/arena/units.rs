//! Tanks, projectiles and the rectangle math they share

use arena_rl_core::{Facing, PixelPos};

/// Unit edge in pixels
pub const UNIT_PX: i32 = 32;

/// Projectile edge in pixels
pub const PROJECTILE_PX: i32 = 6;

/// Axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Rect {
    /// Create a rectangle
    #[must_use]
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the interiors intersect
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    /// Whether the rectangle lies fully inside a `size x size` square at the origin
    #[must_use]
    pub fn inside(self, size: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x + self.w <= size && self.y + self.h <= size
    }

    /// Copy moved by `(dx, dy)`
    #[must_use]
    pub fn shifted(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// A 32x32 unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tank {
    /// Top-left pixel
    pub pos: PixelPos,
    /// Current facing
    pub facing: Facing,
    /// Pixels moved per tick
    pub speed: i32,
}

impl Tank {
    /// Place a tank
    #[must_use]
    pub fn new(pos: PixelPos, facing: Facing, speed: i32) -> Self {
        Self { pos, facing, speed }
    }

    /// Footprint rectangle
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, UNIT_PX, UNIT_PX)
    }

    /// Footprint after one step along the current facing
    #[must_use]
    pub fn next_rect(&self) -> Rect {
        let (dx, dy) = self.facing.delta();
        self.rect().shifted(dx * self.speed, dy * self.speed)
    }

    /// Commit a step along the current facing
    pub fn advance(&mut self) {
        let (dx, dy) = self.facing.delta();
        self.pos.x += dx * self.speed;
        self.pos.y += dy * self.speed;
    }
}

/// A projectile in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projectile {
    /// Top-left pixel
    pub pos: PixelPos,
    /// Direction of travel
    pub facing: Facing,
    /// Pixels moved per tick
    pub speed: i32,
}

impl Projectile {
    /// Launch from the centre of a tank along its facing
    #[must_use]
    pub fn fired_by(tank: &Tank, speed: i32) -> Self {
        let centre = UNIT_PX / 2 - PROJECTILE_PX / 2;
        Self {
            pos: PixelPos::new(tank.pos.x + centre, tank.pos.y + centre),
            facing: tank.facing,
            speed,
        }
    }

    /// Bounding rectangle
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, PROJECTILE_PX, PROJECTILE_PX)
    }

    /// Move one tick
    pub fn advance(&mut self) {
        let (dx, dy) = self.facing.delta();
        self.pos.x += dx * self.speed;
        self.pos.y += dy * self.speed;
    }
}
