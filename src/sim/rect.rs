//! Integer axis-aligned rectangles
//!
//! All world geometry (platforms, traps, doors, the player's box) lives on the
//! integer pixel grid. Overlap is strict: rectangles that only share an edge
//! do not collide, so a player standing exactly on a platform is not
//! "inside" it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `w`x`h` whose top-left corner is `pos` truncated to
    /// the pixel grid
    pub fn at(pos: Vec2, w: i32, h: i32) -> Self {
        Self::new(pos.x as i32, pos.y as i32, w, h)
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    #[inline]
    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x() as f32, self.center_y() as f32)
    }

    /// Move so the right edge sits at `x`
    pub fn set_right(&mut self, x: i32) {
        self.x = x - self.w;
    }

    /// Move so the bottom edge sits at `y`
    pub fn set_bottom(&mut self, y: i32) {
        self.y = y - self.h;
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Strict overlap (shared edges do not count, empty rects never overlap)
    pub fn overlaps(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Overlap or edge contact
    pub fn touches(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left() <= other.right()
            && self.right() >= other.left()
            && self.top() <= other.bottom()
            && self.bottom() >= other.top()
    }

    /// Strict overlap of the horizontal spans only
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.right() > other.left() && self.left() < other.right()
    }
}
