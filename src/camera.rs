//! Horizontal follow camera and mode-driven view effects
//!
//! Purely visual: nothing in the simulation reads the camera back.

use serde::{Deserialize, Serialize};

use crate::clamp;
use crate::consts::SCREEN_WIDTH;
use crate::sim::Mode;

/// Fraction of the screen kept ahead of the followed point
const LEAD: f32 = 0.45;

/// Side-scrolling camera (x only; the world is one screen tall)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow `target_x`, keeping the view inside `[0, world_w]`
    pub fn update(&mut self, target_x: f32, world_w: i32) {
        let max_x = (world_w - SCREEN_WIDTH).max(0) as f32;
        self.x = clamp(target_x - SCREEN_WIDTH as f32 * LEAD, 0.0, max_x);
    }

    #[inline]
    pub fn world_to_screen_x(&self, world_x: i32) -> i32 {
        world_x - self.x as i32
    }

    #[inline]
    pub fn screen_to_world_x(&self, screen_x: i32) -> i32 {
        screen_x + self.x as i32
    }
}

/// Screen shake and zoom a renderer should apply this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewEffects {
    /// Shake amplitude in pixels
    pub shake: f32,
    pub zoom: f32,
}

impl Default for ViewEffects {
    fn default() -> Self {
        Self { shake: 0.0, zoom: 1.0 }
    }
}

impl ViewEffects {
    /// Effects for `mode`; the stage's zoom zone adds a floor of its own
    pub fn for_mode(mode: Mode, in_zoom_zone: bool) -> Self {
        let mut fx = match mode {
            Mode::Normal => Self::default(),
            Mode::Stress => Self { shake: 1.0, zoom: 1.03 },
            Mode::Panic => Self { shake: 3.0, zoom: 1.06 },
        };
        if in_zoom_zone {
            fx.shake = fx.shake.max(2.0);
            fx.zoom = fx.zoom.max(1.07);
        }
        fx
    }
}
