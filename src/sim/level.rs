//! One stage: static platforms, traps, doors and live projectiles

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::rect::Rect;
use super::trap::{Projectile, Trap, TrapKind};
use crate::clamp;
use crate::consts::*;

/// A solid surface the player can stand on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Solid(Rect),
    /// Surface owned by the trap at this index (collapsing floors)
    Trap(usize),
}

/// An exit door, or a fake one
#[derive(Debug, Clone)]
pub struct Door {
    pub rect: Rect,
    pub fake: bool,
    /// Fake door that creeps toward a nearby player
    pub moves: bool,
    /// Cosmetic: drawn with a warning glow
    pub spiky: bool,
    x: f32,
}

impl Door {
    pub fn exit(rect: Rect) -> Self {
        Self {
            rect,
            fake: false,
            moves: false,
            spiky: false,
            x: rect.x as f32,
        }
    }

    pub fn fake(rect: Rect) -> Self {
        Self {
            fake: true,
            ..Self::exit(rect)
        }
    }

    pub fn moving(mut self) -> Self {
        self.moves = true;
        self
    }

    pub fn spiky(mut self) -> Self {
        self.spiky = true;
        self
    }

    fn drift_toward(&mut self, target_x: i32, step: f32, world_w: i32) {
        let dir = (target_x - self.rect.center_x()).signum() as f32;
        self.x = clamp(self.x + dir * step, 0.0, (world_w - self.rect.w) as f32);
        self.rect.x = self.x as i32;
    }
}

/// Runtime state of one stage
#[derive(Debug, Clone)]
pub struct Level {
    /// Stage number (1-based)
    pub index: u32,
    pub world_w: i32,
    pub spawn: Vec2,
    pub platforms: Vec<Platform>,
    pub traps: Vec<Trap>,
    pub doors: Vec<Door>,
    pub projectiles: Vec<Projectile>,
    /// Area near the exit where the camera zooms in to unsettle the player
    pub zoom_zone: Option<Rect>,
    /// Seconds since the stage started
    pub level_time: f32,
    exit: Option<usize>,
    rng: Pcg32,
}

impl Level {
    /// Empty stage; geometry is added with the `add_*` builders
    pub fn new(index: u32, world_w: i32, spawn: Vec2, seed: u64) -> Self {
        Self {
            index,
            world_w,
            spawn,
            platforms: Vec::new(),
            traps: Vec::new(),
            doors: Vec::new(),
            projectiles: Vec::new(),
            zoom_zone: None,
            level_time: 0.0,
            exit: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn add_platform(&mut self, rect: Rect) {
        self.platforms.push(Platform::Solid(rect));
    }

    /// Add a trap, returning its index. Collapsing floors also become platforms.
    pub fn add_trap(&mut self, trap: Trap) -> usize {
        let index = self.traps.len();
        if trap.kind == TrapKind::CollapsingFloor {
            self.platforms.push(Platform::Trap(index));
        }
        self.traps.push(trap);
        index
    }

    /// Add a door; the last non-fake door added is the exit
    pub fn add_door(&mut self, door: Door) {
        if !door.fake {
            self.exit = Some(self.doors.len());
        }
        self.doors.push(door);
    }

    pub fn exit_door(&self) -> Option<&Door> {
        self.exit.map(|i| &self.doors[i])
    }

    pub fn platform_rect(&self, platform: &Platform) -> Rect {
        match *platform {
            Platform::Solid(rect) => rect,
            Platform::Trap(i) => self.traps[i].rect(),
        }
    }

    /// Whether the player currently falls through this platform
    pub fn is_passable(&self, platform: &Platform) -> bool {
        match *platform {
            Platform::Solid(_) => false,
            Platform::Trap(i) => !self.traps[i].active,
        }
    }

    /// Rectangles of every platform that currently collides, in list order
    pub fn solid_platforms(&self) -> impl Iterator<Item = Rect> + '_ {
        self.platforms
            .iter()
            .filter(|p| !self.is_passable(p))
            .map(|p| self.platform_rect(p))
    }

    /// Advance every trap and projectile by `dt`
    pub fn update(&mut self, dt: f32, player: &Rect) {
        self.level_time += dt;

        for trap in &mut self.traps {
            if let Some(projectile) = trap.update(dt, self.world_w, player, &mut self.rng) {
                self.projectiles.push(projectile);
            }
        }

        let target = player.center();
        for projectile in &mut self.projectiles {
            projectile.update(dt, target, self.world_w);
        }
        self.projectiles.retain(|p| p.active);
    }

    pub fn clear_projectiles(&mut self) {
        self.projectiles.clear();
    }

    /// Let moving fake doors creep toward a nearby player
    pub fn drift_fake_doors(&mut self, dt: f32, player: &Rect) {
        let step = FAKE_DOOR_DRIFT_SPEED * dt;
        for door in self.doors.iter_mut().filter(|d| d.fake && d.moves) {
            let dist = (player.center_x() - door.rect.center_x()).abs()
                + (player.center_y() - door.rect.center_y()).abs();
            if dist < FAKE_DOOR_ALERT_DISTANCE {
                door.drift_toward(player.center_x(), step, self.world_w);
            }
        }
    }

    pub fn touches_fake_door(&self, player: &Rect) -> bool {
        self.doors.iter().any(|d| d.fake && player.overlaps(&d.rect))
    }

    pub fn reached_exit(&self, player: &Rect) -> bool {
        self.exit_door().is_some_and(|d| player.overlaps(&d.rect))
    }
}
