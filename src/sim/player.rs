//! Player kinematics: input intent, grace timers and gravity
//!
//! `update` only decides velocities and timers. Moving the player through
//! the level is the resolver's job.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::heart_rate::Mode;
use super::rect::Rect;
use crate::clamp;
use crate::consts::*;

/// Key states relevant to the player for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub down: bool,
    pub flash: bool,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Authoritative top-left corner (the box is derived from it)
    pub pos: Vec2,
    pub vel: Vec2,
    pub on_ground: bool,
    /// +1 facing right, -1 facing left
    pub facing: i32,
    pub spawn: Vec2,
    /// Grace window after leaving the ground
    pub coyote: f32,
    /// Grace window after pressing jump
    pub jump_buffer: f32,
    pub gravity_flip_timer: f32,
    /// Left/right reversed while > 0
    pub input_swap_timer: f32,
    /// Jump moved to the down key while > 0
    pub jump_swap_timer: f32,
    pub flash_timer: f32,
    pub flash_charges: u32,
    /// Invulnerability left after a respawn
    pub i_frames: f32,
}

impl Player {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            pos: spawn,
            vel: Vec2::ZERO,
            on_ground: false,
            facing: 1,
            spawn,
            coyote: 0.0,
            jump_buffer: 0.0,
            gravity_flip_timer: 0.0,
            input_swap_timer: 0.0,
            jump_swap_timer: 0.0,
            flash_timer: 0.0,
            flash_charges: 0,
            i_frames: 0.0,
        }
    }

    /// Bounding box, always derived from `pos`
    pub fn rect(&self) -> Rect {
        Rect::at(self.pos, PLAYER_SIZE, PLAYER_SIZE)
    }

    pub fn is_gravity_flipped(&self) -> bool {
        self.gravity_flip_timer > 0.0
    }

    pub fn is_input_swapped(&self) -> bool {
        self.input_swap_timer > 0.0
    }

    pub fn is_jump_swapped(&self) -> bool {
        self.jump_swap_timer > 0.0
    }

    pub fn is_flash_active(&self) -> bool {
        self.flash_timer > 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.i_frames > 0.0
    }

    pub fn set_spawn(&mut self, spawn: Vec2) {
        self.spawn = spawn;
    }

    /// Put the player back at spawn with a clean slate and a short grace period.
    /// Flash charges are kept.
    pub fn respawn(&mut self) {
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        self.on_ground = false;
        self.coyote = 0.0;
        self.jump_buffer = 0.0;
        self.gravity_flip_timer = 0.0;
        self.input_swap_timer = 0.0;
        self.jump_swap_timer = 0.0;
        self.flash_timer = 0.0;
        self.i_frames = RESPAWN_I_FRAMES;
    }

    /// Flip gravity unless already flipped. Returns whether it flipped.
    pub fn flip_gravity(&mut self) -> bool {
        if self.is_gravity_flipped() {
            return false;
        }
        self.gravity_flip_timer = GRAVITY_FLIP_DURATION;
        true
    }

    /// Arm each swap that is not already running
    pub fn swap_controls(&mut self) {
        if !self.is_input_swapped() {
            self.input_swap_timer = INPUT_SWAP_DURATION;
        }
        if !self.is_jump_swapped() {
            self.jump_swap_timer = JUMP_SWAP_DURATION;
        }
    }

    /// Horizontal speed multiplier from mode and flash, stacked
    pub fn speed_mult(&self, mode: Mode) -> f32 {
        let flash = if self.is_flash_active() { FLASH_SPEED_MULT } else { 1.0 };
        mode.speed_mult() * flash
    }

    /// Advance timers and turn input into velocity for this tick
    pub fn update(&mut self, dt: f32, input: &PlayerInput, mode: Mode) {
        for timer in [
            &mut self.i_frames,
            &mut self.gravity_flip_timer,
            &mut self.input_swap_timer,
            &mut self.jump_swap_timer,
            &mut self.flash_timer,
        ] {
            if *timer > 0.0 {
                *timer = (*timer - dt).max(0.0);
            }
        }

        if input.flash && !self.is_flash_active() && self.flash_charges > 0 {
            self.flash_charges -= 1;
            self.flash_timer = FLASH_DURATION;
            log::debug!("Flash activated ({} charges left)", self.flash_charges);
        }

        let mut intent = i32::from(input.right) - i32::from(input.left);
        if self.is_input_swapped() {
            intent = -intent;
        }
        self.vel.x = intent as f32 * BASE_MOVE_SPEED * self.speed_mult(mode);
        if intent != 0 {
            self.facing = intent.signum();
        }

        let jump_pressed = if self.is_jump_swapped() { input.down } else { input.jump };
        self.jump_buffer = if jump_pressed {
            JUMP_BUFFER_TIME
        } else {
            (self.jump_buffer - dt).max(0.0)
        };
        self.coyote = if self.on_ground {
            COYOTE_TIME
        } else {
            (self.coyote - dt).max(0.0)
        };

        let flipped = self.is_gravity_flipped();
        if self.jump_buffer > 0.0 && self.coyote > 0.0 {
            let v = BASE_JUMP_VEL * mode.jump_mult();
            self.vel.y = if flipped { -v } else { v };
            self.jump_buffer = 0.0;
            self.coyote = 0.0;
            self.on_ground = false;
        }

        let g = if flipped { -GRAVITY } else { GRAVITY };
        // Standing on flat ground must not accumulate sink velocity
        if self.on_ground && !flipped {
            self.vel.y = 0.0;
        } else {
            self.vel.y += g * dt;
        }
        self.vel.y = clamp(self.vel.y, -MAX_FALL_SPEED, MAX_FALL_SPEED);
    }
}
