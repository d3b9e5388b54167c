//! Heartbeat Devil - a heart-rate driven troll platformer
//!
//! Core modules:
//! - `sim`: Simulation core (player kinematics, trap state machines, collision)
//! - `camera`: Horizontal follow camera and mode-driven view effects
//! - `snapshot`: Read-only render snapshots for presentation layers
//! - `biometric`: Live bpm wire parsing and the producer/consumer handoff
//! - `settings`: Session configuration

pub mod biometric;
pub mod camera;
pub mod error;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use error::{LevelError, SettingsError};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Screen (view) dimensions in pixels
    pub const SCREEN_WIDTH: i32 = 1280;
    pub const SCREEN_HEIGHT: i32 = 720;
    /// Target frame rate of the frame clock
    pub const TARGET_FPS: u32 = 60;
    /// Fixed simulation step
    pub const SIM_DT: f32 = 1.0 / TARGET_FPS as f32;

    /// Stages are several screens wide
    pub const WORLD_SCREENS: i32 = 8;
    pub const DEFAULT_WORLD_WIDTH: i32 = SCREEN_WIDTH * WORLD_SCREENS;

    /// Player kinematics
    pub const PLAYER_SIZE: i32 = 40;
    pub const GRAVITY: f32 = 2400.0;
    pub const BASE_MOVE_SPEED: f32 = 380.0;
    pub const BASE_JUMP_VEL: f32 = -850.0;
    pub const MAX_FALL_SPEED: f32 = 1600.0;
    pub const COYOTE_TIME: f32 = 0.10;
    pub const JUMP_BUFFER_TIME: f32 = 0.10;
    /// Invulnerability after respawn (prevents instant re-kill loops)
    pub const RESPAWN_I_FRAMES: f32 = 0.8;
    /// How far past the screen edge the player may fall before dying
    pub const FALL_OUT_MARGIN: i32 = 220;

    /// Heart rate thresholds (relative to baseline)
    pub const STRESS_DELTA: i32 = 10;
    pub const PANIC_DELTA: i32 = 20;
    /// Stress mode penalties
    pub const STRESS_SPEED_MULT: f32 = 0.78;
    pub const STRESS_JUMP_MULT: f32 = 0.86;
    /// Panic vision spotlight radius (for renderers)
    pub const PANIC_RADIUS: f32 = 185.0;

    /// Flash power-up (earned by clearing a stage calm)
    pub const FLASH_DURATION: f32 = 20.0;
    pub const FLASH_SPEED_MULT: f32 = 1.6;

    /// Player debuffs applied by zones
    pub const GRAVITY_FLIP_DURATION: f32 = 2.2;
    pub const INPUT_SWAP_DURATION: f32 = 3.0;
    pub const JUMP_SWAP_DURATION: f32 = 3.0;

    /// Laser duty cycle
    pub const LASER_ON_TIME: f32 = 1.10;
    pub const LASER_OFF_TIME: f32 = 0.78;

    /// Shifting walls patrol an absolute band measured back from the world end
    pub const WALL_PATROL_FAR: i32 = 1400;
    pub const WALL_PATROL_NEAR: i32 = 1180;
    /// Horizontal shove applied to a player overlapping a shifting wall
    pub const WALL_PUSH_SPEED: f32 = 240.0;

    pub const COLLAPSE_COOLDOWN: f32 = 2.1;

    pub const FALLING_BLOCK_SPEED: f32 = 820.0;
    pub const FALLING_BLOCK_RESET: f32 = 1.5;
    /// A falling block arms when the player passes this close underneath
    pub const FALLING_BLOCK_REACH: i32 = 280;
    /// Falling blocks vanish once this far below the screen
    pub const FALLING_BLOCK_DESPAWN_MARGIN: i32 = 250;

    pub const HIDDEN_SPIKES_DURATION: f32 = 2.0;

    pub const RISING_PIT_RISE_SPEED: f32 = 920.0;
    pub const RISING_PIT_FALL_SPEED: f32 = 960.0;
    pub const RISING_PIT_HOLD: f32 = 0.9;
    /// Crest height of a rising pit, measured up from the screen floor
    pub const RISING_PIT_CREST: i32 = 230;

    /// Homing projectiles
    pub const HOMING_SPAWN_COOLDOWN: f32 = 1.2;
    pub const HOMING_RADIUS: f32 = 11.0;
    pub const HOMING_TTL: f32 = 5.5;
    pub const HOMING_LAUNCH_SPEED: f32 = 230.0;
    pub const HOMING_SPEED: f32 = 310.0;
    pub const HOMING_TURN_RATE: f32 = 1.4;
    /// Projectiles are culled this far outside the world
    pub const PROJECTILE_CULL_MARGIN: f32 = 260.0;

    /// Fake doors
    pub const FAKE_DOOR_ALERT_DISTANCE: i32 = 260;
    pub const FAKE_DOOR_DRIFT_SPEED: f32 = 420.0;
}

/// Clamp `v` into `[lo, hi]`.
///
/// Unlike `f32::clamp` this never panics on an inverted range: `lo` wins,
/// which is what a world narrower than the player needs.
#[inline]
pub fn clamp<T: PartialOrd>(v: T, lo: T, hi: T) -> T {
    let v = if v > hi { hi } else { v };
    if v < lo { lo } else { v }
}

/// Exponentially smooth `current` toward `target` at `rate` per second
#[inline]
pub fn smooth_toward(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * (dt * rate).min(1.0)
}

/// Velocity of magnitude `speed` pointing from `from` to `to`.
///
/// Returns `None` when the points (nearly) coincide and no heading exists.
#[inline]
pub fn heading_at_speed(from: Vec2, to: Vec2, speed: f32) -> Option<Vec2> {
    let delta = to - from;
    if delta.length() > 0.1 {
        Some(delta.normalize() * speed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inverted_range_prefers_low() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(-3, 0, 10), 0);
        assert_eq!(clamp(12, 0, 10), 10);
        // world narrower than the player: lo wins
        assert_eq!(clamp(7, 4, 2), 4);
    }

    #[test]
    fn test_smooth_toward_saturates() {
        assert!((smooth_toward(0.0, 10.0, 2.0, 0.25) - 5.0).abs() < 1e-5);
        // a huge dt never overshoots
        assert_eq!(smooth_toward(0.0, 10.0, 2.0, 5.0), 10.0);
    }

    #[test]
    fn test_heading_at_speed() {
        let v = heading_at_speed(Vec2::ZERO, Vec2::new(30.0, 40.0), 10.0).unwrap();
        assert!((v - Vec2::new(6.0, 8.0)).length() < 1e-4);
        assert!(heading_at_speed(Vec2::ONE, Vec2::ONE, 10.0).is_none());
    }
}
