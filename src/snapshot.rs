//! Read-only render snapshots
//!
//! A presentation layer copies what it needs out of the game state once per
//! frame and never touches the simulation directly. Everything here is plain
//! serializable data.

use glam::Vec2;
use serde::Serialize;

use crate::camera::ViewEffects;
use crate::consts::PANIC_RADIUS;
use crate::sim::{GameState, Mode, Rect};

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub rect: Rect,
    pub facing: i32,
    pub on_ground: bool,
    pub vy: f32,
    pub i_frames: f32,
    pub flash_active: bool,
    pub flash_time_left: f32,
    pub flash_charges: u32,
    pub gravity_flipped: bool,
    pub input_swapped: bool,
    pub jump_swapped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrapView {
    pub kind: &'static str,
    pub rect: Rect,
    pub active: bool,
    /// Local clock, for animation phase
    pub t: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoorView {
    pub rect: Rect,
    pub fake: bool,
    pub spiky: bool,
}

/// Everything a renderer or HUD needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub stage: u32,
    pub deaths: u32,
    pub finished: bool,
    pub bpm: i32,
    pub baseline: i32,
    pub mode: Mode,
    pub world_w: i32,
    pub camera_x: f32,
    pub effects: ViewEffects,
    /// Spotlight radius around the player, only in panic
    pub vision_radius: Option<f32>,
    pub player: PlayerView,
    pub platforms: Vec<Rect>,
    pub traps: Vec<TrapView>,
    pub projectiles: Vec<ProjectileView>,
    pub doors: Vec<DoorView>,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let player = &state.player;
        let level = &state.level;
        let mode = state.mode();

        Self {
            stage: state.stage,
            deaths: state.deaths,
            finished: state.finished,
            bpm: state.hr.bpm(),
            baseline: state.hr.baseline(),
            mode,
            world_w: level.world_w,
            camera_x: state.camera.x,
            effects: ViewEffects::for_mode(mode, state.in_zoom_zone()),
            vision_radius: (mode == Mode::Panic).then_some(PANIC_RADIUS),
            player: PlayerView {
                pos: player.pos,
                rect: player.rect(),
                facing: player.facing,
                on_ground: player.on_ground,
                vy: player.vel.y,
                i_frames: player.i_frames,
                flash_active: player.is_flash_active(),
                flash_time_left: player.flash_timer,
                flash_charges: player.flash_charges,
                gravity_flipped: player.is_gravity_flipped(),
                input_swapped: player.is_input_swapped(),
                jump_swapped: player.is_jump_swapped(),
            },
            platforms: level.solid_platforms().collect(),
            traps: level
                .traps
                .iter()
                .map(|t| TrapView {
                    kind: t.kind.name(),
                    rect: t.rect(),
                    active: t.active,
                    t: t.t,
                    visible: t.is_visible(),
                })
                .collect(),
            projectiles: level
                .projectiles
                .iter()
                .filter(|p| p.active)
                .map(|p| ProjectileView {
                    pos: p.pos,
                    radius: p.radius,
                })
                .collect(),
            doors: level
                .doors
                .iter()
                .map(|d| DoorView {
                    rect: d.rect,
                    fake: d.fake,
                    spiky: d.spiky,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
