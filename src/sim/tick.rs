//! Per-frame simulation step
//!
//! Order matters: heart rate first (it decides the mode), then the level's
//! own clocks, then the player's intent, then collision. Deaths and doors are
//! handled last, on the resolved position.

use serde::{Deserialize, Serialize};

use super::collision::resolve_physics;
use super::heart_rate::{Mode, Nudge};
use super::player::PlayerInput;
use super::state::{GameEvent, GameState};

/// Manual mode override keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    Stress,
    Panic,
    /// Drop the override and derive the mode from bpm again
    Auto,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub player: PlayerInput,
    /// Respawn now (restarts the run once it is finished)
    pub respawn: bool,
    pub force_mode: Option<ForceMode>,
    /// Manual bpm nudge keys
    pub bpm_up: bool,
    pub bpm_down: bool,
}

/// Advance the game by `dt` seconds.
///
/// `live_bpm` is the latest externally measured heart rate, if any; `None`
/// lets the controller drift on its own.
pub fn tick(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    live_bpm: Option<i32>,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    state.time_ticks += 1;

    if input.respawn {
        if state.finished {
            state.restart();
            events.push(GameEvent::Restarted);
        } else {
            state.respawn();
        }
    }

    match input.force_mode {
        Some(ForceMode::Stress) => state.hr.set_mode_override(Some(Mode::Stress)),
        Some(ForceMode::Panic) => state.hr.set_mode_override(Some(Mode::Panic)),
        Some(ForceMode::Auto) => state.hr.set_mode_override(None),
        None => {}
    }

    state.hr.set_live_bpm(live_bpm);
    state.hr.update(dt, Nudge::from_keys(input.bpm_up, input.bpm_down));
    let mode = state.hr.mode();

    // A finished run is frozen until restarted
    if !state.finished {
        step_stage(state, &input.player, mode, dt, &mut events);
    }

    state.follow_player();
    events
}

fn step_stage(
    state: &mut GameState,
    input: &PlayerInput,
    mode: Mode,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let rect = state.player.rect();
    state.level.update(dt, &rect);
    state.player.update(dt, input, mode);

    if resolve_physics(&mut state.player, &mut state.level, dt) {
        state.kill_player();
        events.push(GameEvent::Died);
    }

    let rect = state.player.rect();
    state.level.drift_fake_doors(dt, &rect);
    if !state.player.is_invulnerable() && state.level.touches_fake_door(&rect) {
        state.kill_player();
        events.push(GameEvent::Died);
    }

    if !state.level.reached_exit(&state.player.rect()) {
        return;
    }

    let cleared = state.stage;
    let flash_awarded = mode == Mode::Normal;
    if flash_awarded {
        state.player.flash_charges += 1;
    }
    log::info!(
        "Cleared stage {cleared} in {:.1}s ({} deaths so far{})",
        state.level.level_time,
        state.deaths,
        if flash_awarded { ", flash earned" } else { "" }
    );
    events.push(GameEvent::LevelCleared {
        index: cleared,
        flash_awarded,
    });

    if cleared >= state.stage_count() {
        state.finished = true;
        log::info!("Run finished with {} deaths", state.deaths);
        events.push(GameEvent::RunFinished {
            deaths: state.deaths,
        });
    } else {
        state.enter_stage(cleared + 1);
    }
}
