//! Game session state
//!
//! Everything the simulation owns between ticks: the heart rate controller,
//! the current stage, the player and the run bookkeeping.

use serde::{Deserialize, Serialize};

use super::heart_rate::{HeartRateController, Mode};
use super::level::Level;
use super::levels::LevelLayout;
use super::player::Player;
use crate::camera::Camera;
use crate::error::LevelError;

/// Events emitted by a tick, for logging and presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The player died and was put back at the stage spawn
    Died,
    /// The exit door was reached
    LevelCleared {
        /// Stage that was cleared (1-based)
        index: u32,
        /// A flash charge was earned (cleared in normal mode)
        flash_awarded: bool,
    },
    /// The last stage was cleared
    RunFinished { deaths: u32 },
    /// The run was restarted from the first stage
    Restarted,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub hr: HeartRateController,
    pub level: Level,
    pub player: Player,
    pub camera: Camera,
    /// Current stage (1-based)
    pub stage: u32,
    pub deaths: u32,
    /// All stages cleared; the simulation is frozen until a restart
    pub finished: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Pristine copy of every stage, cloned on entry
    stages: Vec<Level>,
}

impl GameState {
    /// New run over the built-in stages
    pub fn new(baseline: i32, seed: u64, start_stage: u32) -> Result<Self, LevelError> {
        Self::with_layouts(baseline, seed, start_stage, &LevelLayout::builtins())
    }

    /// New run over custom stages (played in order)
    pub fn with_layouts(
        baseline: i32,
        seed: u64,
        start_stage: u32,
        layouts: &[LevelLayout],
    ) -> Result<Self, LevelError> {
        let stages = layouts
            .iter()
            .zip(1u32..)
            .map(|(layout, index)| Level::from_layout(index, layout, stage_seed(seed, index)))
            .collect::<Result<Vec<_>, _>>()?;

        let count = stages.len() as u32;
        if start_stage == 0 || start_stage > count {
            return Err(LevelError::UnknownStage {
                index: start_stage,
                count,
            });
        }

        let level = stages[start_stage as usize - 1].clone();
        let player = Player::new(level.spawn);
        let mut state = Self {
            seed,
            hr: HeartRateController::new(baseline, seed),
            level,
            player,
            camera: Camera::new(),
            stage: start_stage,
            deaths: 0,
            finished: false,
            time_ticks: 0,
            stages,
        };
        state.follow_player();
        log::info!(
            "New run: baseline {baseline} bpm, seed {seed}, stage {start_stage}/{count}"
        );
        Ok(state)
    }

    pub fn stage_count(&self) -> u32 {
        self.stages.len() as u32
    }

    pub fn mode(&self) -> Mode {
        self.hr.mode()
    }

    /// Whether the player is inside the stage's zoom zone
    pub fn in_zoom_zone(&self) -> bool {
        let rect = self.player.rect();
        self.level.zoom_zone.is_some_and(|z| rect.overlaps(&z))
    }

    /// Put the player back at spawn and clear projectiles
    pub fn respawn(&mut self) {
        self.player.respawn();
        self.level.clear_projectiles();
    }

    /// Death bookkeeping: count it and respawn
    pub(crate) fn kill_player(&mut self) {
        self.deaths += 1;
        log::debug!(
            "Died on stage {} at ({:.0}, {:.0}), deaths: {}",
            self.stage,
            self.player.pos.x,
            self.player.pos.y,
            self.deaths
        );
        self.respawn();
    }

    /// Load stage `stage` fresh and move the player to its spawn
    pub(crate) fn enter_stage(&mut self, stage: u32) {
        let Some(level) = stage.checked_sub(1).and_then(|i| self.stages.get(i as usize)) else {
            log::warn!("No stage {stage}");
            return;
        };
        self.level = level.clone();
        self.stage = stage;
        self.player.set_spawn(self.level.spawn);
        self.player.respawn();
        log::info!("Entering stage {stage}");
    }

    /// Start over from the first stage
    pub(crate) fn restart(&mut self) {
        self.enter_stage(1);
        self.deaths = 0;
        self.finished = false;
        self.hr.set_mode_override(None);
        self.level.clear_projectiles();
        log::info!("Run restarted");
    }

    pub(crate) fn follow_player(&mut self) {
        let target = self.player.rect().center_x() as f32;
        self.camera.update(target, self.level.world_w);
    }
}

/// Per-stage RNG seed derived from the run seed
fn stage_seed(seed: u64, stage: u32) -> u64 {
    seed ^ (u64::from(stage)).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
