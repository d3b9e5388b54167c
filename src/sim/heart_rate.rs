//! Heart rate tracking and difficulty mode
//!
//! The controller turns a raw bpm source into a smoothed value and a discrete
//! [`Mode`]. Two sources exist: a live value pushed by an external sensor, or
//! (when none has arrived) an autonomous drift that occasionally spikes.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::clamp;
use crate::consts::*;

/// Seconds between drift target redraws
const DRIFT_INTERVAL: f32 = 1.0;
/// Probability that a redraw is a stress spike
const SPIKE_CHANCE: f32 = 0.12;
const SPIKE_RANGE: (f32, f32) = (12.0, 30.0);
const WANDER_RANGE: (f32, f32) = (-6.0, 12.0);
/// Smoothing rates (per second)
const DRIFT_RATE: f32 = 2.0;
const LIVE_RATE: f32 = 8.0;
/// Manual +/- nudge in bpm per second
const NUDGE_RATE: f32 = 60.0;
/// Smoothed bpm is kept inside this range
pub const BPM_MIN: f32 = 45.0;
pub const BPM_MAX: f32 = 190.0;

/// Discrete difficulty state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Normal,
    Stress,
    Panic,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Stress => "stress",
            Mode::Panic => "panic",
        }
    }

    /// Horizontal speed multiplier imposed by the mode
    pub fn speed_mult(&self) -> f32 {
        match self {
            Mode::Stress => STRESS_SPEED_MULT,
            Mode::Normal | Mode::Panic => 1.0,
        }
    }

    /// Jump velocity multiplier imposed by the mode
    pub fn jump_mult(&self) -> f32 {
        match self {
            Mode::Stress => STRESS_JUMP_MULT,
            Mode::Normal | Mode::Panic => 1.0,
        }
    }
}

/// Direction of a manual bpm tweak for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nudge {
    #[default]
    None,
    Up,
    Down,
}

impl Nudge {
    /// Nudge from the up/down key states (both held cancel out)
    pub fn from_keys(up: bool, down: bool) -> Self {
        match (up, down) {
            (true, false) => Nudge::Up,
            (false, true) => Nudge::Down,
            _ => Nudge::None,
        }
    }

    fn sign(self) -> f32 {
        match self {
            Nudge::None => 0.0,
            Nudge::Up => 1.0,
            Nudge::Down => -1.0,
        }
    }
}

/// Smoothed heart rate and mode derivation
#[derive(Debug, Clone)]
pub struct HeartRateController {
    baseline: i32,
    current: f32,
    target: f32,
    drift_timer: f32,
    mode_override: Option<Mode>,
    live_bpm: Option<i32>,
    rng: Pcg32,
}

impl HeartRateController {
    pub fn new(baseline: i32, seed: u64) -> Self {
        Self {
            baseline,
            current: baseline as f32,
            target: baseline as f32,
            drift_timer: 0.0,
            mode_override: None,
            live_bpm: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    /// Smoothed bpm (unrounded)
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Latest externally supplied bpm, if any
    pub fn live_bpm(&self) -> Option<i32> {
        self.live_bpm
    }

    /// Replace the externally supplied value. `None` returns to autonomous drift.
    pub fn set_live_bpm(&mut self, bpm: Option<i32>) {
        self.live_bpm = bpm;
    }

    pub fn mode_override(&self) -> Option<Mode> {
        self.mode_override
    }

    /// Force a mode (`None` = derive it from bpm again)
    pub fn set_mode_override(&mut self, mode: Option<Mode>) {
        if mode != self.mode_override {
            log::debug!("Mode override: {:?} -> {:?}", self.mode_override, mode);
        }
        self.mode_override = mode;
    }

    /// Advance the smoothed value by `dt` seconds
    pub fn update(&mut self, dt: f32, nudge: Nudge) {
        self.current += nudge.sign() * NUDGE_RATE * dt;

        let rate = match self.live_bpm {
            Some(bpm) => {
                self.target = bpm as f32;
                LIVE_RATE
            }
            None => {
                self.drift_timer += dt;
                if self.drift_timer > DRIFT_INTERVAL {
                    self.drift_timer = 0.0;
                    self.target = self.redraw_target();
                }
                DRIFT_RATE
            }
        };

        self.current = crate::smooth_toward(self.current, self.target, rate, dt);
        self.current = clamp(self.current, BPM_MIN, BPM_MAX);
    }

    fn redraw_target(&mut self) -> f32 {
        let (lo, hi) = if self.rng.random::<f32>() < SPIKE_CHANCE {
            SPIKE_RANGE
        } else {
            WANDER_RANGE
        };
        self.baseline as f32 + self.rng.random_range(lo..hi)
    }

    /// Rounded bpm, the value every threshold is applied to
    pub fn bpm(&self) -> i32 {
        self.current.round() as i32
    }

    /// Current difficulty mode
    pub fn mode(&self) -> Mode {
        if let Some(forced) = self.mode_override {
            return forced;
        }
        let bpm = self.bpm();
        if bpm > self.baseline + PANIC_DELTA {
            Mode::Panic
        } else if bpm >= self.baseline + STRESS_DELTA {
            Mode::Stress
        } else {
            Mode::Normal
        }
    }
}
