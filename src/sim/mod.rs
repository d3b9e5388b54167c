//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (list order of platforms, traps and doors)
//! - No rendering or platform dependencies

pub mod collision;
pub mod heart_rate;
pub mod level;
pub mod levels;
pub mod player;
pub mod rect;
pub mod state;
pub mod tick;
pub mod trap;

pub use collision::resolve_physics;
pub use heart_rate::{HeartRateController, Mode, Nudge};
pub use level::{Door, Level, Platform};
pub use levels::{BUILTIN_STAGES, DoorSpec, LevelLayout, TrapSpec};
pub use player::{Player, PlayerInput};
pub use rect::Rect;
pub use state::{GameEvent, GameState};
pub use tick::{ForceMode, TickInput, tick};
pub use trap::{PitPhase, Projectile, Trap, TrapKind};
