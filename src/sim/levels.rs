//! Level layouts: the serializable description of a stage
//!
//! A [`LevelLayout`] is plain data. [`Level::from_layout`] validates it and
//! builds the runtime [`Level`]. The three built-in stages live here too.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::level::{Door, Level};
use super::rect::Rect;
use super::trap::{PitPhase, Trap, TrapKind};
use crate::consts::*;
use crate::error::LevelError;

/// Number of built-in stages
pub const BUILTIN_STAGES: u32 = 3;

const H: i32 = SCREEN_HEIGHT;
/// Default platform thickness
const SLAB: i32 = 22;
const DOOR_W: i32 = 64;
const DOOR_H: i32 = 98;

/// One trap in a layout: `{"kind": "laser", "rect": {...}}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapSpec {
    pub rect: Rect,
    #[serde(flatten)]
    pub kind: TrapKind,
}

/// One door in a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorSpec {
    pub rect: Rect,
    #[serde(default)]
    pub fake: bool,
    #[serde(default)]
    pub moves: bool,
    #[serde(default)]
    pub spiky: bool,
}

impl DoorSpec {
    fn to_door(self) -> Door {
        let mut door = if self.fake {
            Door::fake(self.rect)
        } else {
            Door::exit(self.rect)
        };
        if self.moves {
            door = door.moving();
        }
        if self.spiky {
            door = door.spiky();
        }
        door
    }
}

/// Serializable stage description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub world_w: i32,
    /// Player spawn (top-left corner)
    pub spawn: Vec2,
    pub platforms: Vec<Rect>,
    #[serde(default)]
    pub traps: Vec<TrapSpec>,
    pub doors: Vec<DoorSpec>,
    #[serde(default)]
    pub zoom_zone: Option<Rect>,
}

impl LevelLayout {
    /// Built-in stage `index` (1-based)
    pub fn builtin(index: u32) -> Result<Self, LevelError> {
        let w = DEFAULT_WORLD_WIDTH;
        match index {
            1 => Ok(stage_intro(w)),
            2 => Ok(stage_vertical(w)),
            3 => Ok(stage_chaos(w)),
            _ => Err(LevelError::UnknownStage {
                index,
                count: BUILTIN_STAGES,
            }),
        }
    }

    /// Every built-in stage, in play order
    pub fn builtins() -> Vec<Self> {
        let w = DEFAULT_WORLD_WIDTH;
        vec![stage_intro(w), stage_vertical(w), stage_chaos(w)]
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a layout from a JSON file
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check the layout can be played
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.world_w < SCREEN_WIDTH {
            return Err(LevelError::WorldTooNarrow {
                world_w: self.world_w,
                min: SCREEN_WIDTH,
            });
        }

        let rects = self
            .platforms
            .iter()
            .map(|r| ("platform", r))
            .chain(self.traps.iter().map(|t| ("trap", &t.rect)))
            .chain(self.doors.iter().map(|d| ("door", &d.rect)))
            .chain(self.zoom_zone.iter().map(|r| ("zoom zone", r)));
        for (what, rect) in rects {
            if rect.is_empty() {
                return Err(LevelError::DegenerateRect { what, rect: *rect });
            }
        }

        let exits = self.doors.iter().filter(|d| !d.fake).count();
        if exits != 1 {
            return Err(LevelError::ExitDoorCount { found: exits });
        }
        Ok(())
    }

    /// Empty stage with the shared start pad and spawn
    fn start(world_w: i32) -> Self {
        Self {
            world_w,
            spawn: Vec2::new(80.0, (H - 160) as f32),
            platforms: vec![Rect::new(0, H - 78, 520, 78)],
            traps: Vec::new(),
            doors: Vec::new(),
            zoom_zone: None,
        }
    }

    fn platform(&mut self, x: i32, y: i32, w: i32) {
        self.platforms.push(Rect::new(x, y, w, SLAB));
    }

    fn trap(&mut self, kind: TrapKind, rect: Rect) {
        self.traps.push(TrapSpec { rect, kind });
    }

    /// The two end pads at height `y`, a fake door and the exit behind it
    fn finish(&mut self, y: i32, decoy: DoorSpec) {
        let w = self.world_w;
        self.platform(w - 520, y, 220);
        self.platform(w - 260, y, 200);
        self.doors.push(decoy);
        self.doors.push(DoorSpec {
            rect: Rect::new(w - 120, H - 170, DOOR_W, DOOR_H),
            fake: false,
            moves: false,
            spiky: false,
        });
    }
}

fn decoy(world_w: i32) -> DoorSpec {
    DoorSpec {
        rect: Rect::new(world_w - 230, H - 170, DOOR_W, DOOR_H),
        fake: true,
        moves: false,
        spiky: false,
    }
}

fn shifting_wall(speed: f32) -> TrapKind {
    TrapKind::ShiftingWall { dir: -1, speed }
}

fn rising_pit() -> TrapKind {
    TrapKind::RisingPit {
        phase: PitPhase::Resting,
    }
}

/// Stage 1: intro / troll
fn stage_intro(w: i32) -> LevelLayout {
    use TrapKind::*;
    let mut l = LevelLayout::start(w);

    // short hop onto a floor that dumps into spikes
    l.platform(560, H - 170, 160);
    l.trap(CollapsingFloor, Rect::new(760, H - 190, 170, 18));
    l.trap(Spikes, Rect::new(760, H - 110, 170, 32));

    // landing arms spikes further on
    l.platform(980, H - 250, 170);
    l.trap(TriggerHiddenSpikes, Rect::new(980, H - 320, 120, 160));
    l.trap(HiddenSpikes, Rect::new(1140, H - 110, 190, 32));
    l.platform(1180, H - 220, 160);

    l.platform(1500, H - 260, 180);
    l.trap(FallingBlock, Rect::new(1540, 210, 70, 70));

    l.platform(1780, H - 330, 150);
    l.trap(Laser, Rect::new(1960, 0, 18, H));
    l.platform(2050, H - 270, 170);

    l.platform(2300, H - 210, 220);
    l.trap(Spikes, Rect::new(2640, H - 110, 240, 32));
    l.platform(2920, H - 290, 180);

    l.trap(InputSwapZone, Rect::new(3120, H - 520, 520, 360));
    l.platform(3240, H - 240, 220);

    l.trap(CollapsingFloor, Rect::new(3560, H - 220, 180, 18));
    l.platform(3810, H - 300, 160);
    l.trap(Laser, Rect::new(4000, 0, 18, H));
    l.platform(4150, H - 250, 180);

    l.trap(GravityFlipZone, Rect::new(4440, H - 520, 520, 360));
    l.platform(4480, H - 260, 190);
    l.trap(FallingBlock, Rect::new(4700, 160, 70, 70));

    // walls patrol a fixed band near the end of the world
    l.trap(shifting_wall(260.0), Rect::new(w - 1300, H - 245, 34, 165));

    l.finish(H - 210, DoorSpec {
        moves: true,
        ..decoy(w)
    });
    l.zoom_zone = Some(Rect::new(w - 900, H - 520, 760, 420));
    l
}

/// Stage 2: vertical climbs, lasers and crushers
fn stage_vertical(w: i32) -> LevelLayout {
    use TrapKind::*;
    let mut l = LevelLayout::start(w);

    l.platform(520, H - 190, 160);
    l.platform(760, H - 300, 150);
    l.trap(Laser, Rect::new(980, 0, 18, H));
    l.platform(1080, H - 420, 150);
    l.platform(1320, H - 520, 150);

    // bait platform over a crusher
    l.platform(1600, H - 220, 220);
    l.trap(rising_pit(), Rect::new(1600, H - 78, 220, 78));
    l.trap(TriggerRisingPit, Rect::new(1440, H - 270, 140, 150));

    l.platform(1980, H - 470, 180);
    l.trap(CollapsingFloor, Rect::new(1980, H - 250, 180, 18));
    l.trap(Spikes, Rect::new(1980, H - 110, 200, 32));

    l.platform(2300, H - 360, 160);
    l.trap(Laser, Rect::new(2480, 0, 18, H));
    l.platform(2620, H - 480, 150);
    l.trap(FallingBlock, Rect::new(2660, 170, 70, 70));

    l.platform(2920, H - 300, 220);
    l.trap(SpawnHoming, Rect::new(3000, H - 560, 520, 420));
    l.platform(3520, H - 420, 160);
    l.platform(3780, H - 320, 180);

    l.trap(InputSwapZone, Rect::new(4040, H - 520, 520, 360));
    l.trap(Laser, Rect::new(4580, 0, 18, H));

    l.finish(H - 240, DoorSpec {
        spiky: true,
        ..decoy(w)
    });
    l.zoom_zone = Some(Rect::new(w - 950, H - 520, 820, 420));
    l
}

/// Stage 3: chaos, mixed mechanics back to back
fn stage_chaos(w: i32) -> LevelLayout {
    use TrapKind::*;
    let mut l = LevelLayout::start(w);

    l.platform(520, H - 260, 150);
    l.trap(Laser, Rect::new(720, 0, 18, H));
    l.trap(CollapsingFloor, Rect::new(920, H - 260, 160, 18));
    l.trap(Spikes, Rect::new(920, H - 110, 180, 32));

    l.platform(1160, H - 360, 150);
    l.trap(TriggerHiddenSpikes, Rect::new(1160, H - 430, 140, 160));
    l.trap(HiddenSpikes, Rect::new(1340, H - 110, 200, 32));
    l.trap(FallingBlock, Rect::new(1380, 150, 70, 70));
    l.platform(1460, H - 280, 150);

    l.trap(GravityFlipZone, Rect::new(1700, H - 560, 520, 420));
    l.trap(Laser, Rect::new(2240, 0, 18, H));
    l.platform(2320, H - 420, 160);
    l.platform(2560, H - 300, 160);

    l.platform(2820, H - 220, 220);
    l.trap(Spikes, Rect::new(3160, H - 110, 260, 32));
    l.trap(SpawnHoming, Rect::new(3120, H - 560, 640, 420));

    l.trap(InputSwapZone, Rect::new(3680, H - 520, 520, 360));
    l.platform(3840, H - 350, 120);
    l.platform(4040, H - 460, 120);

    l.trap(Laser, Rect::new(4300, 0, 18, H));
    l.trap(Laser, Rect::new(4460, 0, 18, H));
    l.trap(CollapsingFloor, Rect::new(4660, H - 260, 170, 18));
    l.platform(4880, H - 360, 150);
    l.trap(Spikes, Rect::new(5060, H - 110, 220, 32));

    l.trap(shifting_wall(300.0), Rect::new(w - 1300, H - 245, 34, 165));

    l.finish(H - 220, DoorSpec {
        moves: true,
        ..decoy(w)
    });
    l.zoom_zone = Some(Rect::new(w - 1050, H - 560, 920, 460));
    l
}

impl Level {
    /// Validate `layout` and build stage `index` from it
    pub fn from_layout(index: u32, layout: &LevelLayout, seed: u64) -> Result<Self, LevelError> {
        layout.validate()?;

        let mut level = Level::new(index, layout.world_w, layout.spawn, seed);
        for &rect in &layout.platforms {
            level.add_platform(rect);
        }
        for spec in &layout.traps {
            level.add_trap(Trap::new(spec.kind, spec.rect));
        }
        for spec in &layout.doors {
            level.add_door(spec.to_door());
        }
        level.zoom_zone = layout.zoom_zone;

        log::debug!(
            "Built stage {index}: {} platforms, {} traps, {} doors",
            level.platforms.len(),
            level.traps.len(),
            level.doors.len()
        );
        Ok(level)
    }
}
