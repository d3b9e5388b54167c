//! Collision resolution between the player and a level
//!
//! The tricky part of the game: move the player one axis at a time against
//! the platforms, using the box from before the vertical move to catch edge
//! crossings a single overlap test would tunnel through, then run every
//! hazard against the resolved box.

use super::level::Level;
use super::player::Player;
use super::rect::Rect;
use super::trap::TrapKind;
use crate::clamp;
use crate::consts::*;

/// Move `player` through `level` for `dt` seconds and apply trap contact.
///
/// Returns true if the player died this tick. All hazards are instant death;
/// the caller owns respawning.
pub fn resolve_physics(player: &mut Player, level: &mut Level, dt: f32) -> bool {
    let mut rect = move_x(player, level, dt);
    rect = move_y(player, level, dt, rect);

    let mut died = fell_out(player, &rect);

    // Invulnerable players neither die nor set off traps
    if player.is_invulnerable() {
        return false;
    }

    died |= apply_traps(player, level, dt, &mut rect);
    died |= hit_by_projectile(level, &rect);
    died
}

fn max_player_x(level: &Level) -> f32 {
    (level.world_w - PLAYER_SIZE) as f32
}

/// Horizontal pass: any overlap stops the player flush against the platform
fn move_x(player: &mut Player, level: &Level, dt: f32) -> Rect {
    player.pos.x = clamp(player.pos.x + player.vel.x * dt, 0.0, max_player_x(level));
    let mut rect = player.rect();

    for platform in level.solid_platforms() {
        if !rect.overlaps(&platform) {
            continue;
        }
        if player.vel.x > 0.0 {
            rect.set_right(platform.left());
        } else if player.vel.x < 0.0 {
            rect.x = platform.right();
        } else {
            continue;
        }
        player.pos.x = rect.x as f32;
        player.vel.x = 0.0;
    }
    rect
}

/// Vertical pass with swept landing / head-bump tests against `prev`
fn move_y(player: &mut Player, level: &Level, dt: f32, prev: Rect) -> Rect {
    player.pos.y += player.vel.y * dt;
    let mut rect = player.rect();
    player.on_ground = false;
    let flipped = player.is_gravity_flipped();

    for platform in level.solid_platforms() {
        if !rect.overlaps_x(&platform) {
            continue;
        }

        let crossed_top = player.vel.y >= 0.0
            && prev.bottom() <= platform.top()
            && rect.bottom() >= platform.top();
        let crossed_bottom = player.vel.y <= 0.0
            && prev.top() >= platform.bottom()
            && rect.top() <= platform.bottom();

        // With gravity flipped the underside of a platform is the floor
        let (land, bump) = if flipped {
            (crossed_bottom, crossed_top)
        } else {
            (crossed_top, crossed_bottom)
        };

        if land {
            snap_to(&mut rect, &platform, !flipped);
            player.on_ground = true;
        } else if bump {
            snap_to(&mut rect, &platform, flipped);
        } else {
            continue;
        }
        player.pos.y = rect.y as f32;
        player.vel.y = 0.0;
    }
    rect
}

/// Place `rect` on top of `platform` (`on_top`) or against its underside
fn snap_to(rect: &mut Rect, platform: &Rect, on_top: bool) {
    if on_top {
        rect.set_bottom(platform.top());
    } else {
        rect.y = platform.bottom();
    }
}

fn fell_out(player: &Player, rect: &Rect) -> bool {
    if player.is_gravity_flipped() {
        rect.bottom() < -FALL_OUT_MARGIN
    } else {
        rect.top() > SCREEN_HEIGHT + FALL_OUT_MARGIN
    }
}

/// Whether the player is standing on `floor`: overlapping it, or resting on
/// the surface gravity pulls them against
fn stands_on(player: &Player, rect: &Rect, floor: &Rect) -> bool {
    if rect.overlaps(floor) {
        return true;
    }
    let contact = if player.is_gravity_flipped() {
        rect.top() == floor.bottom()
    } else {
        rect.bottom() == floor.top()
    };
    contact && rect.overlaps_x(floor)
}

/// Evaluate every trap against the player's box, in trap order
fn apply_traps(player: &mut Player, level: &mut Level, dt: f32, rect: &mut Rect) -> bool {
    let mut died = false;
    let max_x = max_player_x(level);

    for i in 0..level.traps.len() {
        let kind = level.traps[i].kind;
        let trap_rect = level.traps[i].rect();
        let hit = rect.overlaps(&trap_rect);

        match kind {
            TrapKind::Spikes => died |= hit,
            TrapKind::Laser | TrapKind::HiddenSpikes | TrapKind::DelayedSpikes => {
                died |= hit && level.traps[i].active;
            }
            TrapKind::TriggerHiddenSpikes => {
                // Re-arms every tick the player stays inside
                if hit {
                    level
                        .traps
                        .iter_mut()
                        .filter(|t| t.kind == TrapKind::HiddenSpikes)
                        .for_each(|t| t.arm_hidden_spikes());
                }
            }
            TrapKind::CollapsingFloor => {
                let floor = &mut level.traps[i];
                if floor.active && player.on_ground && stands_on(player, rect, &trap_rect) {
                    floor.triggered = true;
                }
            }
            TrapKind::FallingBlock => {
                let block = &mut level.traps[i];
                let cx = rect.center_x();
                let below = rect.top() > trap_rect.bottom()
                    && rect.top() - trap_rect.bottom() < FALLING_BLOCK_REACH;
                if block.active && cx > trap_rect.left() && cx < trap_rect.right() && below {
                    block.triggered = true;
                }
                died |= block.active && hit;
            }
            TrapKind::ShiftingWall { dir, .. } => {
                if hit {
                    let push = dir as f32 * WALL_PUSH_SPEED * dt;
                    player.pos.x = clamp(player.pos.x + push, 0.0, max_x);
                    rect.x = player.pos.x as i32;
                }
            }
            TrapKind::TriggerRisingPit => {
                if hit {
                    for trap in &mut level.traps {
                        trap.arm_rising_pit();
                    }
                }
            }
            TrapKind::RisingPit { phase } => died |= hit && phase.is_lethal(),
            TrapKind::ArmDelayedSpikes => {
                if hit {
                    level
                        .traps
                        .iter_mut()
                        .filter(|t| t.kind == TrapKind::DelayedSpikes)
                        .for_each(|t| t.arm_delayed_spikes());
                }
            }
            TrapKind::GravityFlipZone => {
                if hit && player.flip_gravity() {
                    log::debug!("Gravity flipped at x={}", rect.x);
                }
            }
            TrapKind::InputSwapZone => {
                if hit {
                    player.swap_controls();
                }
            }
            // Spawning is driven by the level's own update
            TrapKind::SpawnHoming => {}
        }
    }
    died
}

fn hit_by_projectile(level: &mut Level, rect: &Rect) -> bool {
    let mut died = false;
    for projectile in level.projectiles.iter_mut().filter(|p| p.active) {
        if rect.overlaps(&projectile.hit_box()) {
            projectile.active = false;
            died = true;
        }
    }
    died
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::heart_rate::Mode;
    use crate::sim::player::PlayerInput;
    use crate::sim::trap::{PitPhase, Projectile, Trap};
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;
    const GROUND: Rect = Rect::new(0, 600, 2000, 120);

    fn empty_level() -> Level {
        Level::new(1, DEFAULT_WORLD_WIDTH, Vec2::new(100.0, 560.0), 3)
    }

    fn level() -> Level {
        let mut level = empty_level();
        level.add_platform(GROUND);
        level
    }

    fn standing_at(x: f32) -> Player {
        let mut p = Player::new(Vec2::new(x, 560.0));
        p.on_ground = true;
        p
    }

    fn floating_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y))
    }

    /// One simulation step in game order
    fn step(player: &mut Player, level: &mut Level, input: &PlayerInput) -> bool {
        level.update(DT, &player.rect());
        player.update(DT, input, Mode::Normal);
        resolve_physics(player, level, DT)
    }

    #[test]
    fn test_falls_and_lands() {
        let mut level = level();
        let mut p = floating_at(100.0, 500.0);
        for _ in 0..60 {
            assert!(!step(&mut p, &mut level, &PlayerInput::default()));
        }
        assert!(p.on_ground);
        assert_eq!(p.pos.y, 560.0);
        assert_eq!(p.vel.y, 0.0);

        step(&mut p, &mut level, &PlayerInput::default());
        assert!(p.on_ground);
        assert_eq!(p.pos.y, 560.0);
    }

    #[test]
    fn test_fast_fall_does_not_tunnel() {
        let mut level = empty_level();
        level.add_platform(Rect::new(500, 400, 200, 10));
        let mut p = floating_at(550.0, 350.0);
        p.vel.y = 3000.0;

        // one step carries the box entirely past the platform
        assert!(!resolve_physics(&mut p, &mut level, 1.0 / 30.0));
        assert!(p.on_ground);
        assert_eq!(p.rect().bottom(), 400);
    }

    #[test]
    fn test_head_bump() {
        let mut level = empty_level();
        level.add_platform(Rect::new(0, 300, 2000, 20));
        let mut p = floating_at(100.0, 330.0);
        p.vel.y = -600.0;

        resolve_physics(&mut p, &mut level, DT);
        assert_eq!(p.pos.y, 320.0);
        assert_eq!(p.vel.y, 0.0);
        assert!(!p.on_ground);
    }

    #[test]
    fn test_wall_stops_horizontal_motion() {
        let mut level = level();
        level.add_platform(Rect::new(300, 400, 50, 200));

        let mut p = standing_at(240.0);
        p.vel.x = 380.0;
        resolve_physics(&mut p, &mut level, 0.1);
        assert_eq!(p.rect().right(), 300);
        assert_eq!(p.vel.x, 0.0);

        let mut p = standing_at(360.0);
        p.vel.x = -380.0;
        resolve_physics(&mut p, &mut level, 0.1);
        assert_eq!(p.pos.x, 350.0);
        assert_eq!(p.vel.x, 0.0);
    }

    #[test]
    fn test_clamped_to_world() {
        let mut level = level();
        let mut p = standing_at(5.0);
        p.vel.x = -380.0;
        resolve_physics(&mut p, &mut level, 0.1);
        assert_eq!(p.pos.x, 0.0);

        let far = (DEFAULT_WORLD_WIDTH - PLAYER_SIZE) as f32;
        let mut p = standing_at(far - 5.0);
        p.vel.x = 380.0;
        resolve_physics(&mut p, &mut level, 0.1);
        assert_eq!(p.pos.x, far);
    }

    #[test]
    fn test_flipped_player_lands_on_underside() {
        let mut level = empty_level();
        level.add_platform(Rect::new(0, 200, 2000, 20));
        let mut p = floating_at(100.0, 240.0);
        p.gravity_flip_timer = 1.0;
        p.vel.y = -300.0;

        for _ in 0..10 {
            resolve_physics(&mut p, &mut level, DT);
        }
        assert!(p.on_ground);
        assert_eq!(p.pos.y, 220.0);
        assert_eq!(p.vel.y, 0.0);
    }

    #[test]
    fn test_fall_out_death_on_exact_tick() {
        let mut level = empty_level();
        let mut p = floating_at(100.0, 925.0);
        p.vel.y = 600.0;
        assert!(!resolve_physics(&mut p, &mut level, DT));
        assert_eq!(p.rect().top(), 935);
        assert!(resolve_physics(&mut p, &mut level, DT));

        let mut p = floating_at(100.0, -245.0);
        p.gravity_flip_timer = 1.0;
        p.vel.y = -600.0;
        assert!(!resolve_physics(&mut p, &mut level, DT));
        assert!(resolve_physics(&mut p, &mut level, DT));
    }

    #[test]
    fn test_respawn_grace_window() {
        let mut level = level();
        level.add_trap(Trap::new(TrapKind::Spikes, Rect::new(0, 500, 2000, 100)));
        let mut p = standing_at(100.0);
        p.respawn();

        let mut died_at = None;
        for tick in 1..=120 {
            let died = step(&mut p, &mut level, &PlayerInput::default());
            if p.is_invulnerable() {
                assert!(!died, "died during grace at tick {tick}");
            } else {
                assert!(died);
                died_at = Some(tick as f32 * DT);
                break;
            }
        }
        let t = died_at.expect("grace never ran out");
        assert!(t >= RESPAWN_I_FRAMES - 1e-3, "died after {t}s");
        assert!(t <= RESPAWN_I_FRAMES + 2.0 * DT);
    }

    #[test]
    fn test_grace_suppresses_triggers() {
        let mut level = level();
        let floor = level.add_trap(Trap::new(TrapKind::CollapsingFloor, Rect::new(80, 600, 200, 18)));
        let mut p = standing_at(100.0);
        p.i_frames = 0.5;
        resolve_physics(&mut p, &mut level, DT);
        assert!(!level.traps[floor].triggered);
    }

    #[test]
    fn test_collapsing_floor_drops_player_and_recovers() {
        let mut level = empty_level();
        level.add_platform(Rect::new(0, 600, 300, 20));
        let floor = level.add_trap(Trap::new(TrapKind::CollapsingFloor, Rect::new(300, 600, 200, 18)));
        let mut p = standing_at(350.0);
        let idle = PlayerInput::default();

        step(&mut p, &mut level, &idle);
        assert!(p.on_ground);
        assert!(level.traps[floor].triggered);
        assert!(level.traps[floor].active);

        // next level update drops it
        step(&mut p, &mut level, &idle);
        assert!(!level.traps[floor].active);

        for _ in 0..30 {
            step(&mut p, &mut level, &idle);
        }
        assert!(p.pos.y > 600.0, "player should fall through, y = {}", p.pos.y);

        let away = Rect::new(1500, 100, 40, 40);
        for _ in 0..90 {
            level.update(DT, &away);
        }
        assert!(!level.traps[floor].active);
        for _ in 0..10 {
            level.update(DT, &away);
        }
        assert!(level.traps[floor].active);
        assert!(!level.traps[floor].triggered);
    }

    #[test]
    fn test_corner_contact_does_not_collapse_floor() {
        let mut level = level();
        let floor = level.add_trap(Trap::new(TrapKind::CollapsingFloor, Rect::new(300, 560, 200, 40)));
        // flush against the floor's left side, standing on the ground
        let mut p = standing_at(260.0);
        resolve_physics(&mut p, &mut level, DT);
        assert!(p.on_ground);
        assert!(!level.traps[floor].triggered);
    }

    #[test]
    fn test_inactive_hazards_are_harmless() {
        let mut level = level();
        let laser = level.add_trap(Trap::new(TrapKind::Laser, Rect::new(90, 0, 18, 600)));
        let hidden = level.add_trap(Trap::new(TrapKind::HiddenSpikes, Rect::new(80, 570, 80, 30)));
        level.traps[laser].active = false;
        let mut p = standing_at(100.0);

        assert!(!resolve_physics(&mut p, &mut level, DT));
        level.traps[hidden].active = true;
        assert!(resolve_physics(&mut p, &mut level, DT));
    }

    #[test]
    fn test_hidden_spikes_trigger_rearms() {
        let mut level = level();
        let spikes = level.add_trap(Trap::new(TrapKind::HiddenSpikes, Rect::new(600, 570, 100, 30)));
        level.add_trap(Trap::new(TrapKind::TriggerHiddenSpikes, Rect::new(300, 400, 100, 200)));

        let mut p = standing_at(320.0);
        assert!(!resolve_physics(&mut p, &mut level, DT));
        assert!(level.traps[spikes].active);

        level.update(1.5, &p.rect());
        assert!(level.traps[spikes].cooldown < 1.0);
        resolve_physics(&mut p, &mut level, DT);
        assert_eq!(level.traps[spikes].cooldown, HIDDEN_SPIKES_DURATION);

        let mut p = standing_at(620.0);
        assert!(resolve_physics(&mut p, &mut level, DT));
    }

    #[test]
    fn test_rising_pit_trigger_and_lethality() {
        let mut level = empty_level();
        let pit = level.add_trap(Trap::new(
            TrapKind::RisingPit { phase: PitPhase::Resting },
            Rect::new(800, 642, 200, 78),
        ));
        level.add_trap(Trap::new(TrapKind::TriggerRisingPit, Rect::new(500, 400, 100, 200)));

        let mut over_pit = floating_at(850.0, 620.0);
        assert!(!resolve_physics(&mut over_pit, &mut level, DT), "resting pit is safe");

        let mut p = floating_at(520.0, 500.0);
        resolve_physics(&mut p, &mut level, DT);
        assert_eq!(level.traps[pit].pit_phase(), Some(PitPhase::Rising));

        let mut over_pit = floating_at(850.0, 620.0);
        assert!(resolve_physics(&mut over_pit, &mut level, DT));
    }

    #[test]
    fn test_delayed_spikes_arm_once() {
        let mut level = level();
        let spikes = level.add_trap(Trap::new(TrapKind::DelayedSpikes, Rect::new(400, 570, 100, 30)));
        level.add_trap(Trap::new(TrapKind::ArmDelayedSpikes, Rect::new(200, 400, 100, 200)));

        let mut p = standing_at(220.0);
        resolve_physics(&mut p, &mut level, DT);
        assert!(level.traps[spikes].active);
        assert!(level.traps[spikes].used);

        level.traps[spikes].active = false;
        resolve_physics(&mut p, &mut level, DT);
        assert!(!level.traps[spikes].active);
    }

    #[test]
    fn test_falling_block_arms_below_and_kills_on_contact() {
        let mut level = empty_level();
        let block = level.add_trap(Trap::new(TrapKind::FallingBlock, Rect::new(500, 200, 70, 70)));

        // 290 px below: out of reach
        let mut p = floating_at(515.0, 560.0);
        resolve_physics(&mut p, &mut level, 0.0);
        assert!(!level.traps[block].triggered);

        let mut p = floating_at(515.0, 400.0);
        assert!(!resolve_physics(&mut p, &mut level, 0.0));
        assert!(level.traps[block].triggered);

        let mut p = floating_at(515.0, 250.0);
        assert!(resolve_physics(&mut p, &mut level, 0.0));
    }

    #[test]
    fn test_shifting_wall_pushes_without_killing() {
        let w = DEFAULT_WORLD_WIDTH;
        let mut level = level();
        level.add_trap(Trap::new(
            TrapKind::ShiftingWall { dir: 1, speed: 260.0 },
            Rect::new(w - 1300, 435, 34, 165),
        ));
        let start = (w - 1290) as f32;
        let mut p = standing_at(start);

        assert!(!resolve_physics(&mut p, &mut level, DT));
        assert!((p.pos.x - (start + WALL_PUSH_SPEED * DT)).abs() < 1e-3);
    }

    #[test]
    fn test_gravity_flip_zone_does_not_extend() {
        let mut level = level();
        level.add_trap(Trap::new(TrapKind::GravityFlipZone, Rect::new(0, 0, 400, 600)));
        let mut p = standing_at(100.0);

        resolve_physics(&mut p, &mut level, DT);
        assert_eq!(p.gravity_flip_timer, GRAVITY_FLIP_DURATION);

        p.gravity_flip_timer = 1.0;
        resolve_physics(&mut p, &mut level, DT);
        assert_eq!(p.gravity_flip_timer, 1.0);
    }

    #[test]
    fn test_input_swap_rearms_each_effect_independently() {
        let mut level = level();
        level.add_trap(Trap::new(TrapKind::InputSwapZone, Rect::new(0, 0, 400, 600)));
        let mut p = standing_at(100.0);

        resolve_physics(&mut p, &mut level, DT);
        assert_eq!(p.input_swap_timer, INPUT_SWAP_DURATION);
        assert_eq!(p.jump_swap_timer, JUMP_SWAP_DURATION);

        p.input_swap_timer = 1.0;
        p.jump_swap_timer = 0.0;
        resolve_physics(&mut p, &mut level, DT);
        assert_eq!(p.input_swap_timer, 1.0);
        assert_eq!(p.jump_swap_timer, JUMP_SWAP_DURATION);
    }

    #[test]
    fn test_projectile_hit_consumes_projectile() {
        let mut level = level();
        let mut p = standing_at(100.0);
        level
            .projectiles
            .push(Projectile::homing(p.rect().center(), Vec2::ZERO));

        p.i_frames = 0.3;
        assert!(!resolve_physics(&mut p, &mut level, DT));
        assert!(level.projectiles[0].active);

        p.i_frames = 0.0;
        assert!(resolve_physics(&mut p, &mut level, DT));
        assert!(!level.projectiles[0].active);
    }
}
