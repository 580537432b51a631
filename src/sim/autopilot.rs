//! Scripted input source for demo and headless runs

use glam::{Vec2, Vec3};

use super::state::Encounter;
use super::tick::TickInput;
use super::weapon::WeaponSlot;

/// Keep at least this far from the nearest enemy
const BACK_OFF_DISTANCE: f32 = 6.0;
/// Close in when the nearest enemy is further than this
const APPROACH_DISTANCE: f32 = 15.0;
/// Switch to the blade inside this range
const MELEE_RANGE: f32 = 3.0;
/// Switch to the beam when this many enemies are alive
const CROWD_SIZE: usize = 6;
/// Only use skills on targets this close
const SKILL_RANGE: f32 = 12.0;

/// Build this tick's input: aim at the nearest enemy, keep distance,
/// fire continuously, use skills when ready and take the first upgrade offered.
pub fn drive(enc: &Encounter, base: &TickInput) -> TickInput {
    let mut input = TickInput {
        autopilot: true,
        pause: base.pause,
        ..Default::default()
    };

    if enc.director.prompt().is_some() {
        input.pick_upgrade = Some(0);
        return input;
    }

    let me = enc.player.position;
    let nearest = enc
        .roster
        .alive()
        .map(|e| (e, e.position.distance_squared(me)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let Some((target, dist_sq)) = nearest else {
        return input;
    };
    let dist = dist_sq.sqrt();

    input.aim_point = Some(target.position + Vec3::Y);
    input.fire = true;

    let wanted = if dist < MELEE_RANGE {
        WeaponSlot::Melee
    } else if enc.roster.alive_count() >= CROWD_SIZE {
        WeaponSlot::Beam
    } else {
        WeaponSlot::Projectile
    };
    if enc.loadout.current_slot() != Some(wanted) && enc.loadout.slot(wanted).is_some() {
        input.select_weapon = Some(match wanted {
            WeaponSlot::Melee => 1,
            WeaponSlot::Projectile => 2,
            WeaponSlot::Beam => 3,
        });
    }

    input.skill = dist < SKILL_RANGE
        && enc
            .loadout
            .current()
            .is_some_and(|w| w.can_use_skill());

    // Forward is toward the target once the aim point is applied
    input.move_axis = if dist < BACK_OFF_DISTANCE {
        Vec2::new(0.0, -1.0)
    } else if dist > APPROACH_DISTANCE {
        Vec2::new(0.0, 1.0)
    } else {
        Vec2::new(1.0, 0.0)
    };
    input
}
