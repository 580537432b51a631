//! Decision tick and fixed-step integration
//!
//! [`tick`] runs once per frame at a variable rate: input, waves, weapons,
//! enemy AI, projectiles and area effects. It only records motion intents.
//! [`integrate`] runs at `SIM_DT` and applies those intents to positions.

use glam::{Vec2, Vec3};

use super::autopilot;
use super::director::PickOutcome;
use super::enemy::KillReport;
use super::spatial::ActorHandle;
use super::state::{BeamFlash, Encounter, GameEvent};
use super::weapon::{AimContext, FireOutcome};
use crate::consts::*;

/// Input for a single decision tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Trigger held this tick
    pub fire: bool,
    /// Skill pressed this tick
    pub skill: bool,
    /// Equip weapon slot 1..=3
    pub select_weapon: Option<u8>,
    /// Pause toggle
    pub pause: bool,
    /// Answer the open upgrade prompt with this choice
    pub pick_upgrade: Option<usize>,
    /// World-space aim point; `None` aims straight ahead
    pub aim_point: Option<Vec3>,
    /// Locomotion axis (x = strafe right, y = forward)
    pub move_axis: Vec2,
    /// Let the autopilot play
    pub autopilot: bool,
}

/// Advance the encounter's decision phase by `dt` seconds
pub fn tick(enc: &mut Encounter, input: &TickInput, dt: f32) {
    if enc.director.is_over() {
        return;
    }

    let input = if input.autopilot {
        autopilot::drive(enc, input)
    } else {
        input.clone()
    };

    if input.pause {
        enc.director.toggle_pause();
    }
    if let Some(choice) = input.pick_upgrade {
        answer_prompt(enc, choice);
    }

    // Nothing below runs while paused
    if enc.director.is_paused() {
        return;
    }

    enc.time_ticks += 1;
    enc.rebuild_index();
    run_waves(enc);

    let mut kills = Vec::new();
    let mut player_died = false;

    enc.player.decide(input.move_axis, input.aim_point);
    let aim_point = input.aim_point.unwrap_or_else(|| enc.fallback_aim());
    let aim = AimContext {
        owner: enc.player.position,
        forward: enc.player.forward(),
        muzzle: enc.player.position + Vec3::Y * MUZZLE_HEIGHT,
        aim_point,
    };

    tick_beam_flash(enc, dt);
    run_weapons(enc, &input, &aim, dt, &mut kills);

    // Enemy decisions and contact damage
    let player_pos = enc.player.position;
    for enemy in enc.roster.iter_mut() {
        if let Some(shot) = enemy.tick_ai(Some(player_pos), &enc.index, dt) {
            enc.projectiles.push(shot);
        }
        if let Some(amount) =
            enemy.try_touch(player_pos, enc.player.radius, enc.touch_interval, dt)
        {
            enc.events.push(GameEvent::PlayerHit { amount });
            player_died |= enc.player.take_damage(amount);
        }
    }

    // Projectiles
    for p in enc.projectiles.iter_mut() {
        let struck = p.step(dt, &enc.index, |h| match h {
            ActorHandle::Enemy(id) => enc.roster.is_alive(id),
            ActorHandle::Player => !enc.player.is_dead(),
        });
        for handle in struck {
            match handle {
                ActorHandle::Enemy(id) => kills.extend(enc.roster.damage(id, p.damage)),
                ActorHandle::Player => {
                    enc.events.push(GameEvent::PlayerHit { amount: p.damage });
                    player_died |= enc.player.take_damage(p.damage);
                }
            }
        }
    }
    enc.projectiles.retain(|p| !p.is_expired());

    // Area effects
    enc.puddles
        .retain_mut(|puddle| puddle.tick(dt, &enc.index, &mut enc.roster));

    settle(enc, kills, player_died);
}

/// Fixed step: move actors along their current intents
pub fn integrate(enc: &mut Encounter, dt: f32) {
    if enc.director.is_over() || enc.director.is_paused() {
        return;
    }
    enc.player.integrate(dt);
    for enemy in enc.roster.iter_mut() {
        enemy.integrate(dt);
    }
}

/// Start the next wave once the current one is cleared
fn run_waves(enc: &mut Encounter) {
    if enc.director.spawning_disabled() || !enc.spawner.is_wave_cleared(&enc.roster) {
        return;
    }
    let wave = enc.director.advance_wave();
    match enc
        .spawner
        .spawn_wave(wave, &mut enc.roster, &enc.index, &mut enc.rng)
    {
        Some(plan) => {
            enc.events.push(GameEvent::WaveStarted {
                wave,
                count: plan.count,
            });
            enc.rebuild_index();
        }
        None => enc.director.disable_spawning(),
    }
}

fn run_weapons(
    enc: &mut Encounter,
    input: &TickInput,
    aim: &AimContext,
    dt: f32,
    kills: &mut Vec<KillReport>,
) {
    enc.loadout.tick(dt);
    if let Some(slot) = input.select_weapon {
        enc.loadout.select(slot);
    }
    let Some(weapon) = enc.loadout.current_mut() else {
        return;
    };

    let mut outcomes = Vec::with_capacity(2);
    if input.fire {
        outcomes.extend(weapon.fire(aim, &enc.index, &enc.roster, dt));
    }
    if input.skill {
        outcomes.extend(weapon.use_skill(aim, &enc.index));
    }
    for outcome in outcomes {
        apply_outcome(enc, outcome, kills);
    }
}

fn apply_outcome(enc: &mut Encounter, outcome: FireOutcome, kills: &mut Vec<KillReport>) {
    for (id, amount) in outcome.hits {
        kills.extend(enc.roster.damage(id, amount));
    }
    enc.projectiles.extend(outcome.projectiles);
    enc.puddles.extend(outcome.puddle);
    if let Some(leap) = outcome.leap {
        enc.player.leap = Some(leap);
    }
    if let Some(trace) = outcome.beam {
        enc.beam_flash = Some(BeamFlash::new(trace));
    }
}

fn tick_beam_flash(enc: &mut Encounter, dt: f32) {
    let done = match &mut enc.beam_flash {
        Some(flash) => {
            flash.task.advance(dt);
            flash.task.is_finished()
        }
        None => false,
    };
    if done {
        enc.beam_flash = None;
    }
}

fn answer_prompt(enc: &mut Encounter, choice: usize) {
    let outcome = enc.director.pick(
        choice,
        &enc.catalog,
        &mut enc.player,
        &mut enc.loadout,
        &mut enc.rng,
    );
    match outcome {
        PickOutcome::Applied(id) => enc.events.push(GameEvent::UpgradeApplied { id }),
        other => log::debug!("Upgrade pick {choice} ignored: {other:?}"),
    }
}

/// Tick boundary: credit kills, handle death, drop dead enemies
fn settle(enc: &mut Encounter, kills: Vec<KillReport>, player_died: bool) {
    for kill in &kills {
        enc.events.push(GameEvent::EnemyKilled {
            id: kill.id,
            archetype: kill.archetype,
        });
        let gained =
            enc.director
                .record_kill(kill, &mut enc.player, &enc.catalog, &mut enc.rng);
        if gained > 0 {
            enc.events.push(GameEvent::LevelUp {
                level: enc.player.level(),
                gained,
            });
        }
    }

    if player_died {
        enc.player.cancel_leap();
        enc.director.end();
        enc.events.push(GameEvent::PlayerDied);
    }

    let pruned = enc.roster.prune_dead();
    if pruned > 0 {
        log::debug!("Pruned {pruned} dead enemies");
    }
}
