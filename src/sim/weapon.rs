//! Player weapons: fire/skill cooldown state machine and hit resolution
//!
//! Weapons never mutate the world directly. [`Weapon::fire`] and
//! [`Weapon::use_skill`] read the spatial query and roster, then hand back a
//! [`FireOutcome`] that the encounter applies.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::enemy::Roster;
use super::projectile::{Faction, Projectile};
use super::spatial::{ActorHandle, CategoryMask, EnemyId, SpatialQuery};
use super::task::{TimedTask, arc_curve, ease_in_out};
use crate::consts::*;
use crate::flat;

/// Slow puddles re-apply this much extra duration every tick
pub const PUDDLE_SLOW_GRACE: f32 = 0.15;
/// How long a beam trace stays visible
pub const BEAM_FLASH_SECS: f32 = 0.05;

/// Everything a weapon needs to know about one trigger pull
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimContext {
    /// Owner foot position
    pub owner: Vec3,
    /// Owner facing (planar)
    pub forward: Vec3,
    pub muzzle: Vec3,
    /// Resolved world-space aim point
    pub aim_point: Vec3,
}

impl AimContext {
    /// Direction from the muzzle to the aim point, falling back to facing
    pub fn muzzle_direction(&self) -> Vec3 {
        let dir = (self.aim_point - self.muzzle).normalize_or_zero();
        if dir == Vec3::ZERO { self.planar_forward() } else { dir }
    }

    pub fn planar_forward(&self) -> Vec3 {
        let f = flat(self.forward).normalize_or_zero();
        if f == Vec3::ZERO { Vec3::Z } else { f }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeParams {
    pub radius: f32,
    /// Full sector width in degrees
    pub angle: f32,
    pub leap_distance: f32,
    pub leap_duration: f32,
    pub leap_height: f32,
    /// Distance kept from a wall when a leap is clipped
    pub leap_clearance: f32,
}

impl Default for MeleeParams {
    fn default() -> Self {
        Self {
            radius: 3.0,
            angle: 90.0,
            leap_distance: 6.0,
            leap_duration: 0.35,
            leap_height: 1.5,
            leap_clearance: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GunParams {
    pub projectile_speed: f32,
    pub pierce: bool,
    pub fan_projectiles: u32,
    /// Total fan width in degrees
    pub fan_angle: f32,
    pub fan_speed_multiplier: f32,
}

impl Default for GunParams {
    fn default() -> Self {
        Self {
            projectile_speed: 18.0,
            pierce: false,
            fan_projectiles: 7,
            fan_angle: 45.0,
            fan_speed_multiplier: 1.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamParams {
    pub range: f32,
    pub max_hits: u32,
    pub stop_on_wall: bool,
    /// Fire every tick without a cooldown, damage scaled by dt
    pub continuous: bool,
    pub puddle_radius: f32,
    pub puddle_duration: f32,
    pub puddle_slow_multiplier: f32,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            range: 60.0,
            max_hits: 6,
            stop_on_wall: true,
            continuous: false,
            puddle_radius: 3.0,
            puddle_duration: 4.0,
            puddle_slow_multiplier: 0.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeaponKind {
    Melee(MeleeParams),
    Projectile(GunParams),
    Beam(BeamParams),
}

/// Loadout slot a weapon belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponSlot {
    Melee,
    Projectile,
    Beam,
}

impl WeaponKind {
    pub fn slot(&self) -> WeaponSlot {
        match self {
            WeaponKind::Melee(_) => WeaponSlot::Melee,
            WeaponKind::Projectile(_) => WeaponSlot::Projectile,
            WeaponKind::Beam(_) => WeaponSlot::Beam,
        }
    }
}

/// Curve-eased dash of the owner toward a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leap {
    pub origin: Vec3,
    pub target: Vec3,
    pub height: f32,
    pub task: TimedTask,
}

impl Leap {
    pub fn new(origin: Vec3, target: Vec3, height: f32, duration: f32) -> Self {
        Self {
            origin,
            target,
            height,
            task: TimedTask::new(duration),
        }
    }

    /// Advance and return the owner position for this tick
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        let t = self.task.advance(dt);
        self.origin.lerp(self.target, ease_in_out(t)) + Vec3::Y * (self.height * arc_curve(t))
    }

    /// Where the owner ends up if the leap is cut short now
    pub fn grounded_position(&self) -> Vec3 {
        let t = self.task.progress();
        self.origin.lerp(self.target, ease_in_out(t))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Stationary area that slows enemies standing in it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowPuddle {
    pub position: Vec3,
    pub radius: f32,
    pub slow_multiplier: f32,
    pub task: TimedTask,
}

impl SlowPuddle {
    pub fn new(position: Vec3, radius: f32, duration: f32, slow_multiplier: f32) -> Self {
        Self {
            position,
            radius: radius.max(0.1),
            slow_multiplier: slow_multiplier.clamp(MIN_SLOW_MULTIPLIER, 1.0),
            task: TimedTask::new(duration.max(0.1)),
        }
    }

    /// Slow every live enemy inside; returns false once the puddle has expired
    pub fn tick(&mut self, dt: f32, query: &dyn SpatialQuery, roster: &mut Roster) -> bool {
        self.task.advance(dt);
        if self.task.is_finished() {
            return false;
        }
        for contact in query.overlap(self.position, self.radius, CategoryMask::ENEMY) {
            if let Some(ActorHandle::Enemy(id)) = contact.owner {
                if let Some(enemy) = roster.get_mut(id) {
                    enemy.apply_slow(self.slow_multiplier, dt + PUDDLE_SLOW_GRACE);
                }
            }
        }
        true
    }
}

/// Visual extent of one beam shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamTrace {
    pub start: Vec3,
    pub end: Vec3,
    /// The beam ended on a wall
    pub impact: bool,
}

/// What a successful fire or skill produced
#[derive(Debug, Clone, Default)]
pub struct FireOutcome {
    /// Damage to apply, each enemy at most once
    pub hits: Vec<(EnemyId, f32)>,
    pub projectiles: Vec<Projectile>,
    pub puddle: Option<SlowPuddle>,
    pub leap: Option<Leap>,
    pub beam: Option<BeamTrace>,
}

impl FireOutcome {
    fn hit(&mut self, id: EnemyId, amount: f32) {
        if !self.hits.iter().any(|&(h, _)| h == id) {
            self.hits.push((id, amount));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub damage: f32,
    /// Shots per second
    pub fire_rate: f32,
    /// Seconds between skill uses
    pub skill_cooldown: f32,
    #[serde(default)]
    pub fire_cooldown: f32,
    #[serde(default)]
    pub skill_cooldown_remaining: f32,
    pub kind: WeaponKind,
}

impl Weapon {
    pub fn new(name: impl Into<String>, kind: WeaponKind) -> Self {
        Self {
            name: name.into(),
            damage: 10.0,
            fire_rate: 2.0,
            skill_cooldown: 8.0,
            fire_cooldown: 0.0,
            skill_cooldown_remaining: 0.0,
            kind,
        }
    }

    pub fn blade() -> Self {
        Self::new("Blade", WeaponKind::Melee(MeleeParams::default()))
    }

    pub fn gun() -> Self {
        Self::new("Gun", WeaponKind::Projectile(GunParams::default()))
    }

    pub fn laser() -> Self {
        Self::new("Laser", WeaponKind::Beam(BeamParams::default()))
    }

    pub fn slot(&self) -> WeaponSlot {
        self.kind.slot()
    }

    /// Continuous beams skip the fire cooldown entirely
    pub fn uses_fire_cooldown(&self) -> bool {
        !matches!(&self.kind, WeaponKind::Beam(b) if b.continuous)
    }

    pub fn can_fire(&self) -> bool {
        !self.uses_fire_cooldown() || self.fire_cooldown <= 0.0
    }

    pub fn can_use_skill(&self) -> bool {
        self.skill_cooldown_remaining <= 0.0
    }

    /// Count both cooldowns down
    pub fn tick(&mut self, dt: f32) {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.skill_cooldown_remaining = (self.skill_cooldown_remaining - dt).max(0.0);
    }

    /// Pull the trigger. `None` means the shot was rejected by cooldown.
    pub fn fire(
        &mut self,
        aim: &AimContext,
        query: &dyn SpatialQuery,
        roster: &Roster,
        dt: f32,
    ) -> Option<FireOutcome> {
        if !self.can_fire() {
            return None;
        }
        if self.uses_fire_cooldown() {
            self.fire_cooldown = 1.0 / self.fire_rate.max(1e-4);
        }

        let mut out = FireOutcome::default();
        match &self.kind {
            WeaponKind::Melee(p) => melee_sweep(p, self.damage, aim, query, roster, &mut out),
            WeaponKind::Projectile(p) => out.projectiles.push(Projectile::new(
                aim.muzzle,
                aim.muzzle_direction(),
                p.projectile_speed,
                self.damage,
                p.pierce,
                Faction::Enemy,
            )),
            WeaponKind::Beam(p) => {
                let amount = if p.continuous { self.damage * dt } else { self.damage };
                beam_trace(p, amount, aim, query, roster, &mut out);
            }
        }
        Some(out)
    }

    /// Trigger the weapon skill. `None` means it is still cooling down.
    pub fn use_skill(&mut self, aim: &AimContext, query: &dyn SpatialQuery) -> Option<FireOutcome> {
        if !self.can_use_skill() {
            return None;
        }
        self.skill_cooldown_remaining = self.skill_cooldown.max(0.0);

        let mut out = FireOutcome::default();
        match &self.kind {
            WeaponKind::Melee(p) => out.leap = Some(plan_leap(p, aim, query)),
            WeaponKind::Projectile(p) => out.projectiles = piercing_fan(p, self.damage, aim),
            WeaponKind::Beam(p) => {
                out.puddle = Some(SlowPuddle::new(
                    aim.aim_point,
                    p.puddle_radius,
                    p.puddle_duration,
                    p.puddle_slow_multiplier,
                ))
            }
        }
        Some(out)
    }

    // --- Upgrade mutations: safe mid-cooldown, read on the next action ---

    pub fn add_damage(&mut self, add: f32) {
        self.damage = (self.damage + add).max(0.0);
    }

    pub fn mul_damage(&mut self, mul: f32) {
        self.damage *= mul.max(0.0);
    }

    pub fn add_fire_rate(&mut self, add: f32) {
        self.fire_rate = (self.fire_rate + add).max(0.0);
    }

    /// Returns false when this is not a melee weapon
    pub fn add_radius(&mut self, add: f32) -> bool {
        match &mut self.kind {
            WeaponKind::Melee(p) => {
                p.radius = (p.radius + add).max(0.0);
                true
            }
            _ => false,
        }
    }

    pub fn add_angle(&mut self, add: f32) -> bool {
        match &mut self.kind {
            WeaponKind::Melee(p) => {
                p.angle = (p.angle + add).clamp(10.0, 240.0);
                true
            }
            _ => false,
        }
    }

    pub fn mul_projectile_speed(&mut self, mul: f32) -> bool {
        match &mut self.kind {
            WeaponKind::Projectile(p) => {
                p.projectile_speed = (p.projectile_speed * mul).max(0.0);
                true
            }
            _ => false,
        }
    }

    pub fn set_pierce(&mut self, on: bool) -> bool {
        match &mut self.kind {
            WeaponKind::Projectile(p) => {
                p.pierce = on;
                true
            }
            _ => false,
        }
    }

    pub fn mul_range(&mut self, mul: f32) -> bool {
        match &mut self.kind {
            WeaponKind::Beam(p) => {
                p.range = (p.range * mul).max(1.0);
                true
            }
            _ => false,
        }
    }

    pub fn add_max_hits(&mut self, add: i32) -> bool {
        match &mut self.kind {
            WeaponKind::Beam(p) => {
                p.max_hits = (p.max_hits as i64 + add as i64).max(1) as u32;
                true
            }
            _ => false,
        }
    }
}

/// Damage every live enemy inside the forward sector, once each
fn melee_sweep(
    p: &MeleeParams,
    damage: f32,
    aim: &AimContext,
    query: &dyn SpatialQuery,
    roster: &Roster,
    out: &mut FireOutcome,
) {
    let origin = aim.owner + Vec3::Y * MELEE_ORIGIN_HEIGHT;
    let forward = aim.planar_forward();
    let half_angle = (p.angle * 0.5).to_radians();

    for contact in query.overlap(origin, p.radius, CategoryMask::ENEMY) {
        let Some(ActorHandle::Enemy(id)) = contact.owner else { continue };
        if !roster.is_alive(id) {
            continue;
        }
        let to = flat(contact.position - aim.owner);
        if to.length_squared() < 1e-4 {
            continue;
        }
        if forward.angle_between(to.normalize()) <= half_angle {
            out.hit(id, damage);
        }
    }
}

/// Dash target ahead of the owner, clipped short of the first wall
fn plan_leap(p: &MeleeParams, aim: &AimContext, query: &dyn SpatialQuery) -> Leap {
    let forward = aim.planar_forward();
    let probe = aim.owner + Vec3::Y * 0.5;
    let mut travel = p.leap_distance.max(0.0);

    let walls = query.raycast(probe, forward, travel + p.leap_clearance, CategoryMask::WALL);
    if let Some(hit) = walls.iter().find(|h| h.owner.is_none()) {
        travel = travel.min((hit.distance - p.leap_clearance).max(0.0));
    }

    Leap::new(aim.owner, aim.owner + forward * travel, p.leap_height, p.leap_duration)
}

/// Evenly spread piercing shots across the fan width
fn piercing_fan(p: &GunParams, damage: f32, aim: &AimContext) -> Vec<Projectile> {
    let mut base = flat(aim.muzzle_direction());
    if base.length_squared() < 1e-4 {
        base = Vec3::Z;
    }
    let base = base.normalize();

    let count = p.fan_projectiles.max(1);
    let total = p.fan_angle.max(0.0);
    let speed = p.projectile_speed * p.fan_speed_multiplier;
    let shot = |dir: Vec3| Projectile::new(aim.muzzle, dir, speed, damage, true, Faction::Enemy);

    if count == 1 {
        return vec![shot(base)];
    }
    (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1) as f32;
            let yaw = (-total * 0.5 + total * t).to_radians();
            shot(Quat::from_rotation_y(yaw) * base)
        })
        .collect()
}

/// Walk ray hits nearest-first, damaging up to `max_hits` live enemies in
/// front of the first wall
fn beam_trace(
    p: &BeamParams,
    amount: f32,
    aim: &AimContext,
    query: &dyn SpatialQuery,
    roster: &Roster,
    out: &mut FireOutcome,
) {
    let start = aim.muzzle;
    let dir = aim.muzzle_direction();
    let mut hits = query.raycast(start, dir, p.range, CategoryMask::ENEMY | CategoryMask::WALL);
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let mut trace = BeamTrace {
        start,
        end: start + dir * p.range,
        impact: false,
    };
    let mut damaged = 0u32;
    for hit in &hits {
        match hit.owner {
            None if p.stop_on_wall => {
                trace.end = hit.point;
                trace.impact = true;
                break;
            }
            Some(ActorHandle::Enemy(id)) if roster.is_alive(id) => {
                if damaged >= p.max_hits.max(1) {
                    break;
                }
                if !out.hits.iter().any(|&(h, _)| h == id) {
                    out.hits.push((id, amount));
                    damaged += 1;
                }
            }
            _ => {}
        }
    }
    out.beam = Some(trace);
}
