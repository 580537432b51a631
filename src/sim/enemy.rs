//! Enemy actors: health, slows, steering and per-archetype AI
//!
//! The decision phase ([`Enemy::tick_ai`]) only writes a [`MotionIntent`];
//! positions change in [`Enemy::integrate`] during the fixed step.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::projectile::{Faction, Projectile};
use super::spatial::{ActorHandle, CategoryMask, Collider, EnemyId, SpatialQuery};
use super::steering::{compute_separation, steer};
use crate::consts::*;
use crate::{flat, rotate_toward, yaw_of};

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Melee,
    Ranged,
    Tank,
}

/// Base tuning shared by every archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    pub max_hp: f32,
    pub move_speed: f32,
    pub touch_damage: f32,
    pub experience_drop: f32,
    /// Degrees per second
    pub rotation_speed: f32,
    pub separation_radius: f32,
    pub separation_strength: f32,
    pub radius: f32,
    pub height: f32,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            max_hp: 30.0,
            move_speed: 3.5,
            touch_damage: 10.0,
            experience_drop: 10.0,
            rotation_speed: 540.0,
            separation_radius: 1.2,
            separation_strength: 2.2,
            radius: ACTOR_RADIUS,
            height: ACTOR_HEIGHT,
        }
    }
}

impl EnemyStats {
    /// Clamp to sane ranges (negative tuning is treated as zero)
    pub fn sanitized(mut self) -> Self {
        self.max_hp = self.max_hp.max(1.0);
        self.move_speed = self.move_speed.max(0.0);
        self.touch_damage = self.touch_damage.max(0.0);
        self.experience_drop = self.experience_drop.max(0.0);
        self.rotation_speed = self.rotation_speed.max(0.0);
        self.separation_radius = self.separation_radius.max(0.0);
        self.separation_strength = self.separation_strength.max(0.0);
        self.radius = self.radius.max(0.01);
        self.height = self.height.max(0.01);
        self
    }
}

/// Ranged-only tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedStats {
    pub bullet_damage: f32,
    /// Shots per second
    pub shoot_rate: f32,
    pub shoot_range: f32,
    pub projectile_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Shots aim this far above the player's feet
    pub aim_height: f32,
}

impl Default for RangedStats {
    fn default() -> Self {
        Self {
            bullet_damage: 8.0,
            shoot_rate: 1.2,
            shoot_range: 30.0,
            projectile_speed: 14.0,
            min_distance: 10.0,
            max_distance: 20.0,
            aim_height: 1.2,
        }
    }
}

impl RangedStats {
    pub fn sanitized(mut self) -> Self {
        self.bullet_damage = self.bullet_damage.max(0.0);
        self.shoot_rate = self.shoot_rate.max(0.0);
        self.shoot_range = self.shoot_range.max(0.0);
        self.projectile_speed = self.projectile_speed.max(0.0);
        self.min_distance = self.min_distance.max(0.0);
        self.max_distance = self.max_distance.max(self.min_distance);
        self.aim_height = self.aim_height.max(0.0);
        self
    }
}

/// A spawnable enemy definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub archetype: Archetype,
    #[serde(default)]
    pub stats: EnemyStats,
    /// Only read for [`Archetype::Ranged`]
    #[serde(default)]
    pub ranged: RangedStats,
}

impl EnemyTemplate {
    pub fn melee() -> Self {
        Self {
            archetype: Archetype::Melee,
            stats: EnemyStats::default(),
            ranged: RangedStats::default(),
        }
    }

    pub fn ranged() -> Self {
        Self {
            archetype: Archetype::Ranged,
            stats: EnemyStats {
                max_hp: 20.0,
                move_speed: 3.0,
                touch_damage: 5.0,
                ..EnemyStats::default()
            },
            ranged: RangedStats::default(),
        }
    }

    /// Same chase AI as melee, heavier numbers
    pub fn tank() -> Self {
        Self {
            archetype: Archetype::Tank,
            stats: EnemyStats {
                max_hp: 120.0,
                move_speed: 2.0,
                touch_damage: 20.0,
                experience_drop: 20.0,
                radius: 0.9,
                separation_radius: 2.0,
                ..EnemyStats::default()
            },
            ranged: RangedStats::default(),
        }
    }
}

/// Per-archetype AI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnemyKind {
    Melee,
    Ranged { stats: RangedStats, shoot_cooldown: f32 },
    Tank,
}

/// What the decision phase wants to happen this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionIntent {
    pub velocity: Vec3,
    pub yaw: Option<f32>,
}

/// Reported exactly once, when an enemy's hp reaches zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KillReport {
    pub id: EnemyId,
    pub archetype: Archetype,
    pub experience: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EnemyId,
    pub stats: EnemyStats,
    pub kind: EnemyKind,
    pub position: Vec3,
    pub yaw: f32,
    hp: f32,
    slow_multiplier: f32,
    slow_timer: f32,
    intent: MotionIntent,
    touch_cooldown: f32,
    dead: bool,
}

impl Enemy {
    /// Build an enemy from a template. `shoot_delay` seeds a ranged enemy's
    /// first shot so a wave does not fire in lockstep.
    pub fn new(id: EnemyId, template: &EnemyTemplate, position: Vec3, shoot_delay: f32) -> Self {
        let stats = template.stats.clone().sanitized();
        let kind = match template.archetype {
            Archetype::Melee => EnemyKind::Melee,
            Archetype::Ranged => EnemyKind::Ranged {
                stats: template.ranged.clone().sanitized(),
                shoot_cooldown: shoot_delay,
            },
            Archetype::Tank => EnemyKind::Tank,
        };
        Self {
            id,
            hp: stats.max_hp,
            stats,
            kind,
            position,
            yaw: 0.0,
            slow_multiplier: 1.0,
            slow_timer: 0.0,
            intent: MotionIntent::default(),
            touch_cooldown: 0.0,
            dead: false,
        }
    }

    pub fn archetype(&self) -> Archetype {
        match self.kind {
            EnemyKind::Melee => Archetype::Melee,
            EnemyKind::Ranged { .. } => Archetype::Ranged,
            EnemyKind::Tank => Archetype::Tank,
        }
    }

    pub fn handle(&self) -> ActorHandle {
        ActorHandle::Enemy(self.id)
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn max_hp(&self) -> f32 {
        self.stats.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn slow_multiplier(&self) -> f32 {
        self.slow_multiplier
    }

    pub fn slow_timer(&self) -> f32 {
        self.slow_timer
    }

    pub fn effective_move_speed(&self) -> f32 {
        self.stats.move_speed * self.slow_multiplier
    }

    pub fn intent(&self) -> MotionIntent {
        self.intent
    }

    pub fn collider(&self) -> Collider {
        Collider {
            handle: self.handle(),
            category: CategoryMask::ENEMY,
            base: self.position,
            radius: self.stats.radius,
            height: self.stats.height,
        }
    }

    /// Apply damage. Returns the kill report on the call that reaches zero hp
    /// and never again.
    pub fn take_damage(&mut self, amount: f32) -> Option<KillReport> {
        if self.dead || amount.is_nan() || amount <= 0.0 {
            return None;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.hp > 0.0 {
            return None;
        }
        self.dead = true;
        self.intent = MotionIntent::default();
        Some(KillReport {
            id: self.id,
            archetype: self.archetype(),
            experience: self.stats.experience_drop,
        })
    }

    /// Keep the strongest multiplier and the longest duration independently
    pub fn apply_slow(&mut self, multiplier: f32, duration: f32) {
        if self.dead {
            return;
        }
        let clamped = multiplier.clamp(MIN_SLOW_MULTIPLIER, 1.0);
        self.slow_multiplier = self.slow_multiplier.min(clamped);
        self.slow_timer = self.slow_timer.max(duration);
    }

    fn tick_slow(&mut self, dt: f32) {
        if self.slow_timer <= 0.0 {
            self.slow_multiplier = 1.0;
            return;
        }
        self.slow_timer -= dt;
        if self.slow_timer <= 0.0 {
            self.slow_timer = 0.0;
            self.slow_multiplier = 1.0;
        }
    }

    /// Scale a freshly spawned enemy for its wave and refill hp
    pub fn apply_wave_scaling(&mut self, hp_multiplier: f32, damage_multiplier: f32) {
        if self.dead {
            return;
        }
        self.stats.max_hp *= hp_multiplier.max(0.01);
        self.hp = self.stats.max_hp;

        let dmg = damage_multiplier.max(0.0);
        self.stats.touch_damage *= dmg;
        if let EnemyKind::Ranged { stats, .. } = &mut self.kind {
            stats.bullet_damage *= dmg;
        }
    }

    /// Decision phase: pick a motion intent and maybe shoot.
    ///
    /// `player` is `None` when there is no player to chase this frame.
    pub fn tick_ai(
        &mut self,
        player: Option<Vec3>,
        query: &dyn SpatialQuery,
        dt: f32,
    ) -> Option<Projectile> {
        self.intent = MotionIntent::default();
        self.tick_slow(dt);

        if self.dead {
            return None;
        }
        let player = player?;

        let to_player = flat(player - self.position);
        if to_player.length_squared() > FLAT_EPSILON_SQ {
            self.intent.yaw = Some(yaw_of(to_player));
        }

        let separation = compute_separation(
            query,
            self.position,
            self.handle(),
            self.stats.separation_radius,
            self.stats.separation_strength,
            CategoryMask::ENEMY,
        );
        let speed = self.effective_move_speed();

        match &mut self.kind {
            EnemyKind::Melee | EnemyKind::Tank => {
                let seek = if to_player.length_squared() > FLAT_EPSILON_SQ {
                    to_player.normalize()
                } else {
                    Vec3::ZERO
                };
                self.intent.velocity = steer(seek, separation, speed);
                None
            }
            EnemyKind::Ranged {
                stats,
                shoot_cooldown,
            } => {
                *shoot_cooldown -= dt;

                let dist = to_player.length();
                let seek = if dist > stats.max_distance {
                    to_player.normalize_or_zero()
                } else if dist < stats.min_distance {
                    -to_player.normalize_or_zero()
                } else {
                    Vec3::ZERO
                };
                self.intent.velocity = steer(seek, separation, speed);

                if dist > stats.shoot_range || *shoot_cooldown > 0.0 {
                    return None;
                }
                *shoot_cooldown = 1.0 / stats.shoot_rate.max(1e-4);

                let muzzle = self.position + Vec3::Y * MUZZLE_HEIGHT;
                let target = player + Vec3::Y * stats.aim_height;
                Some(Projectile::new(
                    muzzle,
                    target - muzzle,
                    stats.projectile_speed,
                    stats.bullet_damage,
                    false,
                    Faction::Player,
                ))
            }
        }
    }

    /// Contact damage against the player, at most once per `interval`
    pub fn try_touch(
        &mut self,
        player: Vec3,
        player_radius: f32,
        interval: f32,
        dt: f32,
    ) -> Option<f32> {
        self.touch_cooldown -= dt;
        if self.dead || self.touch_cooldown > 0.0 {
            return None;
        }
        let reach = self.stats.radius + player_radius + 0.1;
        if flat(player - self.position).length_squared() > reach * reach {
            return None;
        }
        self.touch_cooldown = interval;
        Some(self.stats.touch_damage)
    }

    /// Fixed step: apply this tick's intent
    pub fn integrate(&mut self, dt: f32) {
        if self.dead {
            return;
        }
        if self.intent.velocity.length_squared() > 1e-5 {
            self.position += self.intent.velocity * dt;
        }
        if let Some(target) = self.intent.yaw {
            let max_step = self.stats.rotation_speed.to_radians() * dt;
            self.yaw = rotate_toward(self.yaw, target, max_step);
        }
    }
}

/// All enemies in the encounter, sorted by id.
///
/// Dead enemies stay in place until [`Roster::prune_dead`] runs at the tick
/// boundary, so indices stay valid while a tick iterates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    enemies: Vec<Enemy>,
    next_id: EnemyId,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            enemies: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an enemy built from `template`, returning its id
    pub fn spawn(&mut self, template: &EnemyTemplate, position: Vec3, shoot_delay: f32) -> EnemyId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.enemies.push(Enemy::new(id, template, position, shoot_delay));
        id
    }

    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.enemies[i])
    }

    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(move |i| &mut self.enemies[i])
    }

    pub fn is_alive(&self, id: EnemyId) -> bool {
        self.get(id).is_some_and(|e| !e.is_dead())
    }

    /// Damage an enemy by id; unknown or dead ids are ignored
    pub fn damage(&mut self, id: EnemyId, amount: f32) -> Option<KillReport> {
        self.get_mut(id)?.take_damage(amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.iter_mut()
    }

    pub fn alive(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| !e.is_dead())
    }

    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Remove dead enemies; returns how many were dropped
    pub fn prune_dead(&mut self) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(|e| !e.is_dead());
        before - self.enemies.len()
    }

    pub fn colliders(&self) -> impl Iterator<Item = Collider> + '_ {
        self.alive().map(Enemy::collider)
    }
}
