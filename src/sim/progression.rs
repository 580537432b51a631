//! Player state: health, locomotion, experience curve and upgrade claims

use std::collections::BTreeSet;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::spatial::{ActorHandle, CategoryMask, Collider};
use super::weapon::Leap;
use crate::consts::*;
use crate::forward_from_yaw;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_hp: f32,
    pub move_speed: f32,
    pub radius: f32,
    /// Experience needed for the first level-up
    pub experience_to_next_level: f32,
    /// Threshold multiplier applied on every level-up
    pub experience_growth: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            move_speed: 6.0,
            radius: ACTOR_RADIUS,
            experience_to_next_level: 5.0,
            experience_growth: 1.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec3,
    pub yaw: f32,
    pub radius: f32,
    max_hp: f32,
    hp: f32,
    move_speed: f32,
    level: u32,
    experience: f32,
    experience_to_next_level: f32,
    experience_growth: f32,
    taken_upgrades: BTreeSet<String>,
    /// Planar velocity requested by this tick's input
    move_intent: Vec3,
    /// Active melee leap, if any
    pub leap: Option<Leap>,
}

impl Player {
    pub fn new(config: &PlayerConfig, position: Vec3) -> Self {
        let max_hp = config.max_hp.max(1.0);
        Self {
            position,
            yaw: 0.0,
            radius: config.radius.max(0.01),
            max_hp,
            hp: max_hp,
            move_speed: config.move_speed.max(0.0),
            level: 1,
            experience: 0.0,
            experience_to_next_level: config.experience_to_next_level.ceil().max(1.0),
            experience_growth: config.experience_growth.max(1.0),
            taken_upgrades: BTreeSet::new(),
            move_intent: Vec3::ZERO,
            leap: None,
        }
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> f32 {
        self.experience
    }

    pub fn experience_to_next_level(&self) -> f32 {
        self.experience_to_next_level
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    pub fn handle(&self) -> ActorHandle {
        ActorHandle::Player
    }

    pub fn collider(&self) -> Collider {
        Collider {
            handle: ActorHandle::Player,
            category: CategoryMask::PLAYER,
            base: self.position,
            radius: self.radius,
            height: ACTOR_HEIGHT,
        }
    }

    /// Apply damage. Returns true only on the call that kills the player.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_dead() || amount.is_nan() || amount <= 0.0 {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.is_dead() {
            log::info!("Player died at level {}", self.level);
            return true;
        }
        false
    }

    pub fn heal(&mut self, amount: f32) {
        if self.is_dead() || amount.is_nan() || amount <= 0.0 {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Raise max hp and current hp by the same amount
    pub fn add_max_hp(&mut self, add: f32) {
        if add.is_nan() || add <= 0.0 {
            return;
        }
        self.max_hp += add;
        self.hp = (self.hp + add).min(self.max_hp);
    }

    pub fn add_move_speed(&mut self, add: f32) {
        self.move_speed = (self.move_speed + add).max(0.0);
    }

    /// Grant experience and settle level-ups. Returns how many levels were
    /// gained; each one queues an upgrade pick.
    pub fn add_experience(&mut self, amount: f32) -> u32 {
        if self.is_dead() || !amount.is_finite() || amount <= 0.0 {
            return 0;
        }
        self.experience += amount;

        let mut gained: u32 = 0;
        while self.experience >= self.experience_to_next_level {
            let threshold = self.experience_to_next_level;
            let next = (threshold * self.experience_growth).ceil().max(1.0);
            if next <= threshold {
                // Flat curve: settle every remaining level at once
                let levels = (self.experience / threshold).floor() as u32;
                self.experience %= threshold;
                self.level = self.level.saturating_add(levels);
                gained = gained.saturating_add(levels);
                break;
            }
            self.experience -= threshold;
            self.level = self.level.saturating_add(1);
            self.experience_to_next_level = next;
            gained = gained.saturating_add(1);
        }
        if gained > 0 {
            log::info!(
                "Level up: {} (+{gained}, next at {})",
                self.level, self.experience_to_next_level
            );
        }
        gained
    }

    /// Claim an upgrade id. True only the first time for a given id.
    pub fn try_take_upgrade(&mut self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        let fresh = self.taken_upgrades.insert(id.to_owned());
        if !fresh {
            log::debug!("Upgrade {id} already claimed");
        }
        fresh
    }

    pub fn has_upgrade(&self, id: &str) -> bool {
        !id.is_empty() && self.taken_upgrades.contains(id)
    }

    /// Decision phase: face `aim` and turn the movement axis into a velocity.
    ///
    /// `axis.y` is forward, `axis.x` is strafe right, both relative to facing.
    pub fn decide(&mut self, axis: Vec2, aim: Option<Vec3>) {
        self.move_intent = Vec3::ZERO;
        if self.is_dead() {
            return;
        }
        if let Some(aim) = aim {
            let to = crate::flat(aim - self.position);
            if to.length_squared() > FLAT_EPSILON_SQ {
                self.yaw = crate::yaw_of(to);
            }
        }

        let axis = Vec2::new(
            if axis.x.abs() < 0.01 { 0.0 } else { axis.x },
            if axis.y.abs() < 0.01 { 0.0 } else { axis.y },
        )
        .clamp_length_max(1.0);
        let forward = self.forward();
        let right = Vec3::new(forward.z, 0.0, -forward.x);
        self.move_intent = (forward * axis.y + right * axis.x) * self.move_speed;
    }

    /// Fixed step: follow the leap if one is running, otherwise walk
    pub fn integrate(&mut self, dt: f32) {
        if self.is_dead() {
            return;
        }
        if let Some(leap) = &mut self.leap {
            self.position = leap.advance(dt);
            if leap.is_finished() {
                self.leap = None;
            }
            return;
        }
        self.position += self.move_intent * dt;
    }

    /// Abort a running leap, dropping the player to the ground where it is
    pub fn cancel_leap(&mut self) {
        if let Some(leap) = self.leap.take() {
            self.position = leap.grounded_position();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player() -> Player {
        Player::new(&PlayerConfig::default(), Vec3::ZERO)
    }

    #[test]
    fn test_multi_level_up_in_one_grant() {
        let mut p = player();
        assert_eq!(p.add_experience(12.0), 2);
        assert_eq!(p.level(), 3);
        assert_eq!(p.experience(), 0.0);
        assert_eq!(p.experience_to_next_level(), 10.0);
    }

    #[test]
    fn test_flat_curve_settles_huge_grant() {
        let mut p = Player::new(
            &PlayerConfig {
                experience_to_next_level: 1.0,
                experience_growth: 1.0,
                ..PlayerConfig::default()
            },
            Vec3::ZERO,
        );
        assert_eq!(p.add_experience(1.0e9), 1_000_000_000);
        assert_eq!(p.level(), 1_000_000_001);
        assert_eq!(p.experience(), 0.0);
        assert_eq!(p.experience_to_next_level(), 1.0);

        assert_eq!(p.add_experience(2.5), 2);
        assert_eq!(p.experience(), 0.5);
    }

    #[test]
    fn test_experience_ignores_bad_amounts() {
        let mut p = player();
        assert_eq!(p.add_experience(0.0), 0);
        assert_eq!(p.add_experience(-3.0), 0);
        assert_eq!(p.add_experience(f32::NAN), 0);
        assert_eq!(p.add_experience(f32::INFINITY), 0);
        assert_eq!(p.experience(), 0.0);
    }

    #[test]
    fn test_dead_player_gains_nothing() {
        let mut p = player();
        assert!(p.take_damage(500.0));
        assert_eq!(p.add_experience(100.0), 0);
        assert_eq!(p.level(), 1);
    }

    #[test]
    fn test_death_reported_once() {
        let mut p = player();
        assert!(!p.take_damage(60.0));
        assert!(p.take_damage(60.0));
        assert!(!p.take_damage(60.0));
        assert_eq!(p.hp(), 0.0);
    }

    #[test]
    fn test_heal_and_max_hp() {
        let mut p = player();
        p.take_damage(30.0);
        p.heal(25.0);
        assert_eq!(p.hp(), 95.0);
        p.heal(25.0);
        assert_eq!(p.hp(), 100.0);

        p.add_max_hp(20.0);
        assert_eq!(p.max_hp(), 120.0);
        assert_eq!(p.hp(), 120.0);
        p.add_max_hp(-5.0);
        assert_eq!(p.max_hp(), 120.0);
    }

    #[test]
    fn test_move_speed_floors_at_zero() {
        let mut p = player();
        p.add_move_speed(0.6);
        assert!((p.move_speed() - 6.6).abs() < 1e-5);
        p.add_move_speed(-100.0);
        assert_eq!(p.move_speed(), 0.0);
    }

    #[test]
    fn test_try_take_upgrade_once() {
        let mut p = player();
        assert!(!p.has_upgrade("gun_pierce_on"));
        assert!(p.try_take_upgrade("gun_pierce_on"));
        assert!(!p.try_take_upgrade("gun_pierce_on"));
        assert!(p.has_upgrade("gun_pierce_on"));
        assert!(!p.try_take_upgrade(""));
    }

    #[test]
    fn test_moves_relative_to_facing() {
        let mut p = player();
        // Aim along +X: forward becomes +X, right becomes -Z
        p.decide(Vec2::new(0.0, 1.0), Some(Vec3::new(10.0, 0.0, 0.0)));
        p.integrate(0.5);
        assert!((p.position - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);

        p.decide(Vec2::new(1.0, 0.0), None);
        p.integrate(0.5);
        assert!((p.position - Vec3::new(3.0, 0.0, -3.0)).length() < 1e-4);
    }

    #[test]
    fn test_leap_overrides_walking_and_cancel_grounds() {
        let mut p = player();
        p.leap = Some(Leap::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0), 1.5, 0.4));
        p.decide(Vec2::new(1.0, 0.0), None);
        p.integrate(0.2);
        assert!(p.position.y > 1.0);

        p.cancel_leap();
        assert!(p.leap.is_none());
        assert_eq!(p.position.y, 0.0);
        assert!((p.position.z - 2.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_split_grants_match_single_grant(a in 0u16..400, b in 0u16..400) {
            let mut split = player();
            split.add_experience(a as f32);
            split.add_experience(b as f32);

            let mut whole = player();
            whole.add_experience(a as f32 + b as f32);

            prop_assert_eq!(split.level(), whole.level());
            prop_assert_eq!(split.experience(), whole.experience());
            prop_assert!(whole.experience() < whole.experience_to_next_level());
        }
    }
}
