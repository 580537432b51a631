//! Straight-line projectiles with lifetime and faction-based hits

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::spatial::{ActorHandle, CategoryMask, SpatialQuery};

/// Default projectile lifetime in seconds
pub const PROJECTILE_LIFE: f32 = 3.0;

/// The side a projectile damages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    /// Fired by the player, damages enemies
    Enemy,
    /// Fired by enemies, damages the player
    Player,
}

impl Faction {
    pub fn mask(self) -> CategoryMask {
        match self {
            Faction::Enemy => CategoryMask::ENEMY,
            Faction::Player => CategoryMask::PLAYER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub position: Vec3,
    /// Unit direction of travel
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub pierce: bool,
    pub target: Faction,
    pub remaining_life: f32,
    /// Set once a non-piercing projectile connects
    pub spent: bool,
    /// Actors already struck (a piercing shot hits each actor once)
    #[serde(skip)]
    struck: Vec<ActorHandle>,
}

impl Projectile {
    pub fn new(
        position: Vec3,
        direction: Vec3,
        speed: f32,
        damage: f32,
        pierce: bool,
        target: Faction,
    ) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            speed: speed.max(0.0),
            damage,
            pierce,
            target,
            remaining_life: PROJECTILE_LIFE,
            spent: false,
            struck: Vec::new(),
        }
    }

    pub fn with_life(mut self, life: f32) -> Self {
        self.remaining_life = life;
        self
    }

    /// Advance one tick and return the actors struck along the way.
    ///
    /// `is_live` filters out actors that died earlier in the tick but have
    /// not been pruned yet.
    pub fn step(
        &mut self,
        dt: f32,
        query: &dyn SpatialQuery,
        is_live: impl Fn(ActorHandle) -> bool,
    ) -> Vec<ActorHandle> {
        let mut struck = Vec::new();
        if self.is_expired() {
            return struck;
        }

        let travel = self.speed * dt;
        let hits = query.raycast(self.position, self.direction, travel, self.target.mask());
        for hit in hits {
            let Some(handle) = hit.owner else { continue };
            if self.struck.contains(&handle) || !is_live(handle) {
                continue;
            }
            self.struck.push(handle);
            struck.push(handle);
            if !self.pierce {
                self.position = hit.point;
                self.spent = true;
                return struck;
            }
        }

        self.position += self.direction * travel;
        self.remaining_life -= dt;
        struck
    }

    pub fn is_expired(&self) -> bool {
        self.spent || self.remaining_life <= 0.0
    }
}
