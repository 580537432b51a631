//! Upgrade catalog, the two-choice draw and effect application

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::loadout::Loadout;
use super::progression::Player;
use super::weapon::{Weapon, WeaponSlot};
use crate::error::ConfigError;

/// What an upgrade does when applied.
///
/// `slot: None` targets whichever weapon is currently equipped. Weapon
/// effects whose slot is empty do nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradeEffect {
    AddMaxHp { amount: f32 },
    Heal { amount: f32 },
    /// Add `fraction` of the current move speed
    MoveSpeedScale { fraction: f32 },
    WeaponDamage { slot: Option<WeaponSlot>, multiplier: f32 },
    /// Add `fraction` of the current fire rate
    WeaponFireRate { slot: Option<WeaponSlot>, fraction: f32 },
    MeleeRadius { add: f32 },
    MeleeAngle { add: f32 },
    ProjectileSpeed { multiplier: f32 },
    Pierce,
    BeamRange { multiplier: f32 },
    BeamMaxHits { add: i32 },
}

fn weapon(loadout: &mut Loadout, slot: Option<WeaponSlot>) -> Option<&mut Weapon> {
    match slot {
        Some(s) => loadout.slot_mut(s),
        None => loadout.current_mut(),
    }
}

impl UpgradeEffect {
    fn apply(&self, player: &mut Player, loadout: &mut Loadout) {
        match *self {
            UpgradeEffect::AddMaxHp { amount } => player.add_max_hp(amount),
            UpgradeEffect::Heal { amount } => player.heal(amount),
            UpgradeEffect::MoveSpeedScale { fraction } => {
                let add = player.move_speed() * fraction;
                player.add_move_speed(add);
            }
            UpgradeEffect::WeaponDamage { slot, multiplier } => {
                if let Some(w) = weapon(loadout, slot) {
                    w.mul_damage(multiplier);
                }
            }
            UpgradeEffect::WeaponFireRate { slot, fraction } => {
                if let Some(w) = weapon(loadout, slot) {
                    let add = w.fire_rate * fraction;
                    w.add_fire_rate(add);
                }
            }
            UpgradeEffect::MeleeRadius { add } => {
                if let Some(w) = loadout.slot_mut(WeaponSlot::Melee) {
                    w.add_radius(add);
                }
            }
            UpgradeEffect::MeleeAngle { add } => {
                if let Some(w) = loadout.slot_mut(WeaponSlot::Melee) {
                    w.add_angle(add);
                }
            }
            UpgradeEffect::ProjectileSpeed { multiplier } => {
                if let Some(w) = loadout.slot_mut(WeaponSlot::Projectile) {
                    w.mul_projectile_speed(multiplier);
                }
            }
            UpgradeEffect::Pierce => {
                if let Some(w) = loadout.slot_mut(WeaponSlot::Projectile) {
                    w.set_pierce(true);
                }
            }
            UpgradeEffect::BeamRange { multiplier } => {
                if let Some(w) = loadout.slot_mut(WeaponSlot::Beam) {
                    w.mul_range(multiplier);
                }
            }
            UpgradeEffect::BeamMaxHits { add } => {
                if let Some(w) = loadout.slot_mut(WeaponSlot::Beam) {
                    w.add_max_hits(add);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub id: String,
    pub title: String,
    pub effect: UpgradeEffect,
    #[serde(default)]
    pub one_time: bool,
}

impl UpgradeDefinition {
    fn new(id: &str, title: &str, effect: UpgradeEffect) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            effect,
            one_time: false,
        }
    }

    fn once(mut self) -> Self {
        self.one_time = true;
        self
    }
}

/// Immutable set of upgrade definitions with unique ids
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UpgradeCatalog {
    entries: Vec<UpgradeDefinition>,
}

impl UpgradeCatalog {
    /// Validate and build a catalog; ids must be non-empty and unique
    pub fn new(entries: Vec<UpgradeDefinition>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for e in &entries {
            if e.id.is_empty() {
                return Err(ConfigError::EmptyUpgradeId);
            }
            if !seen.insert(e.id.as_str()) {
                return Err(ConfigError::DuplicateUpgradeId(e.id.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// The stock thirteen upgrades
    pub fn standard() -> Self {
        Self {
            entries: standard_entries(),
        }
    }

    pub fn entries(&self) -> &[UpgradeDefinition] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&UpgradeDefinition> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn eligible<'a>(&'a self, player: &Player) -> Vec<&'a UpgradeDefinition> {
        self.entries
            .iter()
            .filter(|e| !(e.one_time && player.has_upgrade(&e.id)))
            .collect()
    }

    /// One uniformly random entry the player may still take
    pub fn random_choice<R: Rng + ?Sized>(
        &self,
        player: &Player,
        rng: &mut R,
    ) -> Option<&UpgradeDefinition> {
        let eligible = self.eligible(player);
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[rng.random_range(0..eligible.len())])
    }

    /// Up to two distinct eligible entries, sampled without replacement.
    ///
    /// Returns one entry when only one is eligible and none when the
    /// catalog is exhausted.
    pub fn draw_pair<R: Rng + ?Sized>(&self, player: &Player, rng: &mut R) -> Vec<&UpgradeDefinition> {
        let eligible = self.eligible(player);
        let amount = eligible.len().min(2);
        rand::seq::index::sample(rng, eligible.len(), amount)
            .into_iter()
            .map(|i| eligible[i])
            .collect()
    }

    /// Apply an upgrade. One-time entries claim their id first; a failed
    /// claim applies nothing and returns false.
    pub fn apply(def: &UpgradeDefinition, player: &mut Player, loadout: &mut Loadout) -> bool {
        if def.one_time && !player.try_take_upgrade(&def.id) {
            log::debug!("Rejected repeat of one-time upgrade {}", def.id);
            return false;
        }
        def.effect.apply(player, loadout);
        log::info!("Applied upgrade {} ({})", def.id, def.title);
        true
    }
}

impl Default for UpgradeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for UpgradeCatalog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<UpgradeDefinition>::deserialize(deserializer)?;
        UpgradeCatalog::new(entries).map_err(serde::de::Error::custom)
    }
}

fn standard_entries() -> Vec<UpgradeDefinition> {
    use UpgradeEffect::*;
    vec![
        UpgradeDefinition::new("hp_max_20", "+20 Max HP", AddMaxHp { amount: 20.0 }),
        UpgradeDefinition::new("heal_25", "Heal +25", Heal { amount: 25.0 }),
        UpgradeDefinition::new("move_speed_10p", "+10% Move Speed", MoveSpeedScale { fraction: 0.10 }),
        UpgradeDefinition::new(
            "weapon_damage_20p",
            "+20% Weapon Damage",
            WeaponDamage { slot: None, multiplier: 1.20 },
        ),
        UpgradeDefinition::new(
            "weapon_firerate_15p",
            "+15% Fire Rate",
            WeaponFireRate { slot: None, fraction: 0.15 },
        ),
        UpgradeDefinition::new("melee_radius_up", "Melee: +0.4 Radius", MeleeRadius { add: 0.4 }),
        UpgradeDefinition::new("melee_angle_up", "Melee: +20° Arc", MeleeAngle { add: 20.0 }),
        UpgradeDefinition::new(
            "melee_damage_25p",
            "Melee: +25% Damage",
            WeaponDamage { slot: Some(WeaponSlot::Melee), multiplier: 1.25 },
        ),
        UpgradeDefinition::new(
            "gun_proj_speed_up",
            "Gun: +20% Bullet Speed",
            ProjectileSpeed { multiplier: 1.20 },
        ),
        UpgradeDefinition::new("gun_pierce_on", "Gun: Piercing Shots", Pierce).once(),
        UpgradeDefinition::new("beam_range_up", "Beam: +25% Range", BeamRange { multiplier: 1.25 }),
        UpgradeDefinition::new("beam_hits_up", "Beam: +2 Targets", BeamMaxHits { add: 2 }),
        UpgradeDefinition::new(
            "beam_damage_25p",
            "Beam: +25% Damage",
            WeaponDamage { slot: Some(WeaponSlot::Beam), multiplier: 1.25 },
        ),
    ]
}
