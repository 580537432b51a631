//! Encounter configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Loaded once at startup; the simulation never reads files.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::{ArchetypeTemplates, PlayerConfig, SpawnerConfig, UpgradeCatalog, Wall, Weapon};

/// Weapon per loadout slot; `null` leaves the slot empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponsConfig {
    pub melee: Option<Weapon>,
    pub gun: Option<Weapon>,
    pub beam: Option<Weapon>,
}

impl Default for WeaponsConfig {
    fn default() -> Self {
        Self {
            melee: Some(Weapon::blade()),
            gun: Some(Weapon::gun()),
            beam: Some(Weapon::laser()),
        }
    }
}

/// Complete encounter tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// RNG seed for the run
    pub seed: u64,
    pub player: PlayerConfig,
    pub player_start: Vec3,
    pub archetypes: ArchetypeTemplates,
    pub spawner: SpawnerConfig,
    pub weapons: WeaponsConfig,
    pub upgrades: UpgradeCatalog,
    /// Static obstacles
    pub walls: Vec<Wall>,
    /// Seconds between contact hits from the same enemy
    pub touch_interval: f32,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            player: PlayerConfig::default(),
            player_start: Vec3::ZERO,
            archetypes: ArchetypeTemplates::default(),
            spawner: SpawnerConfig::default(),
            weapons: WeaponsConfig::default(),
            upgrades: UpgradeCatalog::standard(),
            walls: Vec::new(),
            touch_interval: 0.6,
        }
    }
}

impl EncounterConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded encounter config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make the simulation meaningless.
    ///
    /// Missing spawn points or archetypes are not errors: the spawner warns
    /// and stands down at runtime instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn below(v: f32, min: f32) -> bool {
            v.is_nan() || v < min
        }
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::InvalidValue {
                field,
                reason: reason.into(),
            }
        }

        if self.player.max_hp.is_nan() || self.player.max_hp <= 0.0 {
            return Err(invalid("player.max_hp", "must be positive"));
        }
        if below(self.player.experience_growth, 1.0) {
            return Err(invalid("player.experience_growth", "must be at least 1"));
        }
        if below(self.player.experience_to_next_level, 1.0) {
            return Err(invalid("player.experience_to_next_level", "must be at least 1"));
        }
        if self.spawner.max_count < self.spawner.base_count {
            return Err(invalid(
                "spawner.max_count",
                format!(
                    "{} is below base_count {}",
                    self.spawner.max_count, self.spawner.base_count
                ),
            ));
        }
        if below(self.touch_interval, 0.0) {
            return Err(invalid("touch_interval", "must not be negative"));
        }
        for (slot, weapon) in [
            ("weapons.melee", &self.weapons.melee),
            ("weapons.gun", &self.weapons.gun),
            ("weapons.beam", &self.weapons.beam),
        ] {
            if let Some(w) = weapon {
                if w.fire_rate.is_nan() || w.fire_rate <= 0.0 {
                    return Err(invalid(slot, format!("{} needs a positive fire_rate", w.name)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EncounterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upgrades.len(), 13);
        assert_eq!(config.touch_interval, 0.6);
        assert_eq!(config.spawner.base_count, 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EncounterConfig::from_json_str(
            r#"{
                "seed": 42,
                "player": { "max_hp": 150 },
                "spawner": { "spawn_points": [[1, 0, 2]] },
                "weapons": { "beam": null },
                "walls": [{ "min": [0, 0, 0], "max": [1, 2, 1] }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.player.max_hp, 150.0);
        assert_eq!(config.player.move_speed, 6.0);
        assert_eq!(config.spawner.spawn_points, vec![Vec3::new(1.0, 0.0, 2.0)]);
        assert_eq!(config.spawner.max_count, 25);
        assert!(config.weapons.beam.is_none());
        assert!(config.weapons.gun.is_some());
        assert_eq!(config.walls.len(), 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EncounterConfig::from_json_str(r#"{ "player": { "experience_growth": 0.5 } }"#);
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue { field: "player.experience_growth", .. })
        ));

        let err = EncounterConfig::from_json_str(r#"{ "spawner": { "base_count": 10, "max_count": 5 } }"#);
        assert!(matches!(err, Err(ConfigError::InvalidValue { field: "spawner.max_count", .. })));
    }

    #[test]
    fn test_rejects_duplicate_upgrade_ids() {
        let err = EncounterConfig::from_json_str(
            r#"{ "upgrades": [
                { "id": "a", "title": "A", "effect": { "kind": "heal", "amount": 5 } },
                { "id": "a", "title": "A", "effect": { "kind": "heal", "amount": 5 } }
            ] }"#,
        );
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = EncounterConfig::load("/definitely/not/here.json");
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = EncounterConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back = EncounterConfig::from_json_str(&json).unwrap();
        assert_eq!(back.upgrades, config.upgrades);
        assert_eq!(back.weapons, config.weapons);
    }
}
