//! Read-only presentation snapshot
//!
//! Captured from an [`Encounter`] after a frame; nothing here feeds back
//! into the simulation.

use serde::Serialize;

use crate::sim::Encounter;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HudSnapshot {
    pub hp: f32,
    pub max_hp: f32,
    pub level: u32,
    pub experience: f32,
    pub experience_to_next_level: f32,
    /// Equipped weapon, if any
    pub weapon: Option<String>,
    pub wave: u32,
    pub enemies_alive: usize,
    pub paused: bool,
    /// Titles of the open upgrade choices
    pub upgrade_choices: Vec<String>,
    pub over: bool,
}

impl HudSnapshot {
    pub fn capture(enc: &Encounter) -> Self {
        let upgrade_choices = enc
            .director
            .prompt()
            .map(|p| {
                p.choices
                    .iter()
                    .map(|id| {
                        enc.catalog
                            .get(id)
                            .map_or_else(|| id.clone(), |d| d.title.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            hp: enc.player.hp(),
            max_hp: enc.player.max_hp(),
            level: enc.player.level(),
            experience: enc.player.experience(),
            experience_to_next_level: enc.player.experience_to_next_level(),
            weapon: enc.loadout.current().map(|w| w.name.clone()),
            wave: enc.director.wave(),
            enemies_alive: enc.roster.alive_count(),
            paused: enc.is_paused(),
            upgrade_choices,
            over: enc.is_over(),
        }
    }

    /// One-line text form for logs and terminals
    pub fn summary(&self) -> String {
        format!(
            "HP {}/{} | Lv {} ({}/{}) | {} | Wave {} | {} alive{}",
            self.hp.ceil(),
            self.max_hp.ceil(),
            self.level,
            self.experience,
            self.experience_to_next_level,
            self.weapon.as_deref().unwrap_or("-"),
            self.wave,
            self.enemies_alive,
            if self.paused { " | PAUSED" } else { "" },
        )
    }
}
