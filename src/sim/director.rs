//! Encounter director: wave counter, pause state and the
//! level-up -> upgrade prompt -> resume cycle

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::KillReport;
use super::loadout::Loadout;
use super::progression::Player;
use super::upgrades::UpgradeCatalog;

/// Open upgrade offer: one or two distinct catalog ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePrompt {
    pub choices: Vec<String>,
}

/// Result of answering the upgrade prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Applied(String),
    /// One-time upgrade already claimed; the prompt stays open
    Rejected,
    NoPrompt,
    InvalidChoice,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterDirector {
    /// Last wave spawned (0 before the first)
    wave: u32,
    manual_pause: bool,
    pending_picks: u32,
    prompt: Option<UpgradePrompt>,
    /// Set once the spawner rejects a wave; no further waves are attempted
    spawning_disabled: bool,
    over: bool,
}

impl EncounterDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Manual pause or an open upgrade prompt
    pub fn is_paused(&self) -> bool {
        self.manual_pause || self.prompt.is_some()
    }

    pub fn is_manually_paused(&self) -> bool {
        self.manual_pause
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn pending_picks(&self) -> u32 {
        self.pending_picks
    }

    pub fn prompt(&self) -> Option<&UpgradePrompt> {
        self.prompt.as_ref()
    }

    pub fn spawning_disabled(&self) -> bool {
        self.spawning_disabled
    }

    /// Flip the manual pause. Ignored while a prompt is open or after the
    /// encounter has ended.
    pub fn toggle_pause(&mut self) -> bool {
        if self.over || self.prompt.is_some() {
            return false;
        }
        self.manual_pause = !self.manual_pause;
        log::info!("{}", if self.manual_pause { "Paused" } else { "Resumed" });
        true
    }

    /// Bump the wave counter ahead of a spawn
    pub fn advance_wave(&mut self) -> u32 {
        self.wave += 1;
        self.wave
    }

    pub fn disable_spawning(&mut self) {
        self.spawning_disabled = true;
    }

    /// Credit a kill and queue one pick per level gained.
    /// Returns the number of levels gained.
    pub fn record_kill<R: Rng + ?Sized>(
        &mut self,
        kill: &KillReport,
        player: &mut Player,
        catalog: &UpgradeCatalog,
        rng: &mut R,
    ) -> u32 {
        if self.over {
            return 0;
        }
        let levels = player.add_experience(kill.experience);
        self.queue_picks(levels, catalog, player, rng);
        levels
    }

    /// Queue `n` upgrade picks, opening the prompt if none is showing
    pub fn queue_picks<R: Rng + ?Sized>(
        &mut self,
        n: u32,
        catalog: &UpgradeCatalog,
        player: &Player,
        rng: &mut R,
    ) {
        if n == 0 || self.over {
            return;
        }
        self.pending_picks = self.pending_picks.saturating_add(n);
        if self.prompt.is_none() {
            self.open_prompt(catalog, player, rng);
        }
    }

    fn open_prompt<R: Rng + ?Sized>(&mut self, catalog: &UpgradeCatalog, player: &Player, rng: &mut R) {
        let choices: Vec<String> = catalog
            .draw_pair(player, rng)
            .into_iter()
            .map(|d| d.id.clone())
            .collect();
        if choices.is_empty() {
            log::warn!(
                "No eligible upgrades, dropping {} pending pick(s)",
                self.pending_picks
            );
            self.pending_picks = 0;
            return;
        }
        log::info!("Upgrade prompt: {}", choices.join(" | "));
        self.prompt = Some(UpgradePrompt { choices });
    }

    /// Answer the open prompt with choice `index`
    pub fn pick<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        catalog: &UpgradeCatalog,
        player: &mut Player,
        loadout: &mut Loadout,
        rng: &mut R,
    ) -> PickOutcome {
        let Some(prompt) = &self.prompt else {
            return PickOutcome::NoPrompt;
        };
        let Some(id) = prompt.choices.get(index).cloned() else {
            return PickOutcome::InvalidChoice;
        };
        let Some(def) = catalog.get(&id) else {
            return PickOutcome::InvalidChoice;
        };
        if !UpgradeCatalog::apply(def, player, loadout) {
            // Offer only what is still eligible; may close the prompt
            self.prompt = None;
            self.open_prompt(catalog, player, rng);
            return PickOutcome::Rejected;
        }

        self.prompt = None;
        self.pending_picks = self.pending_picks.saturating_sub(1);
        if self.pending_picks > 0 {
            self.open_prompt(catalog, player, rng);
        }
        PickOutcome::Applied(id)
    }

    /// The player died; everything stops
    pub fn end(&mut self) {
        if !self.over {
            log::info!("Encounter over on wave {}", self.wave);
        }
        self.over = true;
        self.prompt = None;
        self.pending_picks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::Archetype;
    use crate::sim::progression::PlayerConfig;
    use crate::sim::upgrades::{UpgradeDefinition, UpgradeEffect};
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn kill(experience: f32) -> KillReport {
        KillReport {
            id: 1,
            archetype: Archetype::Melee,
            experience,
        }
    }

    fn setup() -> (EncounterDirector, Player, Loadout, UpgradeCatalog, Pcg32) {
        (
            EncounterDirector::new(),
            Player::new(&PlayerConfig::default(), Vec3::ZERO),
            Loadout::standard(),
            UpgradeCatalog::standard(),
            Pcg32::seed_from_u64(42),
        )
    }

    #[test]
    fn test_level_up_opens_prompt_and_pauses() {
        let (mut d, mut p, _, catalog, mut rng) = setup();
        assert!(!d.is_paused());

        assert_eq!(d.record_kill(&kill(4.0), &mut p, &catalog, &mut rng), 0);
        assert!(d.prompt().is_none());

        assert_eq!(d.record_kill(&kill(1.0), &mut p, &catalog, &mut rng), 1);
        let prompt = d.prompt().unwrap();
        assert_eq!(prompt.choices.len(), 2);
        assert_ne!(prompt.choices[0], prompt.choices[1]);
        assert!(d.is_paused());
    }

    #[test]
    fn test_multiple_level_ups_chain_prompts() {
        let (mut d, mut p, mut loadout, catalog, mut rng) = setup();
        assert_eq!(d.record_kill(&kill(12.0), &mut p, &catalog, &mut rng), 2);
        assert_eq!(d.pending_picks(), 2);

        assert!(matches!(
            d.pick(0, &catalog, &mut p, &mut loadout, &mut rng),
            PickOutcome::Applied(_)
        ));
        assert_eq!(d.pending_picks(), 1);
        assert!(d.prompt().is_some());
        assert!(d.is_paused());

        assert!(matches!(
            d.pick(1, &catalog, &mut p, &mut loadout, &mut rng),
            PickOutcome::Applied(_)
        ));
        assert_eq!(d.pending_picks(), 0);
        assert!(d.prompt().is_none());
        assert!(!d.is_paused());
    }

    #[test]
    fn test_pick_without_prompt_or_out_of_range() {
        let (mut d, mut p, mut loadout, catalog, mut rng) = setup();
        assert_eq!(
            d.pick(0, &catalog, &mut p, &mut loadout, &mut rng),
            PickOutcome::NoPrompt
        );
        d.record_kill(&kill(5.0), &mut p, &catalog, &mut rng);
        assert_eq!(
            d.pick(5, &catalog, &mut p, &mut loadout, &mut rng),
            PickOutcome::InvalidChoice
        );
        assert!(d.prompt().is_some());
    }

    #[test]
    fn test_claimed_one_time_pick_is_rejected() {
        let (mut d, mut p, mut loadout, _, mut rng) = setup();
        let catalog = UpgradeCatalog::new(vec![UpgradeDefinition {
            id: "solo".into(),
            title: "Solo".into(),
            effect: UpgradeEffect::AddMaxHp { amount: 10.0 },
            one_time: true,
        }])
        .unwrap();

        d.record_kill(&kill(5.0), &mut p, &catalog, &mut rng);
        assert_eq!(d.prompt().unwrap().choices, vec!["solo".to_string()]);

        // Claimed behind the prompt's back
        p.try_take_upgrade("solo");
        assert_eq!(
            d.pick(0, &catalog, &mut p, &mut loadout, &mut rng),
            PickOutcome::Rejected
        );
        assert_eq!(p.max_hp(), 100.0);
        // Nothing left to offer: the pick is dropped and play resumes
        assert!(d.prompt().is_none());
        assert_eq!(d.pending_picks(), 0);
        assert!(!d.is_paused());
    }

    #[test]
    fn test_rejected_pick_redraws_remaining_choices() {
        let (mut d, mut p, mut loadout, _, mut rng) = setup();
        let entry = |id: &str, one_time: bool| UpgradeDefinition {
            id: id.into(),
            title: id.to_uppercase(),
            effect: UpgradeEffect::Heal { amount: 5.0 },
            one_time,
        };
        let catalog = UpgradeCatalog::new(vec![
            entry("once_a", true),
            entry("once_b", true),
            entry("again", false),
        ])
        .unwrap();

        d.record_kill(&kill(5.0), &mut p, &catalog, &mut rng);
        let choices = d.prompt().unwrap().choices.clone();
        assert_eq!(choices.len(), 2);
        let stale = choices.iter().position(|id| id != "again").unwrap();

        p.try_take_upgrade("once_a");
        p.try_take_upgrade("once_b");
        assert_eq!(
            d.pick(stale, &catalog, &mut p, &mut loadout, &mut rng),
            PickOutcome::Rejected
        );
        assert_eq!(d.prompt().unwrap().choices, vec!["again".to_string()]);
        assert_eq!(d.pending_picks(), 1);

        assert_eq!(
            d.pick(0, &catalog, &mut p, &mut loadout, &mut rng),
            PickOutcome::Applied("again".to_string())
        );
        assert!(!d.is_paused());
    }

    #[test]
    fn test_exhausted_catalog_drops_picks() {
        let (mut d, mut p, _, _, mut rng) = setup();
        let catalog = UpgradeCatalog::new(Vec::new()).unwrap();
        d.record_kill(&kill(12.0), &mut p, &catalog, &mut rng);
        assert!(d.prompt().is_none());
        assert_eq!(d.pending_picks(), 0);
        assert!(!d.is_paused());
    }

    #[test]
    fn test_manual_pause_ignored_while_prompt_open() {
        let (mut d, mut p, mut loadout, catalog, mut rng) = setup();
        assert!(d.toggle_pause());
        assert!(d.is_paused());
        assert!(d.toggle_pause());
        assert!(!d.is_paused());

        d.record_kill(&kill(5.0), &mut p, &catalog, &mut rng);
        assert!(!d.toggle_pause());
        d.pick(0, &catalog, &mut p, &mut loadout, &mut rng);
        assert!(!d.is_paused());
    }

    #[test]
    fn test_end_stops_everything() {
        let (mut d, mut p, _, catalog, mut rng) = setup();
        d.end();
        assert!(d.is_over());
        assert_eq!(d.record_kill(&kill(50.0), &mut p, &catalog, &mut rng), 0);
        assert!(!d.toggle_pause());
    }

    #[test]
    fn test_wave_counter_increments_before_spawn() {
        let mut d = EncounterDirector::new();
        assert_eq!(d.wave(), 0);
        assert_eq!(d.advance_wave(), 1);
        assert_eq!(d.advance_wave(), 2);
    }
}
