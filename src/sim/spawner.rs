//! Wave spawning: population size, archetype mix, difficulty scaling and
//! clearance-checked placement

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::{Archetype, EnemyTemplate, Roster};
use super::spatial::{CategoryMask, EnemyId, SpatialQuery};

/// First wave at which ranged and tank enemies can appear
pub const MIXED_WAVE_START: u32 = 3;
/// Upper bound on the random first-shot delay of ranged enemies
pub const MAX_SHOOT_DELAY: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Anchors enemies spawn around
    pub spawn_points: Vec<Vec3>,
    pub base_count: u32,
    pub max_count: u32,
    pub hp_per_wave: f32,
    pub damage_per_wave: f32,
    pub scatter_radius: f32,
    /// Clearance a placement needs from enemies and walls
    pub check_radius: f32,
    pub spawn_tries: u32,
    /// With clearance checks off, enemies spawn exactly on the anchor
    pub check_clearance: bool,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_points: vec![
                Vec3::new(18.0, 0.0, 0.0),
                Vec3::new(-18.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 18.0),
                Vec3::new(0.0, 0.0, -18.0),
            ],
            base_count: 3,
            max_count: 25,
            hp_per_wave: 0.08,
            damage_per_wave: 0.05,
            scatter_radius: 2.0,
            check_radius: 0.8,
            spawn_tries: 12,
            check_clearance: true,
        }
    }
}

impl SpawnerConfig {
    pub fn sanitized(mut self) -> Self {
        self.base_count = self.base_count.max(1);
        self.max_count = self.max_count.max(self.base_count);
        self.hp_per_wave = self.hp_per_wave.max(0.0);
        self.damage_per_wave = self.damage_per_wave.max(0.0);
        self.scatter_radius = self.scatter_radius.max(0.0);
        self.check_radius = self.check_radius.max(0.01);
        self.spawn_tries = self.spawn_tries.clamp(1, 50);
        self
    }
}

/// Spawnable definition per archetype; a missing one disables spawning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeTemplates {
    pub melee: Option<EnemyTemplate>,
    pub ranged: Option<EnemyTemplate>,
    pub tank: Option<EnemyTemplate>,
}

impl Default for ArchetypeTemplates {
    fn default() -> Self {
        Self {
            melee: Some(EnemyTemplate::melee()),
            ranged: Some(EnemyTemplate::ranged()),
            tank: Some(EnemyTemplate::tank()),
        }
    }
}

impl ArchetypeTemplates {
    pub fn get(&self, archetype: Archetype) -> Option<&EnemyTemplate> {
        match archetype {
            Archetype::Melee => self.melee.as_ref(),
            Archetype::Ranged => self.ranged.as_ref(),
            Archetype::Tank => self.tank.as_ref(),
        }
    }

    fn is_complete(&self) -> bool {
        self.melee.is_some() && self.ranged.is_some() && self.tank.is_some()
    }
}

/// Derived numbers for one wave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavePlan {
    pub index: u32,
    pub count: u32,
    pub hp_multiplier: f32,
    pub damage_multiplier: f32,
}

impl WavePlan {
    pub fn for_wave(index: u32, config: &SpawnerConfig) -> Self {
        let count = config
            .base_count
            .saturating_add(index)
            .clamp(config.base_count, config.max_count.max(config.base_count));
        Self {
            index,
            count,
            hp_multiplier: 1.0 + index as f32 * config.hp_per_wave,
            damage_multiplier: 1.0 + index as f32 * config.damage_per_wave,
        }
    }
}

/// Archetype for one spawn given a uniform roll in [0, 1)
pub fn pick_archetype(wave: u32, roll: f32) -> Archetype {
    if wave < MIXED_WAVE_START || roll < 0.55 {
        Archetype::Melee
    } else if roll < 0.85 {
        Archetype::Ranged
    } else {
        Archetype::Tank
    }
}

#[derive(Debug, Clone)]
pub struct WaveSpawner {
    config: SpawnerConfig,
    templates: ArchetypeTemplates,
    /// Enemies this spawner is waiting on; dead entries are dropped lazily
    tracked: Vec<EnemyId>,
}

impl WaveSpawner {
    pub fn new(config: SpawnerConfig, templates: ArchetypeTemplates) -> Self {
        Self {
            config: config.sanitized(),
            templates,
            tracked: Vec::new(),
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Spawn wave `index` into the roster.
    ///
    /// Returns `None` (with a warning) when spawn points or an archetype
    /// template are missing; nothing is spawned in that case.
    pub fn spawn_wave<R: Rng + ?Sized>(
        &mut self,
        index: u32,
        roster: &mut Roster,
        query: &dyn SpatialQuery,
        rng: &mut R,
    ) -> Option<WavePlan> {
        if self.config.spawn_points.is_empty() {
            log::warn!("No spawn points configured, wave {index} skipped");
            return None;
        }
        if !self.templates.is_complete() {
            log::warn!("One or more enemy archetypes are missing, wave {index} skipped");
            return None;
        }

        self.prune(roster);
        let plan = WavePlan::for_wave(index, &self.config);
        let mut placed: Vec<EnemyId> = Vec::with_capacity(plan.count as usize);

        for _ in 0..plan.count {
            let anchor =
                self.config.spawn_points[rng.random_range(0..self.config.spawn_points.len())];
            let archetype = pick_archetype(index, rng.random::<f32>());
            let Some(template) = self.templates.get(archetype) else {
                continue;
            };
            let position = self.place(anchor, roster, &placed, query, rng);
            let shoot_delay = rng.random_range(0.0..MAX_SHOOT_DELAY);

            let id = roster.spawn(template, position, shoot_delay);
            if let Some(enemy) = roster.get_mut(id) {
                enemy.apply_wave_scaling(plan.hp_multiplier, plan.damage_multiplier);
            }
            log::debug!("Spawned {archetype:?} #{id} at {position}");
            placed.push(id);
        }

        log::info!(
            "Wave {} spawned: {} enemies (hp x{:.2}, dmg x{:.2})",
            index, plan.count, plan.hp_multiplier, plan.damage_multiplier
        );
        self.tracked.extend(placed);
        Some(plan)
    }

    /// Random clear point near `anchor`, or the anchor itself when every
    /// try is blocked
    fn place<R: Rng + ?Sized>(
        &self,
        anchor: Vec3,
        roster: &Roster,
        placed: &[EnemyId],
        query: &dyn SpatialQuery,
        rng: &mut R,
    ) -> Vec3 {
        if !self.config.check_clearance {
            return anchor;
        }
        let check = self.config.check_radius;
        for _ in 0..self.config.spawn_tries {
            let angle = rng.random_range(0.0..TAU);
            let dist = self.config.scatter_radius * rng.random::<f32>().sqrt();
            let candidate = anchor + Vec3::new(angle.cos() * dist, 0.0, angle.sin() * dist);

            let blocked = !query
                .overlap(candidate, check, CategoryMask::ENEMY | CategoryMask::WALL)
                .is_empty()
                || placed
                    .iter()
                    .filter_map(|&id| roster.get(id))
                    .any(|e| e.collider().overlaps_sphere(candidate, check));
            if !blocked {
                return candidate;
            }
        }
        log::debug!("No clear spot near {anchor}, using the anchor");
        anchor
    }

    fn prune(&mut self, roster: &Roster) {
        self.tracked.retain(|&id| roster.is_alive(id));
    }

    pub fn alive_count(&mut self, roster: &Roster) -> usize {
        self.prune(roster);
        self.tracked.len()
    }

    /// True once every enemy this spawner tracks is dead
    pub fn is_wave_cleared(&mut self, roster: &Roster) -> bool {
        self.alive_count(roster) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spatial::{BruteForceIndex, Wall};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spawner(config: SpawnerConfig) -> WaveSpawner {
        WaveSpawner::new(config, ArchetypeTemplates::default())
    }

    #[test]
    fn test_wave_plan_numbers() {
        let plan = WavePlan::for_wave(5, &SpawnerConfig::default());
        assert_eq!(plan.count, 8);
        assert!((plan.hp_multiplier - 1.4).abs() < 1e-6);
        assert!((plan.damage_multiplier - 1.25).abs() < 1e-6);

        assert_eq!(WavePlan::for_wave(100, &SpawnerConfig::default()).count, 25);
    }

    #[test]
    fn test_archetype_thresholds() {
        assert_eq!(pick_archetype(2, 0.99), Archetype::Melee);
        assert_eq!(pick_archetype(3, 0.54), Archetype::Melee);
        assert_eq!(pick_archetype(3, 0.55), Archetype::Ranged);
        assert_eq!(pick_archetype(3, 0.84), Archetype::Ranged);
        assert_eq!(pick_archetype(3, 0.85), Archetype::Tank);
    }

    #[test]
    fn test_spawn_wave_scales_and_tracks() {
        let mut s = spawner(SpawnerConfig::default());
        let mut roster = Roster::new();
        let index = BruteForceIndex::default();
        let mut rng = Pcg32::seed_from_u64(3);

        let plan = s.spawn_wave(5, &mut roster, &index, &mut rng).unwrap();
        assert_eq!(roster.len(), 8);
        assert_eq!(s.alive_count(&roster), 8);
        for e in roster.iter() {
            let base = EnemyTemplate::melee().stats.max_hp;
            if e.archetype() == Archetype::Melee {
                assert!((e.max_hp() - base * plan.hp_multiplier).abs() < 1e-4);
                assert_eq!(e.hp(), e.max_hp());
            }
        }
    }

    #[test]
    fn test_early_waves_are_melee_only() {
        let mut s = spawner(SpawnerConfig::default());
        let mut roster = Roster::new();
        let mut rng = Pcg32::seed_from_u64(11);
        s.spawn_wave(2, &mut roster, &BruteForceIndex::default(), &mut rng);
        assert!(roster.iter().all(|e| e.archetype() == Archetype::Melee));
    }

    #[test]
    fn test_rejects_without_spawn_points_or_templates() {
        let mut roster = Roster::new();
        let index = BruteForceIndex::default();
        let mut rng = Pcg32::seed_from_u64(0);

        let mut no_points = spawner(SpawnerConfig {
            spawn_points: Vec::new(),
            ..SpawnerConfig::default()
        });
        assert!(no_points.spawn_wave(1, &mut roster, &index, &mut rng).is_none());

        let mut no_tank = WaveSpawner::new(
            SpawnerConfig::default(),
            ArchetypeTemplates {
                tank: None,
                ..ArchetypeTemplates::default()
            },
        );
        assert!(no_tank.spawn_wave(1, &mut roster, &index, &mut rng).is_none());
        assert!(roster.is_empty());
    }

    #[test]
    fn test_blocked_placement_falls_back_to_anchor() {
        let anchor = Vec3::new(5.0, 0.0, 5.0);
        let mut s = spawner(SpawnerConfig {
            spawn_points: vec![anchor],
            ..SpawnerConfig::default()
        });
        let index = BruteForceIndex::new(vec![Wall::new(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(10.0, 3.0, 10.0),
        )]);
        let mut roster = Roster::new();
        let mut rng = Pcg32::seed_from_u64(5);
        s.spawn_wave(1, &mut roster, &index, &mut rng);
        assert!(roster.iter().all(|e| e.position == anchor));
    }

    #[test]
    fn test_clear_placement_stays_in_scatter_radius() {
        let anchor = Vec3::new(0.0, 0.0, 20.0);
        let mut s = spawner(SpawnerConfig {
            spawn_points: vec![anchor],
            scatter_radius: 6.0,
            ..SpawnerConfig::default()
        });
        let mut roster = Roster::new();
        let mut rng = Pcg32::seed_from_u64(21);
        s.spawn_wave(2, &mut roster, &BruteForceIndex::default(), &mut rng);
        assert!(roster.iter().all(|e| e.position.distance(anchor) <= 6.0 + 1e-4));
    }

    #[test]
    fn test_without_clearance_spawns_on_anchor() {
        let anchor = Vec3::new(1.0, 0.0, 2.0);
        let mut s = spawner(SpawnerConfig {
            spawn_points: vec![anchor],
            check_clearance: false,
            ..SpawnerConfig::default()
        });
        let mut roster = Roster::new();
        let mut rng = Pcg32::seed_from_u64(2);
        s.spawn_wave(1, &mut roster, &BruteForceIndex::default(), &mut rng);
        assert_eq!(roster.len(), 4);
        assert!(roster.iter().all(|e| e.position == anchor));
    }

    #[test]
    fn test_wave_cleared_after_all_die() {
        let mut s = spawner(SpawnerConfig::default());
        let mut roster = Roster::new();
        let mut rng = Pcg32::seed_from_u64(8);
        assert!(s.is_wave_cleared(&roster));

        s.spawn_wave(1, &mut roster, &BruteForceIndex::default(), &mut rng);
        assert!(!s.is_wave_cleared(&roster));

        let ids: Vec<_> = roster.iter().map(|e| e.id).collect();
        for id in ids {
            roster.damage(id, 1e6);
        }
        assert!(s.is_wave_cleared(&roster));
        roster.prune_dead();
        assert!(s.is_wave_cleared(&roster));
    }
}
