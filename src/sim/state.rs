//! Encounter state and core world types
//!
//! Everything one run of the arena needs lives in [`Encounter`]; the tick
//! functions in `tick.rs` advance it.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::director::EncounterDirector;
use super::enemy::{Archetype, Roster};
use super::loadout::Loadout;
use super::progression::Player;
use super::projectile::Projectile;
use super::spatial::{BruteForceIndex, EnemyId};
use super::spawner::WaveSpawner;
use super::task::TimedTask;
use super::upgrades::UpgradeCatalog;
use super::weapon::{BEAM_FLASH_SECS, BeamTrace, SlowPuddle};
use crate::config::EncounterConfig;
use crate::consts::*;

/// Last beam shot, held briefly for presentation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamFlash {
    pub trace: BeamTrace,
    pub task: TimedTask,
}

impl BeamFlash {
    pub fn new(trace: BeamTrace) -> Self {
        Self {
            trace,
            task: TimedTask::new(BEAM_FLASH_SECS),
        }
    }
}

/// Notable things that happened during a tick, drained by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WaveStarted { wave: u32, count: u32 },
    EnemyKilled { id: EnemyId, archetype: Archetype },
    /// `gained` levels settled by one kill, ending at `level`
    LevelUp { level: u32, gained: u32 },
    UpgradeApplied { id: String },
    PlayerHit { amount: f32 },
    PlayerDied,
}

/// Complete encounter state
#[derive(Debug, Clone)]
pub struct Encounter {
    /// Run seed for reproducibility
    pub seed: u64,
    pub director: EncounterDirector,
    pub player: Player,
    pub loadout: Loadout,
    /// Live enemies (sorted by id for determinism)
    pub roster: Roster,
    pub projectiles: Vec<Projectile>,
    pub puddles: Vec<SlowPuddle>,
    pub beam_flash: Option<BeamFlash>,
    pub spawner: WaveSpawner,
    pub catalog: UpgradeCatalog,
    /// Rebuilt from actor colliders at the start of every decision tick
    pub index: BruteForceIndex,
    pub rng: Pcg32,
    /// Seconds between contact hits from the same enemy
    pub touch_interval: f32,
    /// Decision ticks run so far
    pub time_ticks: u64,
    /// Fixed-step time not yet integrated
    pub(crate) accumulator: f32,
    pub(crate) events: Vec<GameEvent>,
}

impl Encounter {
    /// Create an encounter from a (validated) config
    pub fn new(config: &EncounterConfig) -> Self {
        let weapons = config.weapons.clone();
        Self {
            seed: config.seed,
            director: EncounterDirector::new(),
            player: Player::new(&config.player, config.player_start),
            loadout: Loadout::new(weapons.melee, weapons.gun, weapons.beam),
            roster: Roster::new(),
            projectiles: Vec::new(),
            puddles: Vec::new(),
            beam_flash: None,
            spawner: WaveSpawner::new(config.spawner.clone(), config.archetypes.clone()),
            catalog: config.upgrades.clone(),
            index: BruteForceIndex::new(config.walls.clone()),
            rng: Pcg32::seed_from_u64(config.seed),
            touch_interval: config.touch_interval.max(0.0),
            time_ticks: 0,
            accumulator: 0.0,
            events: Vec::new(),
        }
    }

    /// Default tuning with the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self::new(&EncounterConfig {
            seed,
            ..EncounterConfig::default()
        })
    }

    pub fn is_over(&self) -> bool {
        self.director.is_over()
    }

    pub fn is_paused(&self) -> bool {
        self.director.is_paused()
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Aim point used when the caller supplies none: straight ahead
    pub fn fallback_aim(&self) -> Vec3 {
        self.player.position + self.player.forward() * FALLBACK_AIM_DISTANCE
    }

    /// Replace the spatial index contents with the current actor colliders
    pub fn rebuild_index(&mut self) {
        let player = (!self.player.is_dead()).then(|| self.player.collider());
        self.index.rebuild(self.roster.colliders().chain(player));
    }

    /// Advance one frame: a decision tick at `frame_dt` followed by as many
    /// fixed integration steps as the accumulated time allows
    pub fn advance(&mut self, input: &super::tick::TickInput, frame_dt: f32) {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        super::tick::tick(self, input, dt);

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            super::tick::integrate(self, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }
}
