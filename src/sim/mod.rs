//! Deterministic combat simulation
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (enemies sorted by id)
//! - Decisions and movement in separate phases
//! - No rendering, input-device or platform dependencies

pub mod autopilot;
pub mod director;
pub mod enemy;
pub mod loadout;
pub mod progression;
pub mod projectile;
pub mod spatial;
pub mod spawner;
pub mod state;
pub mod steering;
pub mod task;
pub mod tick;
pub mod upgrades;
pub mod weapon;

pub use director::{EncounterDirector, PickOutcome, UpgradePrompt};
pub use enemy::{Archetype, Enemy, EnemyKind, EnemyStats, EnemyTemplate, KillReport, RangedStats, Roster};
pub use loadout::Loadout;
pub use progression::{Player, PlayerConfig};
pub use projectile::{Faction, Projectile};
pub use spatial::{
    ActorHandle, BruteForceIndex, CategoryMask, Collider, Contact, EnemyId, RayHit, SpatialQuery, Wall,
};
pub use spawner::{ArchetypeTemplates, SpawnerConfig, WavePlan, WaveSpawner};
pub use state::{BeamFlash, Encounter, GameEvent};
pub use task::TimedTask;
pub use tick::{TickInput, integrate, tick};
pub use upgrades::{UpgradeCatalog, UpgradeDefinition, UpgradeEffect};
pub use weapon::{
    AimContext, BeamParams, BeamTrace, FireOutcome, GunParams, Leap, MeleeParams, SlowPuddle, Weapon,
    WeaponKind, WeaponSlot,
};
