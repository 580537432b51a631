//! Horde Arena - wave-survival combat core
//!
//! Core modules:
//! - `sim`: Combat and progression simulation (steering, weapons, waves, upgrades)
//! - `config`: Data-driven encounter tuning
//! - `hud`: Read-only presentation snapshots
//! - `error`: Startup configuration errors

pub mod config;
pub mod error;
pub mod hud;
pub mod sim;

pub use config::EncounterConfig;
pub use error::ConfigError;
pub use hud::HudSnapshot;

use glam::Vec3;

/// Simulation constants
pub mod consts {
    /// Fixed integration timestep (50 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted by the driver
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Squared planar distance under which a direction is considered degenerate
    pub const FLAT_EPSILON_SQ: f32 = 0.01;
    /// Squared length under which a steering sum produces no motion
    pub const STEER_EPSILON_SQ: f32 = 0.001;
    /// Squared neighbour distance ignored by separation (coincident actors)
    pub const SEPARATION_EPSILON_SQ: f32 = 0.0001;

    /// Slow multipliers are clamped to this floor
    pub const MIN_SLOW_MULTIPLIER: f32 = 0.05;

    /// Height of the melee sweep origin above the owner
    pub const MELEE_ORIGIN_HEIGHT: f32 = 1.0;
    /// Muzzle height above an actor's feet
    pub const MUZZLE_HEIGHT: f32 = 1.0;
    /// Aim distance used when no external aim point is available
    pub const FALLBACK_AIM_DISTANCE: f32 = 50.0;

    /// Default actor collider dimensions
    pub const ACTOR_RADIUS: f32 = 0.5;
    pub const ACTOR_HEIGHT: f32 = 2.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Project a vector onto the ground plane (drop the Y component)
#[inline]
pub fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Yaw (radians) of a planar direction; forward is +Z
#[inline]
pub fn yaw_of(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

/// Unit forward vector for a yaw angle
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Turn `current` toward `target` by at most `max_step` radians
pub fn rotate_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = normalize_angle(target - current);
    let step = delta.clamp(-max_step.max(0.0), max_step.max(0.0));
    normalize_angle(current + step)
}
