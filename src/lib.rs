//! Horde Survivor - A top-down survival arcade simulation
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (entities, weapons, spawner, collisions)
//! - `progression`: XP, level-ups, upgrade offers and run phases
//! - `session`: Glue between a frame callback and the simulation
//! - `tuning`: Data-driven game balance

pub mod progression;
pub mod session;
pub mod sim;
pub mod tuning;

pub use progression::{GamePhase, ProgressionController, Upgrade};
pub use session::{FrameClock, Session};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Default viewport the camera centers on
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;

    /// Largest frame delta the session will feed into the simulation
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Seconds between monster spawns
    pub const SPAWN_INTERVAL: f32 = 1.2;
    /// Spawn ring radius as a fraction of the larger viewport side
    pub const SPAWN_DISTANCE_FACTOR: f32 = 0.7;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 200.0;
    pub const PLAYER_ATTACK_POWER: f32 = 10.0;
    pub const PLAYER_COLLECTION_RANGE: f32 = 50.0;
    pub const PLAYER_MAX_HP: f32 = 100.0;

    /// Attack power that maps to 100% weapon damage
    pub const ATTACK_POWER_BASELINE: f32 = 10.0;

    /// Pickup magnet acceleration (units/s²) and speed cap
    pub const PICKUP_ACCELERATION: f32 = 500.0;
    pub const PICKUP_MAX_SPEED: f32 = 600.0;
    /// Distance at which a pickup is actually collected
    pub const PICKUP_RADIUS: f32 = 15.0;

    /// Weapon cadence discount per level, and the floor it is clamped to
    pub const CADENCE_DISCOUNT_PER_LEVEL: f32 = 0.1;
    pub const MIN_CADENCE_FACTOR: f32 = 0.5;

    /// Highest level any weapon can reach
    pub const MAX_WEAPON_LEVEL: u32 = 8;

    /// XP needed for the first level-up and the growth per level
    pub const BASE_MAX_XP: u32 = 100;
    pub const XP_GROWTH: f32 = 1.2;
}

/// Normalized angle to [-π, π]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit vector from `from` toward `to`, or zero when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Angle of the vector from `from` toward `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
