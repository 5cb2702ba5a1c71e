//! PhysicsBox - particle sandbox with arcade game modes
//!
//! Core modules:
//! - `sim`: Round simulation (registry, forces, collisions, game modes)
//! - `ledger`: High score, coins, achievements and shop unlocks
//! - `settings`: Slider/tool configuration
//! - `persistence`: Key-value store abstraction
//! - `platform`: Frame timing, pointer mapping and the browser surface
//! - `session`: Owns the ledger, settings and the current round

pub mod ledger;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use ledger::{HighScore, Ledger};
pub use session::{Hud, Pointer, Session};
pub use settings::{Settings, Tool};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the host frame callback)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Ticks per second of logical time
    pub const TICKS_PER_SECOND: f64 = 60.0;
    /// Milliseconds of logical time per tick
    pub const TICK_MS: f64 = 1000.0 / TICKS_PER_SECOND;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Arena dimensions (simulation units)
    pub const ARENA_WIDTH: f32 = 1200.0;
    pub const ARENA_HEIGHT: f32 = 700.0;

    /// Hard cap on live particles, regardless of mode
    pub const MAX_PARTICLES: usize = 50_000;

    /// Gravity slider multiplier (units/s² per slider unit)
    pub const GRAVITY_SCALE: f32 = 900.0;
}

/// Convert a millisecond delay into a whole number of ticks (at least one)
#[inline]
pub fn ms_to_ticks(ms: f64) -> u64 {
    ((ms * consts::TICKS_PER_SECOND / 1000.0).ceil() as u64).max(1)
}

/// Unit direction from `from` toward `to`, or zero when the points coincide
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Center of the arena
#[inline]
pub fn arena_center() -> Vec2 {
    Vec2::new(consts::ARENA_WIDTH / 2.0, consts::ARENA_HEIGHT / 2.0)
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
