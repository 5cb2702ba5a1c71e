//! Force fields applied to particles before each physics step
//!
//! All magnitudes below are accelerations; they are multiplied by the body's
//! mass before being handed to the engine so every material responds alike.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collider::ColliderSet;
use super::engine::{BodyId, PhysicsEngine};
use super::registry::ParticleRegistry;

/// Life lost per tick by an explosion
pub const EXPLOSION_DECAY: f32 = 0.05;
/// Blast radius for user-triggered explosions
pub const EXPLOSION_RADIUS: f32 = 150.0;
/// Wind acceleration per slider unit
pub const WIND_SCALE: f32 = 10.0;
/// Magnet reach
pub const MAGNET_RANGE: f32 = 200.0;
/// Magnet acceleration numerator per slider unit (divided by distance²)
pub const MAGNET_SCALE: f32 = 50_000.0;
/// Closest distance used in the magnet falloff
const MAGNET_MIN_DIST: f32 = 20.0;
/// Explosion acceleration numerator per unit of power (divided by distance + 1)
pub const EXPLOSION_SCALE: f32 = 5_000.0;
/// Constant pull on survival enemies toward the core; enemies do not feel gravity
pub const CORE_PULL: f32 = 300.0;

/// Above this many particles magnets only process every 3rd particle
pub const MAGNET_SUBSAMPLE_LIGHT: usize = 2_000;
/// Above this many particles magnets only process every 10th particle
pub const MAGNET_SUBSAMPLE_HEAVY: usize = 5_000;

/// A transient blast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub origin: Vec2,
    pub power: f32,
    pub radius: f32,
    /// Normalized remaining life (1 = fresh)
    pub life: f32,
}

impl Explosion {
    pub fn new(origin: Vec2, power: f32, radius: f32) -> Self {
        Self {
            origin,
            power,
            radius,
            life: 1.0,
        }
    }

    /// Outward acceleration on a point at `pos` (zero outside the radius)
    pub fn push_at(&self, pos: Vec2) -> Vec2 {
        let delta = pos - self.origin;
        let dist = delta.length();
        if dist >= self.radius || dist < 1e-6 {
            return Vec2::ZERO;
        }
        delta / dist * (self.power * EXPLOSION_SCALE * self.life / (dist + 1.0))
    }
}

/// Per-tick inputs to the force field
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldParams {
    pub wind: f32,
    pub magnet_strength: f32,
    /// World gravity acceleration for this tick
    pub gravity: Vec2,
    /// Survival core position, if the round has one
    pub core: Option<Vec2>,
    /// Logical tick, rotates the magnet subsample
    pub tick: u64,
}

/// Particle stride for magnet processing at a given population
pub fn magnet_stride(count: usize) -> usize {
    if count > MAGNET_SUBSAMPLE_HEAVY {
        10
    } else if count > MAGNET_SUBSAMPLE_LIGHT {
        3
    } else {
        1
    }
}

/// Particles a magnet pass touches this tick. Above the subsample
/// thresholds the starting offset rotates with the tick, so every particle
/// is visited once per `stride` ticks.
pub fn magnet_sample(registry: &ParticleRegistry, tick: u64) -> impl Iterator<Item = BodyId> + '_ {
    let stride = magnet_stride(registry.count());
    registry.ids().skip((tick % stride as u64) as usize).step_by(stride)
}

/// Active explosions plus the per-tick force pass
#[derive(Debug, Clone, Default)]
pub struct ForceField {
    explosions: Vec<Explosion>,
}

impl ForceField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detonate(&mut self, explosion: Explosion) {
        self.explosions.push(explosion);
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn has_active(&self) -> bool {
        !self.explosions.is_empty()
    }

    pub fn clear(&mut self) {
        self.explosions.clear();
    }

    /// Apply wind, magnets, explosions and core pull, then age explosions
    pub fn apply(
        &mut self,
        engine: &mut impl PhysicsEngine,
        registry: &ParticleRegistry,
        colliders: &ColliderSet,
        params: &FieldParams,
    ) {
        if params.wind != 0.0 {
            let accel = Vec2::new(params.wind * WIND_SCALE, 0.0);
            for id in registry.ids() {
                push(engine, id, accel);
            }
        }

        if params.magnet_strength != 0.0 {
            let magnets: Vec<Vec2> = colliders.magnets().collect();
            if !magnets.is_empty() {
                for id in magnet_sample(registry, params.tick) {
                    let Some(pos) = engine.position(id) else {
                        continue;
                    };
                    let mut accel = Vec2::ZERO;
                    for &magnet in &magnets {
                        let to_magnet = magnet - pos;
                        let dist = to_magnet.length();
                        if dist > 0.0 && dist < MAGNET_RANGE {
                            let d = dist.max(MAGNET_MIN_DIST);
                            accel += to_magnet / dist * (params.magnet_strength * MAGNET_SCALE / (d * d));
                        }
                    }
                    push(engine, id, accel);
                }
            }
        }

        if !self.explosions.is_empty() {
            for id in registry.ids() {
                let Some(pos) = engine.position(id) else {
                    continue;
                };
                let accel: Vec2 = self.explosions.iter().map(|e| e.push_at(pos)).sum();
                push(engine, id, accel);
            }
            for explosion in &mut self.explosions {
                explosion.life -= EXPLOSION_DECAY;
            }
            self.explosions.retain(|e| e.life > 1e-4);
        }

        if let Some(core) = params.core {
            for (id, meta) in registry.iter() {
                if !meta.enemy {
                    continue;
                }
                if let Some(pos) = engine.position(id) {
                    let pull = (core - pos).normalize_or_zero() * CORE_PULL;
                    push(engine, id, pull - params.gravity);
                }
            }
        }
    }
}

fn push(engine: &mut impl PhysicsEngine, id: BodyId, accel: Vec2) {
    if accel == Vec2::ZERO {
        return;
    }
    if let Some(mass) = engine.mass(id) {
        engine.apply_force(id, accel * mass);
    }
}
