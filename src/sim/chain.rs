//! Chain reactions: explosive particles caught in a blast go off later

use super::engine::{BodyId, PhysicsEngine};
use super::forces::{Explosion, ForceField};
use super::registry::ParticleRegistry;
use super::schedule::{Scheduler, Task};
use crate::ms_to_ticks;

/// Delay between consecutive secondaries triggered by one scan (ms)
pub const CHAIN_STAGGER_MS: f64 = 50.0;
/// Secondary power relative to the parent blast
pub const CHAIN_POWER_FACTOR: f32 = 0.7;
/// Secondary radius relative to the parent blast
pub const CHAIN_RADIUS_FACTOR: f32 = 1.2;

/// Find unexploded explosive particles inside half the radius of any active
/// blast, claim them, and queue their secondaries. Returns how many were queued.
pub fn scan(
    field: &ForceField,
    engine: &impl PhysicsEngine,
    registry: &mut ParticleRegistry,
    scheduler: &mut Scheduler,
    now_tick: u64,
) -> usize {
    if !field.has_active() {
        return 0;
    }
    let stagger = ms_to_ticks(CHAIN_STAGGER_MS);
    let mut triggered: Vec<(BodyId, f32, f32)> = Vec::new();

    for explosion in field.explosions() {
        let reach = explosion.radius / 2.0;
        for (id, meta) in registry.iter() {
            if !meta.explosive || meta.exploded || triggered.iter().any(|t| t.0 == id) {
                continue;
            }
            let Some(pos) = engine.position(id) else {
                continue;
            };
            if pos.distance(explosion.origin) < reach {
                triggered.push((
                    id,
                    explosion.power * CHAIN_POWER_FACTOR,
                    explosion.radius * CHAIN_RADIUS_FACTOR,
                ));
            }
        }
    }

    for (i, &(particle, power, radius)) in triggered.iter().enumerate() {
        if let Some(meta) = registry.get_mut(particle) {
            meta.exploded = true;
        }
        scheduler.schedule_at(
            now_tick + (i as u64 + 1) * stagger,
            Task::SecondaryExplosion {
                particle,
                power,
                radius,
            },
        );
    }
    if !triggered.is_empty() {
        log::debug!("Chain scan queued {} secondaries", triggered.len());
    }
    triggered.len()
}

/// Fire a queued secondary; false if its particle is already gone
pub fn fire(
    field: &mut ForceField,
    engine: &mut impl PhysicsEngine,
    registry: &mut ParticleRegistry,
    particle: BodyId,
    power: f32,
    radius: f32,
) -> bool {
    if !registry.contains(particle) {
        return false;
    }
    let Some(origin) = engine.position(particle) else {
        return false;
    };
    registry.remove(engine, particle);
    field.detonate(Explosion::new(origin, power, radius));
    true
}
