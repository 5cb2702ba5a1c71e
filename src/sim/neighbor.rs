//! Neighbor forces: buoyancy, crowding jitter and charge interaction
//!
//! A pure batch computation over a position snapshot. The result may be
//! applied a tick (or more) later, so [`apply`] skips particles that have
//! left the registry in the meantime.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;

use super::engine::{BodyId, PhysicsEngine};
use super::registry::{AMBIENT_TEMPERATURE, ParticleRegistry};

/// Default spatial-hash cell size
pub const NEIGHBOR_CELL_SIZE: f32 = 60.0;
/// Radius that counts as "neighbor"
pub const NEIGHBOR_RADIUS: f32 = 60.0;
/// Charges interact only closer than this
pub const CHARGE_RANGE: f32 = 120.0;
/// Buoyancy per degree above ambient (negative is up)
pub const BUOYANCY_COEFF: f32 = -0.00002;
/// Jitter per neighbor above the crowding threshold
pub const CROWD_JITTER: f32 = 0.000002;
/// Neighbor count (self included) above which jitter kicks in
pub const CROWD_THRESHOLD: usize = 3;
/// Coulomb-style coefficient for charge pairs
pub const CHARGE_COEFF: f32 = 0.00002;
/// Helper forces are tiny solver units; this maps them onto engine forces
pub const NEIGHBOR_FORCE_SCALE: f32 = 1.0e4;

/// One particle as seen by the helper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub id: BodyId,
    pub position: Vec2,
    pub charge: f32,
    pub temperature: f32,
}

/// Capture the live particles' positions and neighbor-relevant tags
pub fn snapshot(registry: &ParticleRegistry, engine: &impl PhysicsEngine) -> Vec<Sample> {
    registry
        .iter()
        .filter_map(|(id, meta)| {
            engine.position(id).map(|position| Sample {
                id,
                position,
                charge: meta.charge,
                temperature: meta.temperature,
            })
        })
        .collect()
}

fn cell_of(pos: Vec2, cell_size: f32) -> (i32, i32) {
    (
        (pos.x / cell_size).floor() as i32,
        (pos.y / cell_size).floor() as i32,
    )
}

/// Compute the non-zero forces for a snapshot
pub fn compute(samples: &[Sample], cell_size: f32, rng: &mut impl Rng) -> Vec<(BodyId, Vec2)> {
    let cell_size = if cell_size > 0.0 { cell_size } else { NEIGHBOR_CELL_SIZE };
    let mut grid: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
    for (i, s) in samples.iter().enumerate() {
        grid.entry(cell_of(s.position, cell_size)).or_default().push(i);
    }

    let radius_sq = NEIGHBOR_RADIUS * NEIGHBOR_RADIUS;
    let mut forces = Vec::new();
    let mut neighbors: Vec<usize> = Vec::new();

    for p in samples {
        let mut force = Vec2::ZERO;

        if (p.temperature - AMBIENT_TEMPERATURE).abs() > 0.1 {
            force.y += (p.temperature - AMBIENT_TEMPERATURE) * BUOYANCY_COEFF;
        }

        neighbors.clear();
        let (cx, cy) = cell_of(p.position, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                neighbors.extend(
                    bucket
                        .iter()
                        .copied()
                        .filter(|&j| samples[j].position.distance_squared(p.position) <= radius_sq),
                );
            }
        }

        if neighbors.len() > CROWD_THRESHOLD {
            let f = (neighbors.len() - CROWD_THRESHOLD) as f32 * CROWD_JITTER;
            force += Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * f;
        }

        if p.charge != 0.0 {
            for &j in &neighbors {
                let q = &samples[j];
                if q.id == p.id || q.charge == 0.0 {
                    continue;
                }
                let delta = q.position - p.position;
                let dist = match delta.length() {
                    d if d > 0.0 => d,
                    _ => 0.01,
                };
                if dist < CHARGE_RANGE {
                    let magnitude = p.charge * q.charge * CHARGE_COEFF / (dist * dist);
                    force -= delta * magnitude;
                }
            }
        }

        if force != Vec2::ZERO {
            forces.push((p.id, force));
        }
    }
    forces
}

/// Apply computed forces; returns how many landed on live particles
pub fn apply(engine: &mut impl PhysicsEngine, registry: &ParticleRegistry, forces: &[(BodyId, Vec2)]) -> usize {
    let mut applied = 0;
    for &(id, force) in forces {
        if !registry.contains(id) {
            continue;
        }
        engine.apply_force(id, force * NEIGHBOR_FORCE_SCALE);
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::{ParticleKind, SpawnOverrides, SpawnPolicy};
    use crate::sim::world::ArcadeWorld;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn sample(id: u32, x: f32, y: f32, charge: f32, temperature: f32) -> Sample {
        Sample {
            id: BodyId(id),
            position: Vec2::new(x, y),
            charge,
            temperature,
        }
    }

    #[test]
    fn test_idle_particles_produce_nothing() {
        let mut rng = Pcg32::seed_from_u64(1);
        let samples = [sample(1, 0.0, 0.0, 0.0, 20.0), sample(2, 30.0, 0.0, 0.0, 20.0)];
        assert!(compute(&samples, NEIGHBOR_CELL_SIZE, &mut rng).is_empty());
    }

    #[test]
    fn test_hot_particle_rises() {
        let mut rng = Pcg32::seed_from_u64(1);
        let forces = compute(&[sample(1, 100.0, 100.0, 0.0, 70.0)], NEIGHBOR_CELL_SIZE, &mut rng);
        assert_eq!(forces.len(), 1);
        assert!(forces[0].1.y < 0.0);
        assert_eq!(forces[0].1.x, 0.0);
    }

    #[test]
    fn test_like_charges_repel() {
        let mut rng = Pcg32::seed_from_u64(1);
        let samples = [sample(1, 100.0, 100.0, 1.0, 20.0), sample(2, 130.0, 100.0, 1.0, 20.0)];
        let forces = compute(&samples, NEIGHBOR_CELL_SIZE, &mut rng);
        assert_eq!(forces.len(), 2);
        assert!(forces[0].1.x < 0.0);
        assert!(forces[1].1.x > 0.0);
    }

    #[test]
    fn test_crowding_jitter() {
        let mut rng = Pcg32::seed_from_u64(3);
        let samples: Vec<Sample> = (0..6).map(|i| sample(i, 100.0 + i as f32, 100.0, 0.0, 20.0)).collect();
        let forces = compute(&samples, NEIGHBOR_CELL_SIZE, &mut rng);
        assert_eq!(forces.len(), 6);
        for (_, f) in forces {
            assert!(f.abs().max_element() <= 0.5 * 3.0 * CROWD_JITTER + 1e-9);
        }
    }

    #[test]
    fn test_apply_skips_stale_ids() {
        let mut world = ArcadeWorld::default();
        let mut registry = ParticleRegistry::new(SpawnPolicy::Unlimited);
        let hot = SpawnOverrides {
            temperature: Some(90.0),
            ..Default::default()
        };
        let a = registry
            .spawn(&mut world, Vec2::splat(100.0), ParticleKind::Standard, &hot)
            .unwrap();
        let b = registry
            .spawn(&mut world, Vec2::splat(400.0), ParticleKind::Standard, &hot)
            .unwrap();

        let mut rng = Pcg32::seed_from_u64(5);
        let forces = compute(&snapshot(&registry, &world), NEIGHBOR_CELL_SIZE, &mut rng);
        registry.remove(&mut world, b);

        assert_eq!(apply(&mut world, &registry, &forces), 1);
        assert!(registry.contains(a));
    }
}
