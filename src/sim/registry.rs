//! Particle registry
//!
//! The side table of gameplay metadata keyed by physics body id. A body is a
//! particle exactly when it has an entry here; the registry is the only code
//! that creates or destroys particle bodies, so the engine and the table never
//! disagree about which particles exist.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::engine::{BodyDesc, BodyId, Material, PhysicsEngine, Shape};
use crate::consts::MAX_PARTICLES;

/// Maximum number of trail points to store
pub const TRAIL_LENGTH: usize = 20;

/// Radius used when the caller does not override it
pub const DEFAULT_PARTICLE_RADIUS: f32 = 5.0;

/// Ambient temperature for the neighbor-force buoyancy term
pub const AMBIENT_TEMPERATURE: f32 = 20.0;

/// Material kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Standard,
    Granular,
    Fluid,
    HighEnergy,
    Dense,
    Explosive,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 6] = [
        ParticleKind::Standard,
        ParticleKind::Granular,
        ParticleKind::Fluid,
        ParticleKind::HighEnergy,
        ParticleKind::Dense,
        ParticleKind::Explosive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleKind::Standard => "balls",
            ParticleKind::Granular => "sand",
            ParticleKind::Fluid => "water",
            ParticleKind::HighEnergy => "plasma",
            ParticleKind::Dense => "metal",
            ParticleKind::Explosive => "explosive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "balls" | "standard" => Some(ParticleKind::Standard),
            "sand" | "granular" => Some(ParticleKind::Granular),
            "water" | "fluid" => Some(ParticleKind::Fluid),
            "plasma" | "high-energy" => Some(ParticleKind::HighEnergy),
            "metal" | "dense" => Some(ParticleKind::Dense),
            "explosive" => Some(ParticleKind::Explosive),
            _ => None,
        }
    }

    /// Fixed restitution / friction / density / air-drag profile
    pub fn material(&self) -> Material {
        let (restitution, friction, density, air_drag) = match self {
            ParticleKind::Standard => (0.8, 0.5, 0.001, 0.01),
            ParticleKind::Granular => (0.1, 0.9, 0.002, 0.01),
            ParticleKind::Fluid => (0.1, 0.1, 0.0005, 0.02),
            ParticleKind::HighEnergy => (1.2, 0.01, 0.0005, 0.0),
            ParticleKind::Dense => (0.3, 0.8, 0.003, 0.01),
            ParticleKind::Explosive => (0.6, 0.5, 0.001, 0.01),
        };
        Material {
            restitution,
            friction,
            density,
            air_drag,
        }
    }

    /// Body shape for a given base size
    pub fn shape(&self, size: f32) -> Shape {
        match self {
            ParticleKind::Granular => Shape::Rect {
                width: size * 1.5,
                height: size * 1.5,
            },
            ParticleKind::Dense => Shape::Rect {
                width: size * 2.0,
                height: size * 2.0,
            },
            ParticleKind::Fluid => Shape::Circle { radius: size * 0.8 },
            _ => Shape::Circle { radius: size },
        }
    }
}

/// Collection palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParticleColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl ParticleColor {
    pub const ALL: [ParticleColor; 4] = [
        ParticleColor::Red,
        ParticleColor::Blue,
        ParticleColor::Green,
        ParticleColor::Yellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleColor::Red => "red",
            ParticleColor::Blue => "blue",
            ParticleColor::Green => "green",
            ParticleColor::Yellow => "yellow",
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Gameplay metadata attached to a particle body
#[derive(Debug, Clone)]
pub struct ParticleMeta {
    pub kind: ParticleKind,
    pub enemy: bool,
    pub color: Option<ParticleColor>,
    pub explosive: bool,
    /// One-shot guard: set the moment a blast claims this particle
    pub exploded: bool,
    pub charge: f32,
    pub temperature: f32,
    /// Recent positions, newest first
    pub trail: Option<VecDeque<Vec2>>,
}

/// Per-spawn adjustments on top of the kind's profile
#[derive(Debug, Clone, Default)]
pub struct SpawnOverrides {
    pub size: Option<f32>,
    pub restitution: Option<f32>,
    pub velocity: Option<Vec2>,
    pub enemy: bool,
    pub color: Option<ParticleColor>,
    pub charge: Option<f32>,
    pub temperature: Option<f32>,
    pub trail: bool,
}

/// Why a spawn produced no particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRejection {
    /// Global live-particle cap reached
    HardCap,
    /// The round's cumulative spawn budget is used up
    BudgetExhausted,
}

/// How spawns are counted against the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPolicy {
    /// Sandbox: nothing is counted, only the hard cap applies
    Unlimited,
    /// Every successful spawn is counted; optionally capped
    Counted { budget: Option<u32> },
}

/// Authoritative set of live particles
#[derive(Debug, Clone)]
pub struct ParticleRegistry {
    particles: BTreeMap<BodyId, ParticleMeta>,
    policy: SpawnPolicy,
    particles_spawned: u32,
    cap: usize,
}

impl ParticleRegistry {
    pub fn new(policy: SpawnPolicy) -> Self {
        Self::with_cap(policy, MAX_PARTICLES)
    }

    pub fn with_cap(policy: SpawnPolicy, cap: usize) -> Self {
        Self {
            particles: BTreeMap::new(),
            policy,
            particles_spawned: 0,
            cap,
        }
    }

    /// Number of live particles
    pub fn count(&self) -> usize {
        self.particles.len()
    }

    /// Successful counted spawns this round (removed particles included)
    pub fn particles_spawned(&self) -> u32 {
        self.particles_spawned
    }

    pub fn policy(&self) -> SpawnPolicy {
        self.policy
    }

    /// Spawns left before the budget is exhausted (None = unlimited)
    pub fn budget_remaining(&self) -> Option<u32> {
        match self.policy {
            SpawnPolicy::Counted {
                budget: Some(budget),
            } => Some(budget.saturating_sub(self.particles_spawned)),
            _ => None,
        }
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.particles.contains_key(&id)
    }

    pub fn get(&self, id: BodyId) -> Option<&ParticleMeta> {
        self.particles.get(&id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut ParticleMeta> {
        self.particles.get_mut(&id)
    }

    /// Live particle ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.particles.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &ParticleMeta)> + '_ {
        self.particles.iter().map(|(&id, meta)| (id, meta))
    }

    /// Check the hard cap and the budget without creating anything
    pub fn admit(&self) -> Result<(), SpawnRejection> {
        if self.particles.len() >= self.cap {
            return Err(SpawnRejection::HardCap);
        }
        if let Some(0) = self.budget_remaining() {
            return Err(SpawnRejection::BudgetExhausted);
        }
        Ok(())
    }

    /// Create a particle body and its registry entry
    pub fn spawn(
        &mut self,
        engine: &mut impl PhysicsEngine,
        position: Vec2,
        kind: ParticleKind,
        overrides: &SpawnOverrides,
    ) -> Result<BodyId, SpawnRejection> {
        self.admit()?;

        let mut material = kind.material();
        if let Some(restitution) = overrides.restitution {
            material.restitution = restitution;
        }
        let size = overrides.size.unwrap_or(DEFAULT_PARTICLE_RADIUS);
        let mut desc = BodyDesc::dynamic(kind.shape(size), position, material);
        desc.velocity = overrides.velocity.unwrap_or(Vec2::ZERO);
        let id = engine.add_body(desc);

        let default_charge = if kind == ParticleKind::HighEnergy { 1.0 } else { 0.0 };
        self.particles.insert(
            id,
            ParticleMeta {
                kind,
                enemy: overrides.enemy,
                color: overrides.color,
                explosive: kind == ParticleKind::Explosive,
                exploded: false,
                charge: overrides.charge.unwrap_or(default_charge),
                temperature: overrides.temperature.unwrap_or(AMBIENT_TEMPERATURE),
                trail: overrides
                    .trail
                    .then(|| VecDeque::with_capacity(TRAIL_LENGTH)),
            },
        );

        if matches!(self.policy, SpawnPolicy::Counted { .. }) {
            self.particles_spawned += 1;
        }
        Ok(id)
    }

    /// Spawn `count` particles scattered inside a `spread`-wide square
    ///
    /// Stops at the first rejection and returns what was created.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_burst(
        &mut self,
        engine: &mut impl PhysicsEngine,
        rng: &mut impl Rng,
        center: Vec2,
        spread: f32,
        count: usize,
        kind: ParticleKind,
        overrides: &SpawnOverrides,
    ) -> Vec<BodyId> {
        let mut spawned = Vec::with_capacity(count);
        let half = spread.max(0.0) / 2.0;
        for _ in 0..count {
            let offset = if half > 0.0 {
                Vec2::new(rng.random_range(-half..half), rng.random_range(-half..half))
            } else {
                Vec2::ZERO
            };
            match self.spawn(engine, center + offset, kind, overrides) {
                Ok(id) => spawned.push(id),
                Err(reason) => {
                    log::debug!("Burst stopped after {} spawns: {:?}", spawned.len(), reason);
                    break;
                }
            }
        }
        spawned
    }

    /// Detach a particle from the world; no-op for unknown or removed ids
    pub fn remove(&mut self, engine: &mut impl PhysicsEngine, id: BodyId) -> bool {
        if self.particles.remove(&id).is_none() {
            return false;
        }
        engine.remove_body(id);
        true
    }

    /// Remove every particle
    pub fn clear(&mut self, engine: &mut impl PhysicsEngine) {
        for id in self.particles.keys() {
            engine.remove_body(*id);
        }
        self.particles.clear();
    }

    /// Drop entries whose body has disappeared from the engine
    pub fn reconcile(&mut self, engine: &impl PhysicsEngine) -> usize {
        let before = self.particles.len();
        self.particles.retain(|id, _| engine.contains(*id));
        let dropped = before - self.particles.len();
        if dropped > 0 {
            log::warn!("Reconciled {} orphaned particle entries", dropped);
        }
        dropped
    }

    /// Push current positions into every trail buffer
    pub fn record_trails(&mut self, engine: &impl PhysicsEngine) {
        for (id, meta) in self.particles.iter_mut() {
            let Some(trail) = meta.trail.as_mut() else {
                continue;
            };
            if let Some(pos) = engine.position(*id) {
                trail.push_front(pos);
                trail.truncate(TRAIL_LENGTH);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::ArcadeWorld;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_sandbox_burst_does_not_count_spawns() {
        let mut world = ArcadeWorld::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut registry = ParticleRegistry::new(SpawnPolicy::Unlimited);

        let before = registry.count();
        let ids = registry.spawn_burst(
            &mut world,
            &mut rng,
            Vec2::new(500.0, 100.0),
            200.0,
            500,
            ParticleKind::Standard,
            &SpawnOverrides::default(),
        );
        assert_eq!(ids.len(), 500);
        assert_eq!(registry.count(), before + 500);
        assert_eq!(registry.particles_spawned(), 0);
        assert_eq!(world.dynamic_count(), 500);
    }

    #[test]
    fn test_budget_rejects_and_survives_removal() {
        let mut world = ArcadeWorld::default();
        let mut registry = ParticleRegistry::new(SpawnPolicy::Counted { budget: Some(2) });
        let overrides = SpawnOverrides::default();

        let a = registry
            .spawn(&mut world, Vec2::new(10.0, 10.0), ParticleKind::Standard, &overrides)
            .unwrap();
        registry
            .spawn(&mut world, Vec2::new(20.0, 10.0), ParticleKind::Fluid, &overrides)
            .unwrap();
        registry.remove(&mut world, a);

        // Removed particles still count against the budget
        let third = registry.spawn(&mut world, Vec2::new(30.0, 10.0), ParticleKind::Dense, &overrides);
        assert_eq!(third, Err(SpawnRejection::BudgetExhausted));
        assert_eq!(registry.particles_spawned(), 2);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_hard_cap() {
        let mut world = ArcadeWorld::default();
        let mut registry = ParticleRegistry::with_cap(SpawnPolicy::Unlimited, 3);
        let overrides = SpawnOverrides::default();
        for _ in 0..3 {
            assert!(registry.spawn(&mut world, Vec2::splat(50.0), ParticleKind::Standard, &overrides).is_ok());
        }
        let rejected = registry.spawn(&mut world, Vec2::splat(50.0), ParticleKind::Standard, &overrides);
        assert_eq!(rejected, Err(SpawnRejection::HardCap));
        assert_eq!(world.dynamic_count(), 3);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut world = ArcadeWorld::default();
        let mut registry = ParticleRegistry::new(SpawnPolicy::Unlimited);
        let id = registry
            .spawn(&mut world, Vec2::splat(50.0), ParticleKind::Explosive, &SpawnOverrides::default())
            .unwrap();
        assert!(registry.get(id).unwrap().explosive);

        assert!(registry.remove(&mut world, id));
        let count = registry.count();
        assert!(!registry.remove(&mut world, id));
        assert_eq!(registry.count(), count);
        assert!(!world.contains(id));
    }

    #[test]
    fn test_trail_is_bounded() {
        let mut world = ArcadeWorld::default();
        let mut registry = ParticleRegistry::new(SpawnPolicy::Unlimited);
        let overrides = SpawnOverrides {
            trail: true,
            ..Default::default()
        };
        let id = registry
            .spawn(&mut world, Vec2::splat(100.0), ParticleKind::Standard, &overrides)
            .unwrap();
        for _ in 0..(TRAIL_LENGTH * 2) {
            world.step(1.0 / 60.0);
            registry.record_trails(&world);
        }
        let trail = registry.get(id).unwrap().trail.as_ref().unwrap();
        assert_eq!(trail.len(), TRAIL_LENGTH);
    }

    #[test]
    fn test_reconcile_drops_orphans() {
        let mut world = ArcadeWorld::default();
        let mut registry = ParticleRegistry::new(SpawnPolicy::Unlimited);
        let id = registry
            .spawn(&mut world, Vec2::splat(100.0), ParticleKind::Standard, &SpawnOverrides::default())
            .unwrap();
        world.remove_body(id);
        assert_eq!(registry.reconcile(&world), 1);
        assert_eq!(registry.count(), 0);
    }

    proptest! {
        #[test]
        fn prop_count_tracks_live_handles(ops in prop::collection::vec((any::<bool>(), 0usize..16), 1..120)) {
            let mut world = ArcadeWorld::default();
            let cap = 24;
            let mut registry = ParticleRegistry::with_cap(SpawnPolicy::Unlimited, cap);
            let mut live: Vec<BodyId> = Vec::new();

            for (spawn, pick) in ops {
                if spawn {
                    if let Ok(id) = registry.spawn(&mut world, Vec2::splat(100.0), ParticleKind::Standard, &SpawnOverrides::default()) {
                        live.push(id);
                    }
                } else if !live.is_empty() {
                    let id = live[pick % live.len()];
                    // Removing twice must look the same as removing once
                    registry.remove(&mut world, id);
                    registry.remove(&mut world, id);
                    live.retain(|&l| l != id);
                }
                prop_assert_eq!(registry.count(), live.len());
                prop_assert!(registry.count() <= cap);
                prop_assert_eq!(world.dynamic_count(), live.len());
            }
        }
    }
}
