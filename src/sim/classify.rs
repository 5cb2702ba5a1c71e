//! Collision classifier
//!
//! Turns the engine's collision-start pairs into gameplay effects. Every pair
//! is looked at in both directions; only sensor colliders touching registered
//! particles produce a hit. Hits are applied in precedence order across the
//! whole batch, and a particle consumed by an earlier hit makes every later
//! hit on it a no-op.

use super::collider::{ColliderKind, ColliderSet};
use super::engine::{BodyId, CollisionPair, PhysicsEngine};
use super::mode::{GameMode, Round, Sort};
use super::portal::{PortalNetwork, Transit};
use super::registry::ParticleRegistry;

/// A sensor collider touching a particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub collider: BodyId,
    pub particle: BodyId,
    pub kind: ColliderKind,
}

impl Hit {
    /// Lower ranks are applied first
    fn rank(&self) -> u8 {
        match self.kind {
            ColliderKind::Core => 0,
            ColliderKind::GoalZone => 1,
            ColliderKind::ColorZone(_) => 2,
            ColliderKind::Destroyer => 3,
            ColliderKind::Portal => 4,
            _ => u8::MAX,
        }
    }
}

/// What applying a hit did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Captured,
    Sorted { points: u64 },
    Missorted,
    Destroyed,
    CoreDamaged,
    Teleported { to: BodyId },
    /// Stale particle, wrong mode, or nothing to do
    None,
}

/// Everything a hit may touch
pub struct HitContext<'a, E: PhysicsEngine> {
    pub engine: &'a mut E,
    pub registry: &'a mut ParticleRegistry,
    pub portals: &'a mut PortalNetwork,
    pub round: &'a mut Round,
    /// Logical time in milliseconds
    pub now_ms: f64,
}

impl<E: PhysicsEngine> HitContext<'_, E> {
    fn consume(&mut self, particle: BodyId) {
        self.registry.remove(self.engine, particle);
        self.portals.forget(particle);
    }
}

/// Pick the sensor/particle hits out of a batch, in application order
pub fn classify(pairs: &[CollisionPair], registry: &ParticleRegistry, colliders: &ColliderSet) -> Vec<Hit> {
    let mut hits = Vec::new();
    for pair in pairs {
        for (sensor, other) in [(pair.a, pair.b), (pair.b, pair.a)] {
            let Some(kind) = colliders.kind_of(sensor) else {
                continue;
            };
            if !kind.is_sensor() || !registry.contains(other) {
                continue;
            }
            let hit = Hit {
                collider: sensor,
                particle: other,
                kind,
            };
            if hit.rank() != u8::MAX {
                hits.push(hit);
            }
        }
    }
    // Stable: same-rank hits keep engine order
    hits.sort_by_key(Hit::rank);
    hits
}

/// Apply one hit to the round
pub fn apply<E: PhysicsEngine>(ctx: &mut HitContext<'_, E>, hit: Hit) -> Effect {
    let Some(meta) = ctx.registry.get(hit.particle) else {
        return Effect::None;
    };
    let (enemy, color) = (meta.enemy, meta.color);

    match hit.kind {
        ColliderKind::Core => {
            if ctx.round.mode != GameMode::Survival || !enemy {
                return Effect::None;
            }
            ctx.consume(hit.particle);
            ctx.round.core_hit();
            Effect::CoreDamaged
        }
        ColliderKind::GoalZone => {
            if !ctx.round.goal_capture() {
                return Effect::None;
            }
            ctx.consume(hit.particle);
            Effect::Captured
        }
        ColliderKind::ColorZone(zone) => match ctx.round.color_sort(zone, color, ctx.now_ms) {
            Sort::Correct { points } => {
                ctx.consume(hit.particle);
                Effect::Sorted { points }
            }
            Sort::Wrong => Effect::Missorted,
            Sort::Ignored => Effect::None,
        },
        ColliderKind::Destroyer => {
            ctx.consume(hit.particle);
            ctx.round.destroyer_kill();
            Effect::Destroyed
        }
        ColliderKind::Portal => {
            match ctx
                .portals
                .transit(ctx.engine, hit.particle, hit.collider, ctx.now_ms)
            {
                Transit::Moved { to } => Effect::Teleported { to },
                _ => Effect::None,
            }
        }
        _ => Effect::None,
    }
}

/// Classify and apply a whole batch; stops once the round is decided
pub fn resolve<E: PhysicsEngine>(
    ctx: &mut HitContext<'_, E>,
    pairs: &[CollisionPair],
    colliders: &ColliderSet,
) -> Vec<Effect> {
    let hits = classify(pairs, ctx.registry, colliders);
    let mut effects = Vec::with_capacity(hits.len());
    for hit in hits {
        if ctx.round.is_terminal() {
            break;
        }
        let effect = apply(ctx, hit);
        if effect != Effect::None {
            effects.push(effect);
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::RoundState;
    use crate::sim::portal::Endpoint;
    use crate::sim::registry::{ParticleColor, ParticleKind, SpawnOverrides, SpawnPolicy};
    use crate::sim::world::ArcadeWorld;
    use glam::Vec2;

    struct Fixture {
        world: ArcadeWorld,
        registry: ParticleRegistry,
        colliders: ColliderSet,
        portals: PortalNetwork,
        round: Round,
    }

    impl Fixture {
        fn new(mode: GameMode) -> Self {
            Self {
                world: ArcadeWorld::default(),
                registry: ParticleRegistry::new(SpawnPolicy::Counted { budget: None }),
                colliders: ColliderSet::new(),
                portals: PortalNetwork::new(),
                round: Round::new(1, mode, 0),
            }
        }

        fn particle(&mut self, overrides: SpawnOverrides) -> BodyId {
            self.registry
                .spawn(&mut self.world, Vec2::splat(300.0), ParticleKind::Standard, &overrides)
                .unwrap()
        }

        fn run(&mut self, pairs: &[CollisionPair], now_ms: f64) -> Vec<Effect> {
            let mut ctx = HitContext {
                engine: &mut self.world,
                registry: &mut self.registry,
                portals: &mut self.portals,
                round: &mut self.round,
                now_ms,
            };
            resolve(&mut ctx, pairs, &self.colliders)
        }
    }

    fn pair(a: BodyId, b: BodyId) -> CollisionPair {
        CollisionPair { a, b }
    }

    #[test]
    fn test_goal_capture_either_direction() {
        let mut f = Fixture::new(GameMode::Challenge);
        let goal = f.colliders.place(&mut f.world, ColliderKind::GoalZone, Vec2::splat(300.0));
        let p1 = f.particle(SpawnOverrides::default());
        let p2 = f.particle(SpawnOverrides::default());

        let effects = f.run(&[pair(goal, p1), pair(p2, goal)], 0.0);
        assert_eq!(effects, vec![Effect::Captured, Effect::Captured]);
        assert_eq!(f.round.score, 20);
        assert_eq!(f.registry.count(), 0);
    }

    #[test]
    fn test_twentieth_capture_wins() {
        let mut f = Fixture::new(GameMode::Challenge);
        let goal = f.colliders.place(&mut f.world, ColliderKind::GoalZone, Vec2::splat(300.0));
        for i in 0..20 {
            let p = f.particle(SpawnOverrides::default());
            f.run(&[pair(goal, p)], i as f64);
            if i < 19 {
                assert_eq!(f.round.state, RoundState::Playing);
            }
        }
        assert_eq!(f.round.state, RoundState::Won);
        assert_eq!(f.round.progress(), Some((20, 20)));
    }

    #[test]
    fn test_core_beats_destroyer() {
        let mut f = Fixture::new(GameMode::Survival);
        let core = f.colliders.place(&mut f.world, ColliderKind::Core, Vec2::splat(300.0));
        let destroyer = f.colliders.place(&mut f.world, ColliderKind::Destroyer, Vec2::splat(320.0));
        let enemy = f.particle(SpawnOverrides {
            enemy: true,
            ..Default::default()
        });

        let effects = f.run(&[pair(destroyer, enemy), pair(core, enemy)], 0.0);
        assert_eq!(effects, vec![Effect::CoreDamaged]);
        assert_eq!(f.round.lives, 2);
    }

    #[test]
    fn test_third_core_hit_loses() {
        let mut f = Fixture::new(GameMode::Survival);
        let core = f.colliders.place(&mut f.world, ColliderKind::Core, Vec2::splat(300.0));
        let enemies: Vec<BodyId> = (0..4)
            .map(|_| {
                f.particle(SpawnOverrides {
                    enemy: true,
                    ..Default::default()
                })
            })
            .collect();
        let pairs: Vec<CollisionPair> = enemies.iter().map(|&e| pair(core, e)).collect();

        let effects = f.run(&pairs, 0.0);
        assert_eq!(effects.len(), 3);
        assert_eq!(f.round.state, RoundState::Lost);
        // The fourth enemy arrived after the round was decided
        assert!(f.registry.contains(enemies[3]));
    }

    #[test]
    fn test_core_ignores_friendly() {
        let mut f = Fixture::new(GameMode::Survival);
        let core = f.colliders.place(&mut f.world, ColliderKind::Core, Vec2::splat(300.0));
        let p = f.particle(SpawnOverrides::default());
        assert!(f.run(&[pair(core, p)], 0.0).is_empty());
        assert_eq!(f.round.lives, 3);
    }

    #[test]
    fn test_color_zone_sorting() {
        let mut f = Fixture::new(GameMode::Collection);
        let red_zone = f
            .colliders
            .place(&mut f.world, ColliderKind::ColorZone(ParticleColor::Red), Vec2::splat(200.0));
        let blue_zone = f
            .colliders
            .place(&mut f.world, ColliderKind::ColorZone(ParticleColor::Blue), Vec2::splat(400.0));
        let red = f.particle(SpawnOverrides {
            color: Some(ParticleColor::Red),
            ..Default::default()
        });

        assert_eq!(f.run(&[pair(blue_zone, red)], 0.0), vec![Effect::Missorted]);
        assert!(f.registry.contains(red));

        assert_eq!(f.run(&[pair(red_zone, red)], 100.0), vec![Effect::Sorted { points: 20 }]);
        assert_eq!(f.round.collected.red, 1);
        assert!(!f.registry.contains(red));
    }

    #[test]
    fn test_destroyer_scores_only_in_challenge() {
        let mut f = Fixture::new(GameMode::Sandbox);
        let d = f.colliders.place(&mut f.world, ColliderKind::Destroyer, Vec2::splat(300.0));
        let p = f.particle(SpawnOverrides::default());
        assert_eq!(f.run(&[pair(d, p)], 0.0), vec![Effect::Destroyed]);
        assert_eq!(f.round.score, 0);

        let mut f = Fixture::new(GameMode::Challenge);
        let d = f.colliders.place(&mut f.world, ColliderKind::Destroyer, Vec2::splat(300.0));
        let p = f.particle(SpawnOverrides::default());
        f.run(&[pair(d, p)], 0.0);
        assert_eq!(f.round.score, 5);
    }

    #[test]
    fn test_stale_and_non_particle_bodies_are_ignored() {
        let mut f = Fixture::new(GameMode::Challenge);
        let goal = f.colliders.place(&mut f.world, ColliderKind::GoalZone, Vec2::splat(300.0));
        let wall = f.colliders.place(&mut f.world, ColliderKind::Obstacle, Vec2::splat(300.0));
        assert!(f.run(&[pair(goal, wall), pair(goal, BodyId(9999))], 0.0).is_empty());
        assert_eq!(f.round.score, 0);
    }

    #[test]
    fn test_portal_transit_and_cooldown_pruning() {
        let mut f = Fixture::new(GameMode::Sandbox);
        let a = f.colliders.place(&mut f.world, ColliderKind::Portal, Vec2::new(100.0, 100.0));
        let b = f.colliders.place(&mut f.world, ColliderKind::Portal, Vec2::new(600.0, 100.0));
        for id in [a, b] {
            let c = f.colliders.get(id).unwrap();
            f.portals.register(Endpoint {
                id,
                position: c.position,
                radius: c.radius(),
            });
        }
        let d = f.colliders.place(&mut f.world, ColliderKind::Destroyer, Vec2::splat(300.0));
        let p = f.particle(SpawnOverrides::default());

        assert_eq!(f.run(&[pair(a, p)], 0.0), vec![Effect::Teleported { to: b }]);
        assert!(f.portals.last_teleport(p).is_some());
        f.run(&[pair(d, p)], 10.0);
        assert_eq!(f.portals.last_teleport(p), None);
    }
}
