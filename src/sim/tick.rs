//! Fixed timestep simulation tick
//!
//! [`Simulation`] is the per-round context: one physics world plus every set
//! the round owns. The tick order is fixed:
//! due tasks, collider animation, pending neighbor forces, force field,
//! physics step, collision classification, chain scan, round clock,
//! registry upkeep.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::chain;
use super::classify::{self, Effect, HitContext};
use super::collider::{ColliderKind, ColliderSet, Patrol, Spinner};
use super::engine::{BodyId, PhysicsEngine};
use super::forces::{EXPLOSION_RADIUS, Explosion, FieldParams, ForceField};
use super::mode::{GameMode, Round, WaveStep, survival_wave};
use super::neighbor;
use super::portal::{Endpoint, PortalNetwork};
use super::registry::{ParticleColor, ParticleKind, ParticleRegistry, SpawnOverrides};
use super::schedule::{Scheduler, Task};
use crate::consts::*;
use crate::{arena_center, direction, ms_to_ticks};

/// Collection spawner period (ms)
pub const COLLECTOR_INTERVAL_MS: f64 = 800.0;
/// Survival countdown resolution (ms)
const COUNTDOWN_STEP_MS: f64 = 1000.0;
/// Distance from the arena edge where enemies appear
const ENEMY_EDGE_MARGIN: f32 = 20.0;
/// Launch speed per unit of wave particle speed
const ENEMY_LAUNCH_SPEED: f32 = 240.0;
const ENEMY_RESTITUTION: f32 = 0.3;
/// Muzzle speed for the gun tool
pub const GUN_SPEED: f32 = 900.0;
/// Pointer reach for drag and collider removal
pub const POINTER_REACH: f32 = 40.0;
/// Reaction grid spacing
const REACTION_SPACING: f32 = 40.0;
/// Default patrol half-width
const PATROL_AMPLITUDE: f32 = 150.0;

/// Per-tick inputs (from settings and the pause button)
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Gravity slider (multiplied by GRAVITY_SCALE)
    pub gravity: f32,
    pub wind: f32,
    pub magnet_strength: f32,
    /// Physics-only time scale; timers stay on the logical clock
    pub time_scale: f32,
    pub neighbor_forces: bool,
    pub trails: bool,
    /// Pause toggle
    pub pause: bool,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            gravity: 1.0,
            wind: 0.0,
            magnet_strength: 0.0,
            time_scale: 1.0,
            neighbor_forces: false,
            trails: false,
            pause: false,
        }
    }
}

/// One round's world and everything attached to it
pub struct Simulation<E: PhysicsEngine> {
    pub engine: E,
    pub registry: ParticleRegistry,
    pub colliders: ColliderSet,
    pub field: ForceField,
    pub portals: PortalNetwork,
    pub scheduler: Scheduler,
    pub round: Round,
    /// Logical clock
    pub tick_count: u64,
    /// Effects produced by the last tick's collisions
    pub effects: Vec<Effect>,
    rng: Pcg32,
    trails: bool,
    /// Neighbor forces computed last tick, applied on the next
    pending_neighbor: Vec<(BodyId, Vec2)>,
}

impl<E: PhysicsEngine> Simulation<E> {
    /// Build a round on a fresh engine and lay out its fixtures and timers
    pub fn new(engine: E, mode: GameMode, level: usize, round_id: u64, seed: u64) -> Self {
        let round = Round::new(round_id, mode, level);
        let mut sim = Self {
            engine,
            registry: ParticleRegistry::new(mode.spawn_policy(round.level)),
            colliders: ColliderSet::new(),
            field: ForceField::new(),
            portals: PortalNetwork::new(),
            scheduler: Scheduler::new(),
            round,
            tick_count: 0,
            effects: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            trails: false,
            pending_neighbor: Vec::new(),
        };
        sim.setup();
        sim
    }

    fn setup(&mut self) {
        let w = ARENA_WIDTH;
        let h = ARENA_HEIGHT;
        match self.round.mode {
            GameMode::Sandbox => {}
            GameMode::Challenge => {
                self.colliders
                    .place(&mut self.engine, ColliderKind::GoalZone, Vec2::new(w / 2.0, h - 50.0));
            }
            GameMode::Survival => {
                self.colliders.place(&mut self.engine, ColliderKind::Core, arena_center());
                let interval = survival_wave(self.round.wave).spawn_interval_ms;
                self.schedule_in(interval, Task::EnemyBurst);
                self.schedule_in(COUNTDOWN_STEP_MS, Task::WaveCountdown);
            }
            GameMode::Collection => {
                for (i, color) in ParticleColor::ALL.into_iter().enumerate() {
                    let x = w * (i as f32 + 1.0) / 5.0;
                    self.colliders
                        .place(&mut self.engine, ColliderKind::ColorZone(color), Vec2::new(x, h - 40.0));
                }
                self.schedule_in(COLLECTOR_INTERVAL_MS, Task::CollectorSpawn);
            }
            GameMode::Reaction => self.build_reaction_grid(),
        }
    }

    /// Explosive particles in a centered grid; uses the level's whole budget
    fn build_reaction_grid(&mut self) {
        let count = self.registry.budget_remaining().unwrap_or(0) as usize;
        let cols = ((count as f32 * 1.5).sqrt().ceil() as usize).max(1);
        let rows = count.div_ceil(cols);
        let origin = arena_center()
            - Vec2::new(cols as f32 - 1.0, rows as f32 - 1.0) * REACTION_SPACING / 2.0;
        let overrides = SpawnOverrides::default();
        for i in 0..count {
            let pos = origin + Vec2::new((i % cols) as f32, (i / cols) as f32) * REACTION_SPACING;
            if self
                .registry
                .spawn(&mut self.engine, pos, ParticleKind::Explosive, &overrides)
                .is_err()
            {
                break;
            }
        }
        log::info!("Reaction grid: {} explosives ({}x{})", self.registry.count(), cols, rows);
    }

    fn schedule_in(&mut self, delay_ms: f64, task: Task) {
        self.scheduler
            .schedule_at(self.tick_count + ms_to_ticks(delay_ms), task);
    }

    /// Logical time in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.tick_count as f64 * TICK_MS
    }

    pub fn is_running(&self) -> bool {
        self.round.is_running()
    }

    pub fn pause(&mut self) {
        self.round.pause();
    }

    pub fn resume(&mut self) {
        self.round.resume();
    }

    /// Advance the round by one fixed step
    pub fn tick(&mut self, input: &TickInput) {
        if input.pause {
            self.round.toggle_pause();
        }
        self.effects.clear();
        if !self.round.is_running() {
            return;
        }
        self.trails = input.trails;
        self.tick_count += 1;

        while let Some(task) = self.scheduler.pop_due(self.tick_count) {
            self.run_task(task);
            if self.round.is_terminal() {
                return;
            }
        }

        let dt = SIM_DT * input.time_scale.max(0.0);
        let gravity = Vec2::new(0.0, input.gravity * GRAVITY_SCALE);
        self.engine.set_gravity(gravity);
        self.colliders.animate(&mut self.engine, dt);

        if !self.pending_neighbor.is_empty() {
            let forces = std::mem::take(&mut self.pending_neighbor);
            neighbor::apply(&mut self.engine, &self.registry, &forces);
        }

        let params = FieldParams {
            wind: input.wind,
            magnet_strength: input.magnet_strength,
            gravity,
            core: self.colliders.core(),
            tick: self.tick_count,
        };
        self.field
            .apply(&mut self.engine, &self.registry, &self.colliders, &params);

        let pairs = self.engine.step(dt);

        let now_ms = self.now_ms();
        let mut ctx = HitContext {
            engine: &mut self.engine,
            registry: &mut self.registry,
            portals: &mut self.portals,
            round: &mut self.round,
            now_ms,
        };
        self.effects = classify::resolve(&mut ctx, &pairs, &self.colliders);

        chain::scan(
            &self.field,
            &self.engine,
            &mut self.registry,
            &mut self.scheduler,
            self.tick_count,
        );

        self.round.advance_time(TICK_MS);
        self.round
            .check_reaction_exhausted(self.field.has_active(), self.scheduler.has_pending_explosions());

        self.registry.reconcile(&self.engine);
        if self.trails {
            self.registry.record_trails(&self.engine);
        }
        if input.neighbor_forces {
            let samples = neighbor::snapshot(&self.registry, &self.engine);
            self.pending_neighbor = neighbor::compute(&samples, neighbor::NEIGHBOR_CELL_SIZE, &mut self.rng);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::SecondaryExplosion {
                particle,
                power,
                radius,
            } => {
                if chain::fire(
                    &mut self.field,
                    &mut self.engine,
                    &mut self.registry,
                    particle,
                    power,
                    radius,
                ) {
                    self.portals.forget(particle);
                    self.round.chain_fired();
                }
            }
            Task::EnemyBurst => {
                self.spawn_enemies();
                let interval = survival_wave(self.round.wave).spawn_interval_ms;
                self.schedule_in(interval, Task::EnemyBurst);
            }
            Task::WaveCountdown => match self.round.wave_countdown_step() {
                WaveStep::Counting(_) | WaveStep::Advanced { .. } => {
                    self.schedule_in(COUNTDOWN_STEP_MS, Task::WaveCountdown);
                }
                WaveStep::Victory | WaveStep::Idle => {}
            },
            Task::CollectorSpawn => {
                self.spawn_collectible();
                self.schedule_in(COLLECTOR_INTERVAL_MS, Task::CollectorSpawn);
            }
        }
    }

    /// One survival burst from random arena edges, launched at the core
    fn spawn_enemies(&mut self) {
        let wave = survival_wave(self.round.wave);
        let core = self.colliders.core().unwrap_or_else(arena_center);
        let (w, h, m) = (ARENA_WIDTH, ARENA_HEIGHT, ENEMY_EDGE_MARGIN);

        for _ in 0..wave.particles_per_spawn {
            let pos = match self.rng.random_range(0..4) {
                0 => Vec2::new(self.rng.random_range(0.0..w), m),
                1 => Vec2::new(w - m, self.rng.random_range(0.0..h)),
                2 => Vec2::new(self.rng.random_range(0.0..w), h - m),
                _ => Vec2::new(m, self.rng.random_range(0.0..h)),
            };
            let overrides = SpawnOverrides {
                enemy: true,
                restitution: Some(ENEMY_RESTITUTION),
                velocity: Some(direction(pos, core) * wave.particle_speed * ENEMY_LAUNCH_SPEED),
                ..Default::default()
            };
            if self
                .registry
                .spawn(&mut self.engine, pos, ParticleKind::Standard, &overrides)
                .is_err()
            {
                break;
            }
        }
    }

    /// One color-tagged particle from the collection source point
    fn spawn_collectible(&mut self) {
        let source = Vec2::new(ARENA_WIDTH / 2.0, 60.0);
        let overrides = SpawnOverrides {
            color: Some(ParticleColor::random(&mut self.rng)),
            velocity: Some(Vec2::new(self.rng.random_range(-200.0..200.0), 0.0)),
            trail: self.trails,
            ..Default::default()
        };
        // A rejected spawn leaves the spawner armed
        let _ = self
            .registry
            .spawn(&mut self.engine, source, ParticleKind::Standard, &overrides);
    }

    // ---- User actions (inert unless the round is playing) ----

    fn overrides(&self, size: f32) -> SpawnOverrides {
        SpawnOverrides {
            size: Some(size),
            trail: self.trails,
            ..Default::default()
        }
    }

    /// Spawn one particle at the pointer
    pub fn spawn(&mut self, pos: Vec2, kind: ParticleKind, size: f32) -> Option<BodyId> {
        if !self.is_running() {
            return None;
        }
        let overrides = self.overrides(size);
        self.registry
            .spawn(&mut self.engine, pos, kind, &overrides)
            .map_err(|reason| log::debug!("Spawn rejected: {:?}", reason))
            .ok()
    }

    /// Spawn up to `count` particles in a square around `center`
    pub fn spawn_burst(&mut self, center: Vec2, count: usize, spread: f32, kind: ParticleKind, size: f32) -> usize {
        if !self.is_running() {
            return 0;
        }
        let overrides = self.overrides(size);
        self.registry
            .spawn_burst(&mut self.engine, &mut self.rng, center, spread, count, kind, &overrides)
            .len()
    }

    /// Fire one particle from `from` toward `toward`
    pub fn fire_gun(&mut self, from: Vec2, toward: Vec2, kind: ParticleKind, size: f32) -> Option<BodyId> {
        if !self.is_running() {
            return None;
        }
        let mut overrides = self.overrides(size);
        overrides.velocity = Some(direction(from, toward) * GUN_SPEED);
        self.registry.spawn(&mut self.engine, from, kind, &overrides).ok()
    }

    /// User explosion; false when inert or out of explosions
    pub fn explode(&mut self, pos: Vec2, power: f32) -> bool {
        if !self.is_running() || !self.round.use_explosion() {
            return false;
        }
        self.field
            .detonate(Explosion::new(pos, power, EXPLOSION_RADIUS));
        true
    }

    /// Place a toolbar collider; portals join the network
    pub fn place_collider(&mut self, kind: ColliderKind, pos: Vec2) -> Option<BodyId> {
        if self.round.is_terminal() {
            return None;
        }
        let id = self.colliders.place(&mut self.engine, kind, pos);
        if kind == ColliderKind::Portal {
            let radius = kind.shape().bounding_radius();
            self.portals.register(Endpoint {
                id,
                position: pos,
                radius,
            });
        }
        Some(id)
    }

    /// Spinner that sweeps back and forth around `pos`
    pub fn place_patrol(&mut self, pos: Vec2) -> Option<BodyId> {
        let spinner = Spinner {
            patrol: Some(Patrol::new(pos, PATROL_AMPLITUDE)),
            ..Default::default()
        };
        self.place_collider(ColliderKind::Spinner(spinner), pos)
    }

    /// Remove the user collider nearest the pointer; mode fixtures stay
    pub fn remove_collider_at(&mut self, pos: Vec2) -> bool {
        let Some(id) = self.colliders.nearest(pos, POINTER_REACH) else {
            return false;
        };
        match self.colliders.kind_of(id) {
            Some(ColliderKind::GoalZone | ColliderKind::ColorZone(_) | ColliderKind::Core) | None => {
                return false;
            }
            _ => {}
        }
        self.colliders.remove(&mut self.engine, id);
        self.portals.unregister(id);
        true
    }

    /// Move the particle nearest `from` to `to`, killing its velocity
    pub fn drag(&mut self, from: Vec2, to: Vec2) -> Option<BodyId> {
        if !self.is_running() {
            return None;
        }
        let reach_sq = POINTER_REACH * POINTER_REACH;
        let id = self
            .registry
            .ids()
            .filter_map(|id| self.engine.position(id).map(|p| (id, p.distance_squared(from))))
            .filter(|&(_, d)| d <= reach_sq)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)?;
        self.engine.set_position(id, to);
        self.engine.set_velocity(id, Vec2::ZERO);
        Some(id)
    }

    /// Remove every particle (the round's spawn count is kept)
    pub fn clear_particles(&mut self) {
        self.registry.clear(&mut self.engine);
        self.portals.clear_cooldowns();
        self.pending_neighbor.clear();
    }

    /// Drop everything the round owns
    pub fn teardown(&mut self) {
        self.scheduler.clear();
        self.field.clear();
        self.portals.clear();
        self.registry.clear(&mut self.engine);
        self.colliders.clear(&mut self.engine);
        self.pending_neighbor.clear();
        self.effects.clear();
        log::info!("Round {} torn down after {} ticks", self.round.id, self.tick_count);
    }
}
