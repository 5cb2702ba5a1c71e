//! Round simulation
//!
//! All gameplay logic lives here. This module stays free of platform code:
//! - Fixed timestep and a logical tick clock (no host timers)
//! - Seeded RNG only
//! - Stable iteration order (by body id)
//! - Physics reached only through the `PhysicsEngine` trait

pub mod chain;
pub mod classify;
pub mod collider;
pub mod collision;
pub mod engine;
pub mod forces;
pub mod mode;
pub mod neighbor;
pub mod portal;
pub mod registry;
pub mod schedule;
pub mod tick;
pub mod world;

pub use classify::{Effect, Hit};
pub use collider::{Collider, ColliderKind, ColliderSet, Patrol, Spinner};
pub use engine::{BodyDesc, BodyId, CollisionPair, Material, PhysicsEngine, Shape};
pub use forces::{Explosion, FieldParams, ForceField};
pub use mode::{
    CHALLENGE_LEVELS, ColorTally, GameMode, Objective, REACTION_LEVELS, Round, RoundState,
    SURVIVAL_WAVES, star_rating,
};
pub use portal::{Endpoint, PortalNetwork, Transit};
pub use registry::{
    ParticleColor, ParticleKind, ParticleMeta, ParticleRegistry, SpawnOverrides, SpawnPolicy,
    SpawnRejection,
};
pub use schedule::{Scheduler, Task};
pub use tick::{Simulation, TickInput};
pub use world::ArcadeWorld;
