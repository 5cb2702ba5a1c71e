//! Portal network: teleport endpoints and per-particle cooldowns

use std::collections::HashMap;

use glam::Vec2;

use super::engine::{BodyId, PhysicsEngine};

/// Minimum time between two teleports of the same particle (ms)
pub const PORTAL_COOLDOWN_MS: f64 = 300.0;
/// Below this speed the particle's heading is meaningless
const MIN_HEADING_SPEED: f32 = 1e-3;
/// Clearance between the target rim and the particle after exit
const EXIT_MARGIN: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub id: BodyId,
    pub position: Vec2,
    pub radius: f32,
}

/// What happened when a particle entered a portal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transit {
    /// Particle moved to the given endpoint
    Moved { to: BodyId },
    /// Particle teleported too recently
    CoolingDown,
    /// Fewer than two endpoints, or the source is not registered
    NoDestination,
    /// The particle is not in the world
    Missing,
}

#[derive(Debug, Clone, Default)]
pub struct PortalNetwork {
    /// Registration order doubles as tie-break order
    endpoints: Vec<Endpoint>,
    last_teleport: HashMap<BodyId, f64>,
}

impl PortalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, endpoint: Endpoint) {
        if self.endpoints.iter().any(|e| e.id == endpoint.id) {
            return;
        }
        self.endpoints.push(endpoint);
    }

    pub fn unregister(&mut self, id: BodyId) {
        self.endpoints.retain(|e| e.id != id);
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Teleporting needs somewhere to go
    pub fn is_active(&self) -> bool {
        self.endpoints.len() >= 2
    }

    /// Last teleport timestamp for a particle
    pub fn last_teleport(&self, particle: BodyId) -> Option<f64> {
        self.last_teleport.get(&particle).copied()
    }

    /// Drop cooldown state for a particle that left the world
    pub fn forget(&mut self, particle: BodyId) {
        self.last_teleport.remove(&particle);
    }

    /// Forget every particle's cooldown, keep the endpoints
    pub fn clear_cooldowns(&mut self) {
        self.last_teleport.clear();
    }

    pub fn clear(&mut self) {
        self.endpoints.clear();
        self.last_teleport.clear();
    }

    /// Nearest other endpoint to `source` (first registered wins ties)
    fn destination(&self, source: &Endpoint) -> Option<Endpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.id != source.id)
            .min_by(|a, b| {
                let da = a.position.distance_squared(source.position);
                let db = b.position.distance_squared(source.position);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .copied()
    }

    /// Route a particle that entered `portal` at logical time `now_ms`
    pub fn transit(
        &mut self,
        engine: &mut impl PhysicsEngine,
        particle: BodyId,
        portal: BodyId,
        now_ms: f64,
    ) -> Transit {
        if !self.is_active() {
            return Transit::NoDestination;
        }
        if let Some(last) = self.last_teleport.get(&particle) {
            if now_ms - last < PORTAL_COOLDOWN_MS {
                return Transit::CoolingDown;
            }
        }
        let Some(source) = self.endpoints.iter().find(|e| e.id == portal).copied() else {
            return Transit::NoDestination;
        };
        let Some(target) = self.destination(&source) else {
            return Transit::NoDestination;
        };
        let (Some(velocity), Some(shape)) = (engine.velocity(particle), engine.shape(particle)) else {
            return Transit::Missing;
        };

        let speed = velocity.length();
        let heading = if speed > MIN_HEADING_SPEED {
            velocity / speed
        } else {
            (target.position - source.position).normalize_or(Vec2::Y)
        };
        let clearance = target.radius + shape.bounding_radius() + EXIT_MARGIN;

        engine.set_position(particle, target.position + heading * clearance);
        engine.set_velocity(particle, heading * speed);
        self.last_teleport.insert(particle, now_ms);

        log::debug!("Particle {:?} teleported {:?} -> {:?}", particle, source.id, target.id);
        Transit::Moved { to: target.id }
    }
}
