//! Colliders: static or kinematic bodies with exactly one gameplay behavior

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::engine::{BodyDesc, BodyId, Material, PhysicsEngine, Shape};
use super::registry::ParticleColor;
use crate::normalize_angle;

/// Default spin rate for spinners (radians/sec)
pub const SPINNER_SPEED: f32 = 5.0;

/// Horizontal back-and-forth motion for a spinner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patrol {
    pub origin: Vec2,
    pub amplitude: f32,
    /// Phase advance (radians/sec)
    pub speed: f32,
    pub phase: f32,
}

impl Patrol {
    pub fn new(origin: Vec2, amplitude: f32) -> Self {
        Self {
            origin,
            amplitude,
            speed: 1.5,
            phase: 0.0,
        }
    }
}

/// Continuously rotating bar, optionally swinging around a pivot or patrolling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spinner {
    pub angular_speed: f32,
    pub angle: f32,
    /// Point the bar orbits around (its center keeps its initial offset)
    pub pivot: Option<Vec2>,
    pub patrol: Option<Patrol>,
}

impl Default for Spinner {
    fn default() -> Self {
        Self {
            angular_speed: SPINNER_SPEED,
            angle: 0.0,
            pivot: None,
            patrol: None,
        }
    }
}

/// Collider behaviors (one per collider)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderKind {
    Obstacle,
    Bouncer { restitution: f32 },
    Magnet,
    Destroyer,
    Portal,
    Spinner(Spinner),
    /// Challenge capture zone
    GoalZone,
    /// Collection sorting zone
    ColorZone(ParticleColor),
    /// Survival core the player defends
    Core,
}

impl ColliderKind {
    /// Sensors detect overlap without pushing
    pub fn is_sensor(&self) -> bool {
        !matches!(
            self,
            ColliderKind::Obstacle | ColliderKind::Bouncer { .. } | ColliderKind::Spinner(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColliderKind::Obstacle => "platform",
            ColliderKind::Bouncer { .. } => "bouncer",
            ColliderKind::Magnet => "magnet",
            ColliderKind::Destroyer => "destroyer",
            ColliderKind::Portal => "portal",
            ColliderKind::Spinner(_) => "spinner",
            ColliderKind::GoalZone => "goal",
            ColliderKind::ColorZone(_) => "color-zone",
            ColliderKind::Core => "core",
        }
    }

    /// Parse a toolbar collider name into a behavior with default parameters
    pub fn from_tool(name: &str) -> Option<Self> {
        match name {
            "platform" => Some(ColliderKind::Obstacle),
            "bouncer" => Some(ColliderKind::Bouncer { restitution: 1.8 }),
            "magnet" => Some(ColliderKind::Magnet),
            "destroyer" => Some(ColliderKind::Destroyer),
            "portal" => Some(ColliderKind::Portal),
            "spinner" => Some(ColliderKind::Spinner(Spinner::default())),
            _ => None,
        }
    }

    /// Default geometry for each behavior
    pub fn shape(&self) -> Shape {
        match self {
            ColliderKind::Obstacle => Shape::Rect {
                width: 120.0,
                height: 20.0,
            },
            ColliderKind::Bouncer { .. } => Shape::Circle { radius: 30.0 },
            ColliderKind::Magnet => Shape::Circle { radius: 40.0 },
            ColliderKind::Destroyer => Shape::Rect {
                width: 60.0,
                height: 60.0,
            },
            ColliderKind::Portal => Shape::Circle { radius: 35.0 },
            ColliderKind::Spinner(_) => Shape::Rect {
                width: 100.0,
                height: 20.0,
            },
            ColliderKind::GoalZone => Shape::Rect {
                width: 160.0,
                height: 60.0,
            },
            ColliderKind::ColorZone(_) => Shape::Rect {
                width: 120.0,
                height: 50.0,
            },
            ColliderKind::Core => Shape::Circle { radius: 40.0 },
        }
    }

    fn body(&self, position: Vec2) -> BodyDesc {
        let shape = self.shape();
        if self.is_sensor() {
            return BodyDesc::sensor(shape, position);
        }
        let mut desc = BodyDesc::fixed(shape, position);
        desc.material = match *self {
            ColliderKind::Bouncer { restitution } => Material {
                restitution,
                ..Material::default()
            },
            ColliderKind::Spinner(_) => Material {
                restitution: 0.5,
                friction: 0.1,
                ..Material::default()
            },
            _ => Material::default(),
        };
        desc
    }
}

/// A placed collider
#[derive(Debug, Clone)]
pub struct Collider {
    pub id: BodyId,
    pub kind: ColliderKind,
    pub position: Vec2,
}

impl Collider {
    /// Radius used for proximity queries (portal exits, magnet centers)
    pub fn radius(&self) -> f32 {
        self.kind.shape().bounding_radius()
    }
}

/// All colliders in the round, keyed by body id
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    colliders: BTreeMap<BodyId, Collider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn get(&self, id: BodyId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    pub fn kind_of(&self, id: BodyId) -> Option<ColliderKind> {
        self.colliders.get(&id).map(|c| c.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collider> + '_ {
        self.colliders.values()
    }

    /// Positions of every magnet
    pub fn magnets(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.colliders
            .values()
            .filter(|c| c.kind == ColliderKind::Magnet)
            .map(|c| c.position)
    }

    /// Position of the survival core, if one is placed
    pub fn core(&self) -> Option<Vec2> {
        self.colliders
            .values()
            .find(|c| c.kind == ColliderKind::Core)
            .map(|c| c.position)
    }

    /// Create the body for a collider and track it
    pub fn place(&mut self, engine: &mut impl PhysicsEngine, kind: ColliderKind, position: Vec2) -> BodyId {
        let id = engine.add_body(kind.body(position));
        self.colliders.insert(id, Collider { id, kind, position });
        log::debug!("Placed {} at ({:.0}, {:.0})", kind.name(), position.x, position.y);
        id
    }

    pub fn remove(&mut self, engine: &mut impl PhysicsEngine, id: BodyId) -> Option<Collider> {
        let collider = self.colliders.remove(&id)?;
        engine.remove_body(id);
        Some(collider)
    }

    /// Nearest collider to a point within `reach`
    pub fn nearest(&self, point: Vec2, reach: f32) -> Option<BodyId> {
        self.colliders
            .values()
            .map(|c| (c.id, c.position.distance(point)))
            .filter(|&(_, d)| d <= reach)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }

    /// Advance spinner rotation, pivot swing and patrol by `dt` seconds
    pub fn animate(&mut self, engine: &mut impl PhysicsEngine, dt: f32) {
        for collider in self.colliders.values_mut() {
            let ColliderKind::Spinner(ref mut spinner) = collider.kind else {
                continue;
            };
            let delta = spinner.angular_speed * dt;
            spinner.angle = normalize_angle(spinner.angle + delta);

            if let Some(pivot) = spinner.pivot {
                let arm = collider.position - pivot;
                collider.position = pivot + Vec2::from_angle(delta).rotate(arm);
            }
            if let Some(ref mut patrol) = spinner.patrol {
                patrol.phase = normalize_angle(patrol.phase + patrol.speed * dt);
                collider.position.x = patrol.origin.x + patrol.amplitude * patrol.phase.sin();
            }

            engine.set_angle(collider.id, spinner.angle);
            engine.set_position(collider.id, collider.position);
        }
    }

    /// Remove every collider
    pub fn clear(&mut self, engine: &mut impl PhysicsEngine) {
        for id in self.colliders.keys() {
            engine.remove_body(*id);
        }
        self.colliders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::ArcadeWorld;

    #[test]
    fn test_sensor_flags() {
        assert!(ColliderKind::Portal.is_sensor());
        assert!(ColliderKind::Destroyer.is_sensor());
        assert!(ColliderKind::ColorZone(ParticleColor::Red).is_sensor());
        assert!(!ColliderKind::Obstacle.is_sensor());
        assert!(!ColliderKind::Spinner(Spinner::default()).is_sensor());
    }

    #[test]
    fn test_from_tool() {
        assert_eq!(
            ColliderKind::from_tool("bouncer"),
            Some(ColliderKind::Bouncer { restitution: 1.8 })
        );
        assert_eq!(ColliderKind::from_tool("teleporter"), None);
    }

    #[test]
    fn test_spinner_rotates_and_patrols() {
        let mut world = ArcadeWorld::default();
        let mut set = ColliderSet::new();
        let origin = Vec2::new(400.0, 300.0);
        let spinner = Spinner {
            patrol: Some(Patrol::new(origin, 100.0)),
            ..Default::default()
        };
        let id = set.place(&mut world, ColliderKind::Spinner(spinner), origin);

        for _ in 0..30 {
            set.animate(&mut world, 1.0 / 60.0);
        }
        let collider = set.get(id).unwrap();
        let ColliderKind::Spinner(s) = collider.kind else {
            panic!("kind changed");
        };
        assert!(s.angle.abs() > 0.1);
        assert!(collider.position.x > origin.x);
        assert!((collider.position.x - origin.x).abs() <= 100.0);
        assert_eq!(world.position(id), Some(collider.position));
    }

    #[test]
    fn test_pivot_keeps_arm_length() {
        let mut world = ArcadeWorld::default();
        let mut set = ColliderSet::new();
        let pivot = Vec2::new(300.0, 300.0);
        let spinner = Spinner {
            pivot: Some(pivot),
            ..Default::default()
        };
        let id = set.place(&mut world, ColliderKind::Spinner(spinner), Vec2::new(360.0, 300.0));
        for _ in 0..45 {
            set.animate(&mut world, 1.0 / 60.0);
        }
        let pos = set.get(id).unwrap().position;
        assert!((pos.distance(pivot) - 60.0).abs() < 1e-2);
        assert!((pos - Vec2::new(360.0, 300.0)).length() > 1.0);
    }
}
