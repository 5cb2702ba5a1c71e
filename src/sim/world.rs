//! Arcade physics world
//!
//! A small [`PhysicsEngine`] implementation: semi-implicit Euler integration,
//! air drag, arena walls, and static/kinematic obstacles that push dynamic
//! circles out and reflect them. Sensors never push; they only report
//! collision starts. Dynamic bodies do not collide with each other.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;

use super::collision::{circle_vs_shape, reflect_velocity};
use super::engine::{BodyDesc, BodyId, CollisionPair, Material, PhysicsEngine, Shape};
use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, GRAVITY_SCALE};

/// Share of tangential velocity removed per contact, per unit of friction
const CONTACT_FRICTION: f32 = 0.05;

#[derive(Debug, Clone)]
struct Body {
    shape: Shape,
    pos: Vec2,
    vel: Vec2,
    force: Vec2,
    angle: f32,
    mass: f32,
    is_static: bool,
    is_sensor: bool,
    material: Material,
}

impl Body {
    fn is_dynamic(&self) -> bool {
        !self.is_static
    }
}

/// Rectangular arena with walls on all four sides
#[derive(Debug, Clone)]
pub struct ArcadeWorld {
    bodies: BTreeMap<BodyId, Body>,
    gravity: Vec2,
    size: Vec2,
    /// Pairs that were touching at the end of the last step
    contacts: HashSet<(BodyId, BodyId)>,
    next_id: u32,
}

impl Default for ArcadeWorld {
    fn default() -> Self {
        Self::new(Vec2::new(ARENA_WIDTH, ARENA_HEIGHT))
    }
}

impl ArcadeWorld {
    pub fn new(size: Vec2) -> Self {
        Self {
            bodies: BTreeMap::new(),
            gravity: Vec2::new(0.0, GRAVITY_SCALE),
            size,
            contacts: HashSet::new(),
            next_id: 1,
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.bodies.values().filter(|b| b.is_dynamic()).count()
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    fn keep_inside(&self, body: &mut Body) {
        let r = body.shape.bounding_radius();
        let restitution = body.material.restitution.min(1.0);
        if body.pos.x < r {
            body.pos.x = r;
            body.vel.x = body.vel.x.abs() * restitution;
        } else if body.pos.x > self.size.x - r {
            body.pos.x = self.size.x - r;
            body.vel.x = -body.vel.x.abs() * restitution;
        }
        if body.pos.y < r {
            body.pos.y = r;
            body.vel.y = body.vel.y.abs() * restitution;
        } else if body.pos.y > self.size.y - r {
            body.pos.y = self.size.y - r;
            body.vel.y = -body.vel.y.abs() * restitution;
        }
    }
}

fn pair_key(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a < b { (a, b) } else { (b, a) }
}

impl PhysicsEngine for ArcadeWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        let mass = (desc.shape.area() * desc.material.density).max(1e-4);
        self.bodies.insert(
            id,
            Body {
                shape: desc.shape,
                pos: desc.position,
                vel: desc.velocity,
                force: Vec2::ZERO,
                angle: 0.0,
                mass,
                is_static: desc.is_static,
                is_sensor: desc.is_sensor,
                material: desc.material,
            },
        );
        id
    }

    fn remove_body(&mut self, id: BodyId) -> bool {
        if self.bodies.remove(&id).is_none() {
            return false;
        }
        self.contacts.retain(|&(a, b)| a != id && b != id);
        true
    }

    fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            if body.is_dynamic() {
                body.force += force;
            }
        }
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.pos)
    }

    fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.vel)
    }

    fn mass(&self, id: BodyId) -> Option<f32> {
        self.bodies.get(&id).map(|b| b.mass)
    }

    fn shape(&self, id: BodyId) -> Option<Shape> {
        self.bodies.get(&id).map(|b| b.shape)
    }

    fn set_position(&mut self, id: BodyId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.pos = position;
        }
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.vel = velocity;
        }
    }

    fn set_angle(&mut self, id: BodyId, angle: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.angle = angle;
        }
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        if dt <= 0.0 {
            return Vec::new();
        }

        // Snapshot of everything that does not move under forces
        let obstacles: Vec<(BodyId, Shape, Vec2, f32, bool, f32)> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.is_static)
            .map(|(&id, b)| (id, b.shape, b.pos, b.angle, b.is_sensor, b.material.restitution))
            .collect();

        let gravity = self.gravity;
        let mut touching = HashSet::with_capacity(self.contacts.len());
        let mut started = Vec::new();

        let ids: Vec<BodyId> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.is_dynamic())
            .map(|(&id, _)| id)
            .collect();

        for id in ids {
            let Some(mut body) = self.bodies.get(&id).cloned() else {
                continue;
            };

            // Integrate (semi-implicit Euler)
            let accel = gravity + body.force / body.mass;
            body.vel += accel * dt;
            body.vel *= (1.0 - body.material.air_drag).max(0.0).powf(dt * 60.0);
            body.pos += body.vel * dt;
            body.force = Vec2::ZERO;

            let radius = body.shape.bounding_radius();
            for &(other, shape, pos, angle, is_sensor, restitution) in &obstacles {
                let contact = circle_vs_shape(body.pos, radius, &shape, pos, angle);
                if !contact.hit {
                    continue;
                }
                let key = pair_key(other, id);
                if !self.contacts.contains(&key) {
                    started.push(CollisionPair { a: other, b: id });
                }
                touching.insert(key);

                if is_sensor {
                    continue;
                }
                body.pos += contact.normal * contact.penetration;
                let bounce = body.material.restitution.min(1.0).max(restitution);
                body.vel = reflect_velocity(body.vel, contact.normal, bounce);
                let tangent = body.vel - body.vel.dot(contact.normal) * contact.normal;
                body.vel -= tangent * (body.material.friction * CONTACT_FRICTION).min(1.0);
            }

            self.keep_inside(&mut body);
            self.bodies.insert(id, body);
        }

        self.contacts = touching;
        started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(world: &mut ArcadeWorld, pos: Vec2) -> BodyId {
        world.add_body(BodyDesc::dynamic(
            Shape::Circle { radius: 5.0 },
            pos,
            Material::default(),
        ))
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = ArcadeWorld::default();
        let id = ball(&mut world, Vec2::new(100.0, 100.0));
        world.step(1.0 / 60.0);
        let pos = world.position(id).unwrap();
        assert!(pos.y > 100.0);
        assert!((pos.x - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_sensor_reports_start_once() {
        let mut world = ArcadeWorld::default();
        world.set_gravity(Vec2::ZERO);
        let sensor = world.add_body(BodyDesc::sensor(
            Shape::Circle { radius: 30.0 },
            Vec2::new(200.0, 200.0),
        ));
        let id = ball(&mut world, Vec2::new(200.0, 200.0));

        let first = world.step(1.0 / 60.0);
        assert_eq!(first, vec![CollisionPair { a: sensor, b: id }]);

        // Still overlapping: no new start event
        let second = world.step(1.0 / 60.0);
        assert!(second.is_empty());

        // Sensors never push
        let pos = world.position(id).unwrap();
        assert!((pos - Vec2::new(200.0, 200.0)).length() < 1e-3);
    }

    #[test]
    fn test_obstacle_pushes_out() {
        let mut world = ArcadeWorld::default();
        world.set_gravity(Vec2::ZERO);
        world.add_body(BodyDesc::fixed(
            Shape::Rect { width: 120.0, height: 20.0 },
            Vec2::new(300.0, 300.0),
        ));
        let id = ball(&mut world, Vec2::new(300.0, 287.0));
        world.set_velocity(id, Vec2::new(0.0, 60.0));
        world.step(1.0 / 60.0);
        let pos = world.position(id).unwrap();
        assert!(pos.y <= 285.0 + 1e-3);
        assert!(world.velocity(id).unwrap().y < 0.0);
    }

    #[test]
    fn test_remove_is_reported() {
        let mut world = ArcadeWorld::default();
        let id = ball(&mut world, Vec2::new(50.0, 50.0));
        assert!(world.remove_body(id));
        assert!(!world.remove_body(id));
        assert!(!world.contains(id));
        assert_eq!(world.body_count(), 0);
    }
}
