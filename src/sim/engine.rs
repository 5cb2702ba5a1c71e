//! Physics engine seam
//!
//! The orchestration layer never integrates bodies itself. Everything it
//! needs from a rigid-body solver goes through [`PhysicsEngine`], so any
//! engine that can create bodies, apply forces, read/write kinematics and
//! report collision starts can host a round.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque body identity assigned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Collision geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Shape {
    /// Radius of the smallest circle containing the shape
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Rect { width, height } => Vec2::new(width, height).length() / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rect { width, height } => width * height,
        }
    }
}

/// Material profile handed to the engine untouched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    /// Fraction of velocity lost to air per second
    pub air_drag: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.8,
            density: 0.001,
            air_drag: 0.01,
        }
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_static: bool,
    pub is_sensor: bool,
    pub material: Material,
}

impl BodyDesc {
    pub fn dynamic(shape: Shape, position: Vec2, material: Material) -> Self {
        Self {
            shape,
            position,
            velocity: Vec2::ZERO,
            is_static: false,
            is_sensor: false,
            material,
        }
    }

    pub fn fixed(shape: Shape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            velocity: Vec2::ZERO,
            is_static: true,
            is_sensor: false,
            material: Material::default(),
        }
    }

    pub fn sensor(shape: Shape, position: Vec2) -> Self {
        Self {
            is_sensor: true,
            ..Self::fixed(shape, position)
        }
    }
}

/// A pair of bodies that started touching during the last step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: BodyId,
    pub b: BodyId,
}

/// Capabilities the core requires from a physics engine
pub trait PhysicsEngine {
    /// Create a body and add it to the world
    fn add_body(&mut self, desc: BodyDesc) -> BodyId;
    /// Remove a body; returns false if it was not in the world
    fn remove_body(&mut self, id: BodyId) -> bool;
    fn contains(&self, id: BodyId) -> bool;
    /// Accumulate a force on a dynamic body for the next step
    fn apply_force(&mut self, id: BodyId, force: Vec2);
    fn position(&self, id: BodyId) -> Option<Vec2>;
    fn velocity(&self, id: BodyId) -> Option<Vec2>;
    fn mass(&self, id: BodyId) -> Option<f32>;
    fn shape(&self, id: BodyId) -> Option<Shape>;
    fn set_position(&mut self, id: BodyId, position: Vec2);
    fn set_velocity(&mut self, id: BodyId, velocity: Vec2);
    fn set_angle(&mut self, id: BodyId, angle: f32);
    fn set_gravity(&mut self, gravity: Vec2);
    /// Advance the world by `dt` seconds and return the collision starts
    fn step(&mut self, dt: f32) -> Vec<CollisionPair>;
}
