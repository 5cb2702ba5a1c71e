//! Narrow-phase contact tests for the arcade world
//!
//! Particles are always treated as circles; obstacles may be circles or
//! (possibly rotated) rectangles. A contact carries the normal pointing from
//! the obstacle toward the particle, so pushing the particle out along it and
//! reflecting the velocity resolves the overlap.

use glam::Vec2;

use super::engine::Shape;

/// Result of a contact check
#[derive(Debug, Clone)]
pub struct Contact {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Surface normal (pointing toward the circle center)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl Contact {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a circle against an arbitrary obstacle shape
pub fn circle_vs_shape(
    center: Vec2,
    radius: f32,
    shape: &Shape,
    shape_pos: Vec2,
    shape_angle: f32,
) -> Contact {
    match *shape {
        Shape::Circle { radius: other } => circle_vs_circle(center, radius, shape_pos, other),
        Shape::Rect { width, height } => {
            circle_vs_rect(center, radius, shape_pos, Vec2::new(width, height) / 2.0, shape_angle)
        }
    }
}

pub fn circle_vs_circle(a: Vec2, ra: f32, b: Vec2, rb: f32) -> Contact {
    let delta = a - b;
    let dist = delta.length();
    let reach = ra + rb;
    if dist >= reach {
        return Contact::miss();
    }
    // Coincident centers: push straight up
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::NEG_Y };
    Contact {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

/// Circle against a rectangle rotated by `angle` around its center
pub fn circle_vs_rect(center: Vec2, radius: f32, rect_pos: Vec2, half: Vec2, angle: f32) -> Contact {
    let rot = Vec2::from_angle(angle);
    let local = Vec2::from_angle(-angle).rotate(center - rect_pos);

    let closest = local.clamp(-half, half);
    let delta = local - closest;
    let dist = delta.length();

    if dist > 1e-6 {
        if dist >= radius {
            return Contact::miss();
        }
        return Contact {
            hit: true,
            normal: rot.rotate(delta / dist),
            penetration: radius - dist,
        };
    }

    // Center inside the rectangle: exit through the nearest face
    let gap_x = half.x - local.x.abs();
    let gap_y = half.y - local.y.abs();
    let (local_normal, depth) = if gap_x < gap_y {
        (Vec2::new(local.x.signum(), 0.0), gap_x)
    } else {
        (Vec2::new(0.0, local.y.signum()), gap_y)
    };
    Contact {
        hit: true,
        normal: rot.rotate(local_normal),
        penetration: depth + radius,
    }
}

/// Reflect velocity off a surface, scaling the normal component by restitution
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let into = velocity.dot(normal);
    if into >= 0.0 {
        // Already separating
        return velocity;
    }
    velocity - (1.0 + restitution) * into * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_circle_overlap() {
        let c = circle_vs_circle(Vec2::new(10.0, 0.0), 5.0, Vec2::ZERO, 8.0);
        assert!(c.hit);
        assert!((c.penetration - 3.0).abs() < 1e-4);
        assert!((c.normal - Vec2::X).length() < 1e-4);

        let miss = circle_vs_circle(Vec2::new(20.0, 0.0), 5.0, Vec2::ZERO, 8.0);
        assert!(!miss.hit);
    }

    #[test]
    fn test_circle_rect_face() {
        // Circle resting just above a 100x20 platform
        let c = circle_vs_rect(Vec2::new(0.0, -13.0), 5.0, Vec2::ZERO, Vec2::new(50.0, 10.0), 0.0);
        assert!(c.hit);
        assert!((c.normal - Vec2::NEG_Y).length() < 1e-4);
        assert!((c.penetration - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_circle_rect_rotated() {
        // Rotating the platform 90 degrees turns its long axis vertical
        let angle = std::f32::consts::FRAC_PI_2;
        let c = circle_vs_rect(Vec2::new(0.0, -40.0), 5.0, Vec2::ZERO, Vec2::new(50.0, 10.0), angle);
        assert!(c.hit);
        let far = circle_vs_rect(Vec2::new(40.0, 0.0), 5.0, Vec2::ZERO, Vec2::new(50.0, 10.0), angle);
        assert!(!far.hit);
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving down onto a floor whose normal points up
        let v = reflect_velocity(Vec2::new(3.0, 10.0), Vec2::NEG_Y, 1.0);
        assert!((v - Vec2::new(3.0, -10.0)).length() < 1e-4);

        // Separating velocity is left alone
        let v = reflect_velocity(Vec2::new(0.0, -10.0), Vec2::NEG_Y, 1.0);
        assert_eq!(v, Vec2::new(0.0, -10.0));
    }
}
