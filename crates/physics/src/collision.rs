//! Sphere overlap tests and contact response.
//!
//! Everything collides as a sphere. The helpers here only move positions and
//! adjust velocities; deciding who takes damage and when belongs to the game.

use engine_core::{Transform, Velocity, DIRECTION_EPSILON};
use glam::Vec3;

/// Extra separation added on top of the measured penetration.
pub const SEPARATION_EPSILON: f32 = 0.02;
/// Factor applied when reflecting the inward velocity off a heavy obstacle.
pub const OBSTACLE_BOUNCE: f32 = 1.15;
/// Restitution for ship-versus-ship impulses.
pub const PAIR_RESTITUTION: f32 = 0.25;

/// True when two spheres overlap. Merely touching does not count.
pub fn spheres_overlap(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// Overlap depth and contact normal (pointing from `b` towards `a`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub normal: Vec3,
    pub penetration: f32,
}

/// Measure how deeply sphere `a` overlaps sphere `b`.
///
/// Returns `None` when they are apart. Coincident centers produce `fallback`
/// as the normal.
pub fn sphere_contact(
    a: Vec3,
    radius_a: f32,
    b: Vec3,
    radius_b: f32,
    fallback: Vec3,
) -> Option<Contact> {
    let delta = a - b;
    let distance = delta.length();
    let reach = radius_a + radius_b;
    if distance >= reach {
        return None;
    }
    let normal = if distance > DIRECTION_EPSILON {
        delta / distance
    } else {
        fallback
    };
    Some(Contact {
        normal,
        penetration: reach - distance,
    })
}

/// Push a body out of an immovable obstacle and bounce its inward velocity.
///
/// The body ends exactly `radius + obstacle_radius + SEPARATION_EPSILON` away
/// from the obstacle center along the contact normal. Returns the contact
/// that was resolved.
pub fn resolve_obstacle_contact(
    transform: &mut Transform,
    velocity: &mut Velocity,
    radius: f32,
    obstacle_center: Vec3,
    obstacle_radius: f32,
) -> Option<Contact> {
    let contact = sphere_contact(
        transform.position,
        radius,
        obstacle_center,
        obstacle_radius,
        Vec3::Y,
    )?;
    transform.position += contact.normal * (contact.penetration + SEPARATION_EPSILON);

    let inward = velocity.linear.dot(contact.normal);
    if inward < 0.0 {
        velocity.linear -= contact.normal * (inward * OBSTACLE_BOUNCE);
    }
    Some(contact)
}

/// Separate two overlapping bodies of equal weight.
///
/// Each side moves half the penetration plus `SEPARATION_EPSILON` along the
/// contact normal. The normal points from `b` towards `a`.
pub fn separate_pair(a: &mut Transform, radius_a: f32, b: &mut Transform, radius_b: f32) -> Option<Contact> {
    let contact = sphere_contact(a.position, radius_a, b.position, radius_b, Vec3::X)?;
    let push = contact.penetration * 0.5 + SEPARATION_EPSILON;
    a.position += contact.normal * push;
    b.position -= contact.normal * push;
    Some(contact)
}

/// Apply an equal-mass restitution impulse along `normal` (from `b` to `a`).
///
/// Returns the closing speed before the impulse, or zero when the bodies were
/// already separating and nothing changed.
pub fn pair_impulse(a: &mut Velocity, b: &mut Velocity, normal: Vec3, restitution: f32) -> f32 {
    let relative = a.linear - b.linear;
    let along_normal = relative.dot(normal);
    if along_normal >= 0.0 {
        return 0.0;
    }
    let j = -(1.0 + restitution) * along_normal * 0.5;
    a.linear += normal * j;
    b.linear -= normal * j;
    -along_normal
}
