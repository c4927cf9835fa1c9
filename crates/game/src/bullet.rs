//! Projectiles fired by ship weapons.

use engine_core::{safe_normalize, Lifetime, Transform, Velocity};
use glam::{Quat, Vec3};
use hecs::Entity;
use physics::{integrate, MotionLimits, PhysicsBody};

use crate::components::{Kind, SceneNode};
use crate::effects;
use crate::scene::Scene;
use crate::ship::{self, Combatant};

pub const BULLET_SPEED: f32 = 300.0;
pub const BULLET_LIFETIME: f32 = 2.0;
pub const BULLET_RANGE: f32 = 1000.0;
pub const BULLET_DAMAGE: f32 = 10.0;
pub const BULLET_HIT_RADIUS: f32 = 5.0;
pub const BULLET_SCALE: f32 = 0.08;
/// Default muzzle position in ship-local space.
pub const MUZZLE_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 4.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub damage: f32,
    pub hit_radius: f32,
    /// Never hit by its own bullets.
    pub owner: Entity,
    pub life: Lifetime,
    pub traveled: f32,
    pub max_range: f32,
}

/// Fire a bullet from `muzzle` along `direction`. A degenerate direction
/// fires along world +Z.
pub fn spawn_bullet(
    scene: &mut Scene,
    muzzle: Vec3,
    direction: Vec3,
    owner: Entity,
    damage: f32,
) -> Entity {
    let dir = safe_normalize(direction, Vec3::Z);
    let transform =
        Transform::from_position_rotation(muzzle, Quat::from_rotation_arc(Vec3::Z, dir))
            .with_uniform_scale(BULLET_SCALE);
    let body = PhysicsBody::with_limits(MotionLimits {
        max_speed: BULLET_SPEED,
        ..MotionLimits::UNBOUNDED
    });

    let entity = scene.spawn((
        SceneNode::new("Bullet"),
        Kind::Bullet,
        transform,
        Velocity::new(dir * BULLET_SPEED),
        body,
        Projectile {
            damage,
            hit_radius: BULLET_HIT_RADIUS,
            owner,
            life: Lifetime::new(BULLET_LIFETIME),
            traveled: 0.0,
            max_range: BULLET_RANGE,
        },
    ));
    effects::attach_bullet_laser(scene, entity);
    entity
}

/// Move, age, then look for the first ship in registration order to hit.
pub fn update(scene: &mut Scene, entity: Entity, dt: f32) {
    let (position, projectile, expired) = {
        let Ok((transform, velocity, body, projectile)) = scene.world.query_one_mut::<(
            &mut Transform,
            &mut Velocity,
            &PhysicsBody,
            &mut Projectile,
        )>(entity) else {
            return;
        };
        integrate(transform, velocity, body, dt);
        projectile.traveled += velocity.linear.length() * dt;
        let aged_out = projectile.life.update(dt);
        let expired = aged_out || projectile.traveled > projectile.max_range;
        (transform.position, *projectile, expired)
    };

    if expired {
        scene.remove(entity);
        return;
    }

    if let Some(target) = first_hit(scene, position, &projectile) {
        log::debug!("Bullet {:?} hit {:?}", entity, target);
        ship::apply_damage(scene, target, projectile.damage);
        scene.remove(entity);
    }
}

fn first_hit(scene: &Scene, position: Vec3, projectile: &Projectile) -> Option<Entity> {
    scene.ships().iter().copied().find(|&target| {
        if target == projectile.owner || !scene.is_active(target) {
            return false;
        }
        let Some(target_pos) = scene.transform(target).map(|t| t.position) else {
            return false;
        };
        let Ok(combatant) = scene.world.get::<&Combatant>(target) else {
            return false;
        };
        position.distance(target_pos) < projectile.hit_radius + combatant.hit_radius
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::{spawn_ship, ShipClass};

    fn health_lost(scene: &Scene, e: Entity) -> f32 {
        let c = ship::combatant(scene, e).unwrap();
        (c.max_health - c.health) + (ShipClass::TFighter.spec().shield - c.shield)
    }

    #[test]
    fn orientation_follows_direction() {
        let mut scene = Scene::with_seed(800, 600, 5);
        let owner = spawn_ship(&mut scene, ShipClass::XFighter, Transform::default());
        let dir = Vec3::new(1.0, 1.0, 0.0);
        let b = spawn_bullet(&mut scene, Vec3::ZERO, dir, owner, BULLET_DAMAGE);
        let t = scene.transform(b).unwrap();
        assert!((t.front() - dir.normalize()).length() < 1e-5);
        assert!((scene.velocity(b).unwrap().linear.length() - BULLET_SPEED).abs() < 1e-3);
    }

    #[test]
    fn overlapping_two_ships_hits_only_the_first() {
        let mut scene = Scene::with_seed(800, 600, 5);
        let owner = spawn_ship(&mut scene, ShipClass::XFighter, Transform::from_position(Vec3::new(0.0, 0.0, -500.0)));
        let first = spawn_ship(&mut scene, ShipClass::TFighter, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        let second = spawn_ship(&mut scene, ShipClass::TFighter, Transform::from_position(Vec3::new(-1.0, 0.0, 0.0)));
        // Fired sideways so the bullet stays inside both hit spheres.
        let bullet = spawn_bullet(&mut scene, Vec3::ZERO, Vec3::Y, owner, BULLET_DAMAGE);
        scene.update(0.0);
        scene.update(0.001);

        assert!((health_lost(&scene, first) - BULLET_DAMAGE).abs() < 1e-5);
        assert_eq!(health_lost(&scene, second), 0.0);
        assert!(!scene.is_active(bullet));

        scene.update(0.001);
        assert_eq!(health_lost(&scene, second), 0.0);
        assert!(!scene.world.contains(bullet));
    }

    #[test]
    fn owner_is_never_hit() {
        let mut scene = Scene::with_seed(800, 600, 5);
        let owner = spawn_ship(&mut scene, ShipClass::TFighter, Transform::default());
        let bullet = spawn_bullet(&mut scene, Vec3::ZERO, Vec3::Z, owner, BULLET_DAMAGE);
        scene.update(0.0);
        scene.update(0.001);
        assert_eq!(health_lost(&scene, owner), 0.0);
        assert!(scene.is_active(bullet));
    }

    #[test]
    fn expires_after_lifetime() {
        let mut scene = Scene::with_seed(800, 600, 5);
        let owner = spawn_ship(&mut scene, ShipClass::TFighter, Transform::from_position(Vec3::new(0.0, 500.0, 0.0)));
        let bullet = spawn_bullet(&mut scene, Vec3::ZERO, Vec3::Z, owner, BULLET_DAMAGE);
        scene.update(0.0);
        for _ in 0..21 {
            scene.update(0.1);
        }
        assert!(!scene.is_active(bullet));
    }
}
