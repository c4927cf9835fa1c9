//! Particle effects: explosions, thruster flames, engine trails and bullet lasers.
//!
//! Effects are purely visual. Explosions are top-level and remove themselves
//! once every particle has died. The other three are children of a ship or
//! bullet and read their parent's state each frame.

use engine_core::{Transform, Velocity};
use glam::{Vec3, Vec4};
use hecs::Entity;
use rand::prelude::*;
use renderer::ParticleInstance;

use crate::components::{Kind, SceneNode};
use crate::scene::Scene;
use crate::ship::ShipControls;

/// Engine nozzle positions of the XFighter in ship-local space.
pub const X_FIGHTER_NOZZLES: [Vec3; 4] = [
    Vec3::new(1.5, 0.7, -6.0),
    Vec3::new(-1.5, 0.7, -6.0),
    Vec3::new(1.5, -0.7, -6.0),
    Vec3::new(-1.5, -0.7, -6.0),
];

// ── Explosion ───────────────────────────────────────────────────────────

const EXPLOSION_PARTICLES: usize = 180;
const EXPLOSION_CORE_FRACTION: f32 = 0.18;
const EXPLOSION_MIN_SPEED: f32 = 8.0;
const EXPLOSION_MAX_SPEED: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    /// Few, large, slow, long-lived.
    Core,
    /// Many, small, fast, short-lived.
    Spark,
}

#[derive(Debug, Clone)]
pub struct BurstParticle {
    /// Offset from the explosion center.
    pub offset: Vec3,
    pub velocity: Vec3,
    pub life: f32,
    pub age: f32,
    pub size: f32,
    pub alpha: f32,
    pub color: Vec3,
    pub kind: BurstKind,
}

#[derive(Debug, Clone)]
pub struct Explosion {
    pub particles: Vec<BurstParticle>,
    pub shock_age: f32,
    pub shock_life: f32,
    pub shock_radius: f32,
}

impl Explosion {
    pub fn new(rng: &mut impl Rng) -> Self {
        let core_count = (EXPLOSION_PARTICLES as f32 * EXPLOSION_CORE_FRACTION) as usize;
        let mut particles = Vec::with_capacity(EXPLOSION_PARTICLES);
        for i in 0..EXPLOSION_PARTICLES {
            let kind = if i < core_count {
                BurstKind::Core
            } else {
                BurstKind::Spark
            };
            particles.push(Self::burst_particle(rng, kind));
        }
        Self {
            particles,
            shock_age: 0.0,
            shock_life: 0.6,
            shock_radius: 0.0,
        }
    }

    fn burst_particle(rng: &mut impl Rng, kind: BurstKind) -> BurstParticle {
        let dir = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let dir = dir / dir.length().max(1e-6);

        let (speed, life, size, color) = match kind {
            BurstKind::Core => (
                EXPLOSION_MIN_SPEED * 0.3 + rng.gen::<f32>() * EXPLOSION_MAX_SPEED * 0.4,
                0.9 + rng.gen::<f32>() * 1.6,
                0.8 + rng.gen::<f32>() * 1.6,
                Vec3::new(1.0, 0.6 + rng.gen::<f32>() * 0.4, 0.05),
            ),
            BurstKind::Spark => (
                EXPLOSION_MAX_SPEED * 0.6 + rng.gen::<f32>() * EXPLOSION_MAX_SPEED * 0.8,
                0.3 + rng.gen::<f32>() * 0.9,
                0.06 + rng.gen::<f32>() * 0.18,
                Vec3::new(1.0, 0.8 + rng.gen::<f32>() * 0.2, 0.4 * rng.gen::<f32>()),
            ),
        };

        BurstParticle {
            offset: Vec3::ZERO,
            velocity: dir * speed,
            life,
            age: 0.0,
            size,
            alpha: 1.0,
            color,
            kind,
        }
    }

    /// Advance every particle; returns how many are still alive.
    pub fn update(&mut self, dt: f32) -> usize {
        self.shock_age += dt;
        let shock_t = (self.shock_age / self.shock_life).min(1.0);
        self.shock_radius += dt * (30.0 + 40.0 * shock_t);

        let mut alive = 0;
        for p in &mut self.particles {
            p.age += dt;
            if p.age >= p.life {
                p.alpha = 0.0;
                p.size *= 0.94;
                continue;
            }
            p.offset += p.velocity * dt;

            let (gravity_scale, drag, shrink) = match p.kind {
                BurstKind::Core => (0.25, 0.92f32, 0.999),
                BurstKind::Spark => (0.08, 0.86f32, 0.996),
            };
            p.velocity.y -= 9.8 * gravity_scale * dt;
            p.velocity *= drag.powf(dt * 60.0);

            p.alpha = (1.0 - p.age / p.life).max(0.0);
            p.size *= shrink;
            alive += 1;
        }
        alive
    }
}

pub fn spawn_explosion(scene: &mut Scene, position: Vec3) -> Entity {
    let explosion = Explosion::new(scene.rng_mut());
    scene.spawn((
        SceneNode::new("Explosion"),
        Kind::Effect,
        Transform::from_position(position),
        explosion,
    ))
}

// ── Thruster flame ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ThrusterFlame {
    /// Nozzle positions in parent-local space.
    pub nozzles: Vec<Vec3>,
    pub base_width: f32,
    pub max_length: f32,
    /// Smoothed output in [0, 1].
    pub intensity: f32,
    /// Response rate of `intensity`; higher is snappier.
    pub smoothing: f32,
}

impl ThrusterFlame {
    pub fn new(nozzles: &[Vec3]) -> Self {
        Self {
            nozzles: nozzles.to_vec(),
            base_width: 0.5,
            max_length: 3.0,
            intensity: 0.0,
            smoothing: 10.0,
        }
    }

    pub fn update(&mut self, forward_throttle: f32, speed: f32, dt: f32) {
        let speed01 = (speed / 80.0).clamp(0.0, 1.0);
        let target = (forward_throttle * 0.8 + speed01 * 0.2).clamp(0.0, 1.0);
        let t = 1.0 - (-self.smoothing * dt).exp();
        self.intensity += (target - self.intensity) * t;
    }
}

pub fn attach_thruster_flame(scene: &mut Scene, parent: Entity, nozzles: &[Vec3]) -> Entity {
    let transform = scene.transform(parent).unwrap_or_default();
    scene.spawn_child(
        parent,
        (
            SceneNode::new("ThrusterFlame"),
            Kind::Effect,
            transform,
            ThrusterFlame::new(nozzles),
        ),
    )
}

// ── Engine trail ────────────────────────────────────────────────────────

const TRAIL_PARTICLES: usize = 1200;
const TRAIL_SPREAD_X: f32 = 60.0;
const TRAIL_SPREAD_Y: f32 = 40.0;
const TRAIL_RANGE_Z: f32 = 150.0;

#[derive(Debug, Clone, Copy)]
pub struct TrailParticle {
    /// Parent-local position.
    pub offset: Vec3,
    pub alpha: f32,
}

/// Speed streaks flowing past a ship, denser and brighter the faster it goes.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    pub particles: Vec<TrailParticle>,
}

impl Trail {
    pub fn update(&mut self, speed: f32, dt: f32, rng: &mut impl Rng) {
        while self.particles.len() < TRAIL_PARTICLES {
            self.particles.push(TrailParticle {
                offset: Vec3::new(
                    (rng.gen::<f32>() - 0.5) * TRAIL_SPREAD_X,
                    (rng.gen::<f32>() - 0.5) * TRAIL_SPREAD_Y,
                    rng.gen::<f32>() * TRAIL_RANGE_Z - 50.0,
                ),
                alpha: 0.0,
            });
        }

        let drift = speed * 1.2;
        let target_alpha = if speed > 5.0 { 1.0 } else { speed / 5.0 };
        for p in &mut self.particles {
            p.offset.z -= drift * dt;
            p.alpha += (target_alpha - p.alpha) * 0.1;
            if p.offset.z < -50.0 && speed > 0.1 {
                p.offset = Vec3::new(
                    (rng.gen::<f32>() - 0.5) * TRAIL_SPREAD_X,
                    (rng.gen::<f32>() - 0.5) * TRAIL_SPREAD_Y,
                    100.0 + rng.gen::<f32>() * 50.0,
                );
            }
        }
    }
}

pub fn attach_trail(scene: &mut Scene, parent: Entity) -> Entity {
    let transform = scene.transform(parent).unwrap_or_default();
    scene.spawn_child(
        parent,
        (
            SceneNode::new("TrailParticleEmitter"),
            Kind::Effect,
            transform,
            Trail::default(),
        ),
    )
}

// ── Bullet laser ────────────────────────────────────────────────────────

const LASER_PARTICLES: usize = 120;
const LASER_RANGE_Z: f32 = 40.0;

#[derive(Debug, Clone, Copy)]
pub struct LaserParticle {
    /// Distance behind the bullet.
    pub distance: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, Default)]
pub struct BulletLaser {
    pub particles: Vec<LaserParticle>,
}

impl BulletLaser {
    pub fn update(&mut self, speed: f32, dt: f32, rng: &mut impl Rng) {
        while self.particles.len() < LASER_PARTICLES {
            self.particles.push(LaserParticle {
                distance: rng.gen::<f32>() * LASER_RANGE_Z,
                alpha: 0.0,
            });
        }

        let drift = speed.max(1e-3) * 1.2;
        let target_alpha = (speed / 100.0).clamp(0.0, 1.0);
        for p in &mut self.particles {
            p.distance -= drift * dt;
            if p.distance <= 0.0 {
                p.distance += LASER_RANGE_Z;
                p.alpha = 0.0;
            }
            p.alpha += (target_alpha - p.alpha) * 0.2;
        }
    }
}

pub fn attach_bullet_laser(scene: &mut Scene, parent: Entity) -> Entity {
    let transform = scene.transform(parent).unwrap_or_default();
    scene.spawn_child(
        parent,
        (
            SceneNode::new("BulletLaserEmitter"),
            Kind::Effect,
            transform,
            BulletLaser::default(),
        ),
    )
}

// ── Update and render collection ────────────────────────────────────────

/// Parent state an attached effect reacts to.
struct ParentState {
    transform: Transform,
    speed: f32,
    forward_throttle: f32,
}

fn parent_state(scene: &Scene, entity: Entity) -> Option<ParentState> {
    let parent = scene.parent(entity)?;
    let transform = scene.transform(parent)?;
    let speed = scene
        .velocity(parent)
        .map(|v: Velocity| v.linear.length())
        .unwrap_or(0.0);
    let forward_throttle = scene
        .world
        .get::<&ShipControls>(parent)
        .map(|c| c.forward_throttle())
        .unwrap_or(0.0);
    Some(ParentState {
        transform,
        speed,
        forward_throttle,
    })
}

pub fn update(scene: &mut Scene, entity: Entity, dt: f32) {
    let burnt_out = scene
        .world
        .query_one_mut::<&mut Explosion>(entity)
        .ok()
        .map(|explosion| explosion.update(dt) == 0);
    match burnt_out {
        Some(true) => {
            scene.remove(entity);
            return;
        }
        Some(false) => return,
        None => {}
    }

    let Some(parent) = parent_state(scene, entity) else {
        return;
    };
    let (world, rng) = scene.world_and_rng();

    if let Ok((transform, flame)) =
        world.query_one_mut::<(&mut Transform, &mut ThrusterFlame)>(entity)
    {
        flame.update(parent.forward_throttle, parent.speed, dt);
        transform.position = parent.transform.position;
        transform.rotation = parent.transform.rotation;
    } else if let Ok((transform, trail)) = world.query_one_mut::<(&mut Transform, &mut Trail)>(entity) {
        trail.update(parent.speed, dt, rng);
        transform.position = parent.transform.position;
        transform.rotation = parent.transform.rotation;
    } else if let Ok((transform, laser)) =
        world.query_one_mut::<(&mut Transform, &mut BulletLaser)>(entity)
    {
        laser.update(parent.speed, dt, rng);
        transform.position = parent.transform.position;
        transform.rotation = parent.transform.rotation;
    }
}

/// Append the world-space particles of `entity`, if it is an effect.
pub fn collect_particles(scene: &Scene, entity: Entity, out: &mut Vec<ParticleInstance>) {
    let Some(transform) = scene.transform(entity) else {
        return;
    };

    if let Ok(explosion) = scene.world.get::<&Explosion>(entity) {
        out.extend(explosion.particles.iter().filter(|p| p.alpha > 0.01).map(|p| {
            ParticleInstance::new(transform.position + p.offset, p.size, p.color.extend(p.alpha))
        }));
    }

    if let Ok(flame) = scene.world.get::<&ThrusterFlame>(entity) {
        if flame.intensity > 0.01 {
            let back = -transform.front();
            let length = flame.max_length * flame.intensity;
            let color = Vec4::new(0.45, 0.7, 1.0, flame.intensity);
            for nozzle in &flame.nozzles {
                let base = transform.local_to_world(*nozzle);
                for step in 0..4 {
                    let t = step as f32 / 3.0;
                    let size = flame.base_width * (1.0 - 0.6 * t) * (0.5 + flame.intensity);
                    out.push(ParticleInstance::new(base + back * length * t, size, color));
                }
            }
        }
    }

    if let Ok(trail) = scene.world.get::<&Trail>(entity) {
        out.extend(trail.particles.iter().filter(|p| p.alpha > 0.01).map(|p| {
            ParticleInstance::new(
                transform.local_to_world(p.offset),
                0.15,
                Vec4::new(0.8, 0.9, 1.0, p.alpha * 0.5),
            )
        }));
    }

    if let Ok(laser) = scene.world.get::<&BulletLaser>(entity) {
        out.extend(laser.particles.iter().filter(|p| p.alpha > 0.01).map(|p| {
            ParticleInstance::new(
                transform.local_to_world(Vec3::new(0.0, 0.0, -p.distance)),
                0.3,
                Vec4::new(1.0, 0.25, 0.2, p.alpha),
            )
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn explosion_has_core_and_sparks() {
        let mut rng = StdRng::seed_from_u64(11);
        let explosion = Explosion::new(&mut rng);
        let cores = explosion
            .particles
            .iter()
            .filter(|p| p.kind == BurstKind::Core)
            .count();
        assert_eq!(explosion.particles.len(), 180);
        assert_eq!(cores, 32);
    }

    #[test]
    fn explosion_removes_itself_when_burnt_out() {
        let mut scene = Scene::with_seed(800, 600, 11);
        let e = spawn_explosion(&mut scene, Vec3::new(5.0, 0.0, 0.0));
        scene.update(0.0);
        assert!(scene.is_active(e));
        for _ in 0..30 {
            scene.update(0.1);
        }
        assert!(!scene.is_active(e));
    }

    #[test]
    fn flame_intensity_follows_throttle() {
        let mut flame = ThrusterFlame::new(&X_FIGHTER_NOZZLES);
        for _ in 0..120 {
            flame.update(1.0, 0.0, 1.0 / 60.0);
        }
        assert!((flame.intensity - 0.8).abs() < 1e-3);
        for _ in 0..120 {
            flame.update(0.0, 0.0, 1.0 / 60.0);
        }
        assert!(flame.intensity < 1e-3);
    }

    #[test]
    fn laser_particles_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut laser = BulletLaser::default();
        for _ in 0..50 {
            laser.update(300.0, 1.0 / 60.0, &mut rng);
        }
        assert_eq!(laser.particles.len(), LASER_PARTICLES);
        assert!(laser
            .particles
            .iter()
            .all(|p| p.distance > 0.0 && p.distance <= LASER_RANGE_Z));
    }
}
