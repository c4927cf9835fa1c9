//! Planets, meteors and other celestial bodies.

use engine_core::{MeshInstance, Transform, Velocity};
use glam::Vec3;
use hecs::Entity;
use physics::{integrate_free, PhysicsBody, Spin, SpinSpace};
use rand::Rng;

use crate::components::{CelestialKind, Kind, SceneNode};
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialBody {
    pub kind: CelestialKind,
    pub hit_radius: f32,
    pub spin: Spin,
    /// Removed once farther than this from the world origin.
    pub max_distance: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanetModel {
    Earth,
    LavaPlanet,
    MercuryPlanet,
}

impl PlanetModel {
    pub fn geometry_id(self) -> &'static str {
        match self {
            PlanetModel::Earth => "earth",
            PlanetModel::LavaPlanet => "lava_planet",
            PlanetModel::MercuryPlanet => "mercury_planet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeteorModel {
    A,
    B,
    C,
    D,
}

impl MeteorModel {
    pub const ALL: [MeteorModel; 4] = [MeteorModel::A, MeteorModel::B, MeteorModel::C, MeteorModel::D];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn geometry_id(self) -> &'static str {
        match self {
            MeteorModel::A => "meteor_a",
            MeteorModel::B => "meteor_b",
            MeteorModel::C => "meteor_c",
            MeteorModel::D => "meteor_d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetOptions {
    pub model: PlanetModel,
    pub position: Vec3,
    pub scale: f32,
    pub hit_radius: f32,
    /// Spin about world up [rad/s].
    pub spin_speed: f32,
}

impl Default for PlanetOptions {
    fn default() -> Self {
        Self {
            model: PlanetModel::Earth,
            position: Vec3::ZERO,
            scale: 0.6,
            hit_radius: 30.0,
            spin_speed: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeteorOptions {
    /// Picked at random when unset.
    pub model: Option<MeteorModel>,
    pub position: Vec3,
    pub scale: f32,
    pub hit_radius: f32,
    /// Random axis and speed in [-0.6, 0.6] rad/s when unset.
    pub spin: Option<Spin>,
    pub velocity: Vec3,
    pub max_distance: Option<f32>,
}

impl Default for MeteorOptions {
    fn default() -> Self {
        Self {
            model: None,
            position: Vec3::ZERO,
            scale: 0.02,
            hit_radius: 6.0,
            spin: None,
            velocity: Vec3::ZERO,
            max_distance: None,
        }
    }
}

/// Static planet spinning about world up.
pub fn spawn_planet(scene: &mut Scene, options: PlanetOptions) -> Entity {
    let body = CelestialBody {
        kind: CelestialKind::Planet,
        hit_radius: options.hit_radius,
        spin: Spin::new(Vec3::Y, options.spin_speed, SpinSpace::World),
        max_distance: None,
    };
    spawn_body(
        scene,
        "Planet",
        options.model.geometry_id(),
        Transform::from_position(options.position).with_uniform_scale(options.scale),
        Velocity::default(),
        PhysicsBody::default().as_static(),
        body,
    )
}

/// Drifting, tumbling meteor.
pub fn spawn_meteor(scene: &mut Scene, options: MeteorOptions) -> Entity {
    let rng = scene.rng_mut();
    let model = options.model.unwrap_or_else(|| MeteorModel::random(rng));
    let spin = options.spin.unwrap_or_else(|| {
        let axis = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        Spin::new(axis, rng.gen_range(-0.6..=0.6), SpinSpace::Local)
    });

    let body = CelestialBody {
        kind: CelestialKind::Meteor,
        hit_radius: options.hit_radius,
        spin,
        max_distance: options.max_distance,
    };
    spawn_body(
        scene,
        "Meteor",
        model.geometry_id(),
        Transform::from_position(options.position).with_uniform_scale(options.scale),
        Velocity::new(options.velocity),
        PhysicsBody::default(),
        body,
    )
}

/// Spawn any celestial body from explicit parts.
pub fn spawn_body(
    scene: &mut Scene,
    name: &str,
    geometry_id: &str,
    transform: Transform,
    velocity: Velocity,
    physics: PhysicsBody,
    body: CelestialBody,
) -> Entity {
    let entity = scene.spawn((
        SceneNode::new(name),
        Kind::Celestial(body.kind),
        transform,
        velocity,
        physics,
        MeshInstance::new(geometry_id),
        body,
    ));
    log::trace!("Spawned {} {:?} at {:?}", name, entity, transform.position);
    entity
}

/// Drift, spin, then despawn when out of range.
pub fn update(scene: &mut Scene, entity: Entity, dt: f32) {
    let out_of_range = {
        let Ok((transform, velocity, physics, body)) = scene.world.query_one_mut::<(
            &mut Transform,
            &mut Velocity,
            &PhysicsBody,
            &CelestialBody,
        )>(entity) else {
            return;
        };
        integrate_free(transform, velocity, physics, dt);
        body.spin.apply(transform, dt);
        body.max_distance
            .is_some_and(|max| transform.position.length() > max)
    };

    if out_of_range {
        log::trace!("{:?} drifted out of range", entity);
        scene.remove(entity);
    }
}

pub fn body(scene: &Scene, entity: Entity) -> Option<CelestialBody> {
    scene.world.get::<&CelestialBody>(entity).ok().map(|b| *b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planets_stay_put_and_spin() {
        let mut scene = Scene::with_seed(800, 600, 4);
        let planet = spawn_planet(
            &mut scene,
            PlanetOptions {
                position: Vec3::new(10.0, 0.0, 0.0),
                spin_speed: 1.0,
                ..Default::default()
            },
        );
        scene.set_velocity(planet, Velocity::new(Vec3::X));
        scene.update(0.0);
        scene.update(0.5);

        let t = scene.transform(planet).unwrap();
        assert_eq!(t.position, Vec3::new(10.0, 0.0, 0.0));
        assert!((t.rotation.angle_between(glam::Quat::IDENTITY) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn meteors_drift_and_despawn_out_of_range() {
        let mut scene = Scene::with_seed(800, 600, 4);
        let meteor = spawn_meteor(
            &mut scene,
            MeteorOptions {
                position: Vec3::new(95.0, 0.0, 0.0),
                velocity: Vec3::new(10.0, 0.0, 0.0),
                max_distance: Some(100.0),
                ..Default::default()
            },
        );
        scene.update(0.0);
        scene.update(0.4);
        assert!((scene.transform(meteor).unwrap().position.x - 99.0).abs() < 1e-4);
        assert!(scene.is_active(meteor));

        scene.update(0.2);
        assert!(!scene.is_active(meteor));
    }

    #[test]
    fn meteor_model_comes_from_known_set() {
        let mut scene = Scene::with_seed(800, 600, 4);
        let meteor = spawn_meteor(&mut scene, MeteorOptions::default());
        let mesh = scene.world.get::<&MeshInstance>(meteor).unwrap().geometry_id.clone();
        assert!(MeteorModel::ALL.iter().any(|m| m.geometry_id() == mesh));
        assert_eq!(body(&scene, meteor).unwrap().kind, CelestialKind::Meteor);
    }
}
