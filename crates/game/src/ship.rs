//! Ships: combat state, control signals, weapons and the ship classes.

use engine_core::{MeshInstance, Transform, Velocity};
use glam::Vec3;
use hecs::Entity;
use physics::{integrate, MotionLimits, PhysicsBody};

use crate::bullet;
use crate::components::{Kind, SceneNode};
use crate::effects;
use crate::scene::Scene;

// ── Combat state ────────────────────────────────────────────────────────

/// Health, shield and collision radius of anything that can be shot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combatant {
    pub max_health: f32,
    pub health: f32,
    pub shield: f32,
    pub hit_radius: f32,
    /// Latched on the first lethal hit.
    destroyed: bool,
}

/// Result of a single [`Combatant::take_damage`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The shield soaked all of it.
    Absorbed,
    Damaged,
    /// This hit was the lethal one. Reported exactly once per combatant.
    Destroyed,
    /// Already destroyed, or a non-positive amount.
    Ignored,
}

impl Combatant {
    pub fn new(max_health: f32, shield: f32, hit_radius: f32) -> Self {
        Self {
            max_health,
            health: max_health,
            shield,
            hit_radius,
            destroyed: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Shield first, overflow into health.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.destroyed || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }

        if self.shield > 0.0 {
            self.shield -= amount;
            if self.shield >= 0.0 {
                return DamageOutcome::Absorbed;
            }
            self.health += self.shield;
            self.shield = 0.0;
        } else {
            self.health -= amount;
        }

        if self.health <= 0.0 {
            self.health = 0.0;
            self.destroyed = true;
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Damaged
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

// ── Controls and weapon ─────────────────────────────────────────────────

/// Control signals written once per frame by whichever controller owns the ship.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipControls {
    pub throttle: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    /// Consumed and cleared by the weapon every frame.
    pub firing: bool,
}

impl ShipControls {
    pub fn set(&mut self, throttle: f32, pitch: f32, yaw: f32, roll: f32) {
        self.throttle = throttle.clamp(-1.0, 1.0);
        self.pitch = pitch.clamp(-1.0, 1.0);
        self.yaw = yaw.clamp(-1.0, 1.0);
        self.roll = roll.clamp(-1.0, 1.0);
    }

    /// Forward throttle in [0, 1]; reverse thrust counts as zero.
    pub fn forward_throttle(&self) -> f32 {
        self.throttle.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weapon {
    /// Seconds between shots.
    pub interval: f32,
    pub cooldown: f32,
    /// Muzzle position in ship-local space.
    pub muzzle_offset: Vec3,
    pub damage: f32,
}

impl Weapon {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            cooldown: 0.0,
            muzzle_offset: bullet::MUZZLE_OFFSET,
            damage: bullet::BULLET_DAMAGE,
        }
    }

    /// Advance the cooldown and report whether a shot goes off this frame.
    ///
    /// While the trigger is held the overshoot of each cooldown carries into
    /// the next, so the cadence matches `interval` at any frame rate.
    pub fn tick(&mut self, dt: f32, firing: bool) -> bool {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
        if firing && cooldown_ready(self.cooldown) {
            self.cooldown += self.interval;
            true
        } else {
            if self.cooldown < 0.0 {
                self.cooldown = 0.0;
            }
            false
        }
    }
}

/// Slack for cooldowns counted down in float steps.
pub(crate) const COOLDOWN_EPSILON: f32 = 1e-4;

pub(crate) fn cooldown_ready(cooldown: f32) -> bool {
    cooldown <= COOLDOWN_EPSILON
}

/// Camera anchors used by camera controllers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub cockpit_offset: Vec3,
    /// Extra downward tilt in cockpit view [rad]. Negative tilts up.
    pub first_person_pitch_down: f32,
    pub third_person_offset: Vec3,
    pub third_person_pitch_down: f32,
}

// ── Classes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipClass {
    XFighter,
    TFighter,
    Challenger,
}

/// Everything a ship class fixes at construction.
#[derive(Debug, Clone, Copy)]
pub struct ShipSpec {
    pub name: &'static str,
    pub geometry_id: &'static str,
    pub limits: MotionLimits,
    pub max_health: f32,
    pub shield: f32,
    pub hit_radius: f32,
    pub weapon_interval: f32,
    pub scale: f32,
    pub drag: f32,
    pub angular_drag: f32,
    pub camera_view: CameraView,
    /// Thruster flame and engine trail children.
    pub engine_effects: bool,
}

impl ShipClass {
    pub fn spec(self) -> ShipSpec {
        match self {
            ShipClass::XFighter => ShipSpec {
                name: "XFighter",
                geometry_id: "ship_x-wing",
                limits: MotionLimits::new(500.0, 50.0, 5.0, Vec3::new(3.0, 2.0, 7.0)),
                max_health: 100.0,
                shield: 50.0,
                hit_radius: 2.0,
                weapon_interval: 0.5,
                scale: 1.0,
                drag: 0.8,
                angular_drag: 0.2,
                camera_view: CameraView {
                    cockpit_offset: Vec3::new(0.0, 0.88, -0.7),
                    first_person_pitch_down: -0.1,
                    third_person_offset: Vec3::new(0.0, 4.0, -15.0),
                    third_person_pitch_down: -0.2,
                },
                engine_effects: true,
            },
            ShipClass::TFighter => ShipSpec {
                name: "TFighter",
                geometry_id: "ship_t-fighter",
                limits: MotionLimits::new(100.0, 20.0, 10.0, Vec3::splat(10.0)),
                max_health: 60.0,
                shield: 0.0,
                hit_radius: 2.0,
                weapon_interval: 0.3,
                scale: 0.015,
                drag: 0.8,
                angular_drag: 0.2,
                camera_view: CameraView {
                    cockpit_offset: Vec3::new(0.0, 0.85, -1.0),
                    first_person_pitch_down: 0.0,
                    third_person_offset: Vec3::new(0.0, 3.0, -10.0),
                    third_person_pitch_down: 0.2,
                },
                engine_effects: false,
            },
            ShipClass::Challenger => ShipSpec {
                name: "Challenger",
                geometry_id: "ship_challenger_v1",
                limits: MotionLimits::new(100.0, 20.0, 10.0, Vec3::splat(10.0)),
                max_health: 100.0,
                shield: 25.0,
                hit_radius: 2.5,
                weapon_interval: 0.5,
                scale: 1.0,
                drag: 0.8,
                angular_drag: 0.2,
                camera_view: CameraView {
                    cockpit_offset: Vec3::new(0.0, 1.0, 3.0),
                    first_person_pitch_down: 0.1,
                    third_person_offset: Vec3::new(0.0, 3.0, -8.0),
                    third_person_pitch_down: 0.2,
                },
                engine_effects: false,
            },
        }
    }
}

/// Spawn a ship of `class` at `transform` (scale is taken from the class)
/// and register it for bullet and collision scans.
pub fn spawn_ship(scene: &mut Scene, class: ShipClass, transform: Transform) -> Entity {
    let spec = class.spec();
    let transform = transform.with_uniform_scale(spec.scale);
    let body = PhysicsBody::with_limits(spec.limits).with_drag(spec.drag, spec.angular_drag);

    let entity = scene.spawn((
        SceneNode::new(spec.name),
        Kind::Ship,
        transform,
        Velocity::default(),
        body,
        MeshInstance::new(spec.geometry_id),
        Combatant::new(spec.max_health, spec.shield, spec.hit_radius),
        ShipControls::default(),
        Weapon::new(spec.weapon_interval),
        spec.camera_view,
        class,
    ));
    scene.register_ship(entity);

    if spec.engine_effects {
        effects::attach_thruster_flame(scene, entity, &effects::X_FIGHTER_NOZZLES);
        effects::attach_trail(scene, entity);
    }

    log::debug!("Spawned {} {:?} at {:?}", spec.name, entity, transform.position);
    entity
}

// ── Per-frame ───────────────────────────────────────────────────────────

/// Apply control signals, integrate, then run the weapon.
pub fn update(scene: &mut Scene, entity: Entity, dt: f32) {
    let shot = {
        let Ok((transform, velocity, body, controls, weapon)) = scene.world.query_one_mut::<(
            &mut Transform,
            &mut Velocity,
            &mut PhysicsBody,
            &mut ShipControls,
            &mut Weapon,
        )>(entity) else {
            return;
        };

        body.apply_controls(
            controls.throttle,
            Vec3::new(controls.pitch, controls.yaw, controls.roll),
        );
        integrate(transform, velocity, body, dt);

        let fired = weapon.tick(dt, controls.firing);
        controls.firing = false;
        fired.then(|| {
            (
                transform.local_to_world(weapon.muzzle_offset),
                transform.front(),
                weapon.damage,
            )
        })
    };

    if let Some((muzzle, direction, damage)) = shot {
        log::trace!("{:?} fired from {:?}", entity, muzzle);
        bullet::spawn_bullet(scene, muzzle, direction, entity, damage);
    }
}

/// Store clamped control signals. No-op for entities without controls.
pub fn set_control_input(
    scene: &mut Scene,
    entity: Entity,
    throttle: f32,
    pitch: f32,
    yaw: f32,
    roll: f32,
) {
    match scene.world.get::<&mut ShipControls>(entity) {
        Ok(mut controls) => controls.set(throttle, pitch, yaw, roll),
        Err(_) => log::debug!("set_control_input: {:?} is not a ship", entity),
    }
}

pub fn set_firing(scene: &mut Scene, entity: Entity, firing: bool) {
    if let Ok(mut controls) = scene.world.get::<&mut ShipControls>(entity) {
        controls.firing = firing;
    }
}

/// Damage a ship. On the lethal hit an explosion is spawned at the ship and
/// the ship is removed from the scene.
pub fn apply_damage(scene: &mut Scene, entity: Entity, amount: f32) -> DamageOutcome {
    let outcome = match scene.world.get::<&mut Combatant>(entity) {
        Ok(mut combatant) => combatant.take_damage(amount),
        Err(_) => return DamageOutcome::Ignored,
    };

    match outcome {
        DamageOutcome::Destroyed => {
            let position = scene.transform(entity).map(|t| t.position).unwrap_or_default();
            log::debug!("{:?} destroyed at {:?}", entity, position);
            effects::spawn_explosion(scene, position);
            scene.remove(entity);
        }
        DamageOutcome::Damaged | DamageOutcome::Absorbed => {
            log::debug!("{:?} took {:.1} damage ({:?})", entity, amount, outcome);
        }
        DamageOutcome::Ignored => {}
    }
    outcome
}

pub fn combatant(scene: &Scene, entity: Entity) -> Option<Combatant> {
    scene.world.get::<&Combatant>(entity).ok().map(|c| *c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Kind;

    #[test]
    fn shield_absorbs_before_health() {
        let mut c = Combatant::new(100.0, 30.0, 2.0);
        assert_eq!(c.take_damage(50.0), DamageOutcome::Damaged);
        assert_eq!(c.shield, 0.0);
        assert!((c.health - 80.0).abs() < 1e-6);

        let mut c = Combatant::new(100.0, 30.0, 2.0);
        assert_eq!(c.take_damage(10.0), DamageOutcome::Absorbed);
        assert!((c.shield - 20.0).abs() < 1e-6);
        assert_eq!(c.health, 100.0);
    }

    #[test]
    fn destruction_latches_once() {
        let mut c = Combatant::new(100.0, 50.0, 2.0);
        assert_eq!(c.take_damage(200.0), DamageOutcome::Destroyed);
        assert_eq!(c.shield, 0.0);
        assert!(c.health <= 0.0);
        assert_eq!(c.take_damage(10.0), DamageOutcome::Ignored);
        assert!(c.is_destroyed());
    }

    #[test]
    fn weapon_fires_once_per_interval() {
        let mut weapon = Weapon::new(0.5);
        let shots: Vec<usize> = (0..30).filter(|_| weapon.tick(0.1, true)).collect();
        assert_eq!(shots, vec![0, 5, 10, 15, 20, 25]);
        assert!(!weapon.tick(1.0, false));
        assert_eq!(weapon.cooldown, 0.0);
    }

    #[test]
    fn weapon_cadence_holds_at_uneven_frame_rates() {
        let mut weapon = Weapon::new(0.3);
        // 3 s of held trigger at 60 Hz: one shot at t = 0 and every 0.3 s after.
        let shots = (0..180).filter(|_| weapon.tick(1.0 / 60.0, true)).count();
        assert_eq!(shots, 10);
    }

    #[test]
    fn controls_are_clamped() {
        let mut scene = Scene::with_seed(800, 600, 3);
        let ship = spawn_ship(&mut scene, ShipClass::TFighter, Transform::default());
        set_control_input(&mut scene, ship, 3.0, -2.0, 0.5, 1.5);
        let controls = *scene.world.get::<&ShipControls>(ship).unwrap();
        assert_eq!((controls.throttle, controls.pitch, controls.yaw, controls.roll), (1.0, -1.0, 0.5, 1.0));
    }

    #[test]
    fn firing_spawns_one_bullet_and_clears_latch() {
        let mut scene = Scene::with_seed(800, 600, 3);
        let ship = spawn_ship(&mut scene, ShipClass::TFighter, Transform::default());
        scene.update(0.0);

        set_firing(&mut scene, ship, true);
        scene.update(1.0 / 60.0);
        scene.update(1.0 / 60.0);
        scene.flush();

        let bullets = scene
            .entities()
            .iter()
            .filter(|e| scene.kind(**e) == Some(Kind::Bullet))
            .count();
        assert_eq!(bullets, 1);
        assert!(!scene.world.get::<&ShipControls>(ship).unwrap().firing);
    }

    #[test]
    fn lethal_damage_spawns_explosion_and_removes_ship() {
        let mut scene = Scene::with_seed(800, 600, 3);
        let ship = spawn_ship(&mut scene, ShipClass::XFighter, Transform::default());
        scene.update(0.0);

        assert_eq!(apply_damage(&mut scene, ship, 200.0), DamageOutcome::Destroyed);
        assert!(!scene.is_active(ship));
        assert_eq!(apply_damage(&mut scene, ship, 200.0), DamageOutcome::Ignored);

        scene.update(0.0);
        assert!(!scene.world.contains(ship));
        let explosions = scene
            .entities()
            .iter()
            .filter(|e| scene.world.get::<&effects::Explosion>(**e).is_ok())
            .count();
        assert_eq!(explosions, 1);
    }
}
