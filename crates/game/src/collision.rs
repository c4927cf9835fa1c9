//! Gameplay collision pass: bullets against celestial bodies, ships against
//! celestial bodies and ships against each other.
//!
//! Runs once per frame after every entity has moved. Narrow-phase maths lives
//! in the `physics` crate; this module decides who collides and what
//! happens to them.

use std::collections::HashMap;

use engine_core::{Transform, Velocity};
use hecs::Entity;
use physics::{pair_impulse, resolve_obstacle_contact, separate_pair, spheres_overlap, PAIR_RESTITUTION};

use crate::bullet::Projectile;
use crate::celestial::CelestialBody;
use crate::components::{CelestialKind, Kind};
use crate::effects;
use crate::scene::Scene;
use crate::ship::{self, Combatant};

/// Minimum time between two obstacle-contact damage ticks on the same ship.
pub const SHIP_CONTACT_COOLDOWN: f32 = 0.4;
/// Minimum time between two ram damage ticks for the same pair of ships.
pub const PAIR_CONTACT_COOLDOWN: f32 = 0.55;
/// Closing speed below which ships bump without damage.
pub const RAM_MIN_SPEED: f32 = 2.0;
pub const RAM_DAMAGE_SCALE: f32 = 1.2;
pub const RAM_DAMAGE_MIN: f32 = 6.0;
pub const RAM_DAMAGE_MAX: f32 = 35.0;

/// What happened during one [`CollisionSystem::resolve`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    pub meteors_shot: usize,
    pub obstacle_contacts: usize,
    pub ship_contacts: usize,
    /// Damage ticks dealt this frame, obstacles and rams combined.
    pub damage_events: usize,
}

#[derive(Debug, Clone, Copy)]
struct BodyInfo {
    entity: Entity,
    kind: CelestialKind,
    position: glam::Vec3,
    radius: f32,
}

#[derive(Debug, Default)]
pub struct CollisionSystem {
    ship_cooldowns: HashMap<Entity, f32>,
    pair_cooldowns: HashMap<(u64, u64), f32>,
}

fn pair_key(a: Entity, b: Entity) -> (u64, u64) {
    let (a, b) = (a.to_bits().get(), b.to_bits().get());
    (a.min(b), a.max(b))
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ship_cooldown(&self, ship: Entity) -> f32 {
        self.ship_cooldowns.get(&ship).copied().unwrap_or(0.0)
    }

    pub fn pair_cooldown(&self, a: Entity, b: Entity) -> f32 {
        self.pair_cooldowns.get(&pair_key(a, b)).copied().unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        self.ship_cooldowns.clear();
        self.pair_cooldowns.clear();
    }

    pub fn resolve(&mut self, scene: &mut Scene, dt: f32) -> CollisionReport {
        self.tick_cooldowns(dt);

        let mut report = CollisionReport::default();
        let bodies = active_bodies(scene);
        self.bullets_vs_bodies(scene, &bodies, &mut report);
        self.ships_vs_bodies(scene, &bodies, &mut report);
        self.ships_vs_ships(scene, &mut report);
        report
    }

    fn tick_cooldowns(&mut self, dt: f32) {
        for cooldown in self.ship_cooldowns.values_mut() {
            *cooldown -= dt;
        }
        self.ship_cooldowns.retain(|_, c| *c > 0.0);
        for cooldown in self.pair_cooldowns.values_mut() {
            *cooldown -= dt;
        }
        self.pair_cooldowns.retain(|_, c| *c > 0.0);
    }

    /// Meteors break on the first bullet; planets swallow nothing and the
    /// bullet keeps flying.
    fn bullets_vs_bodies(&mut self, scene: &mut Scene, bodies: &[BodyInfo], report: &mut CollisionReport) {
        let bullets: Vec<(Entity, glam::Vec3, f32)> = scene
            .entities()
            .iter()
            .copied()
            .filter(|&e| scene.kind(e) == Some(Kind::Bullet) && scene.is_active(e))
            .filter_map(|e| {
                let position = scene.transform(e)?.position;
                let radius = scene.world.get::<&Projectile>(e).ok()?.hit_radius;
                Some((e, position, radius))
            })
            .collect();

        for (bullet, position, radius) in bullets {
            for body in bodies {
                if !scene.is_active(bullet) {
                    break;
                }
                if !body.kind.is_destructible() || !scene.is_active(body.entity) {
                    continue;
                }
                if spheres_overlap(position, radius, body.position, body.radius) {
                    log::debug!("Bullet {:?} shattered meteor {:?}", bullet, body.entity);
                    effects::spawn_explosion(scene, body.position);
                    scene.remove(body.entity);
                    scene.remove(bullet);
                    report.meteors_shot += 1;
                    break;
                }
            }
        }
    }

    fn ships_vs_bodies(&mut self, scene: &mut Scene, bodies: &[BodyInfo], report: &mut CollisionReport) {
        let ships = scene.ships().to_vec();
        for ship_entity in ships {
            for body in bodies {
                if !scene.is_active(ship_entity) {
                    break;
                }
                if !scene.is_active(body.entity) {
                    continue;
                }
                let Some(radius) = ship::combatant(scene, ship_entity).map(|c| c.hit_radius) else {
                    break;
                };

                let contact = {
                    let Ok((transform, velocity)) = scene
                        .world
                        .query_one_mut::<(&mut Transform, &mut Velocity)>(ship_entity)
                    else {
                        break;
                    };
                    resolve_obstacle_contact(transform, velocity, radius, body.position, body.radius)
                };
                if contact.is_none() {
                    continue;
                }
                report.obstacle_contacts += 1;

                if body.kind.is_destructible() {
                    log::debug!("{:?} smashed through meteor {:?}", ship_entity, body.entity);
                    effects::spawn_explosion(scene, body.position);
                    scene.remove(body.entity);
                }

                if self.ship_cooldown(ship_entity) <= 0.0 {
                    self.ship_cooldowns.insert(ship_entity, SHIP_CONTACT_COOLDOWN);
                    ship::apply_damage(scene, ship_entity, body.kind.contact_damage());
                    report.damage_events += 1;
                }
            }
        }
    }

    fn ships_vs_ships(&mut self, scene: &mut Scene, report: &mut CollisionReport) {
        let ships = scene.ships().to_vec();
        for i in 0..ships.len() {
            for j in (i + 1)..ships.len() {
                let (a, b) = (ships[i], ships[j]);
                if !scene.is_active(a) || !scene.is_active(b) {
                    continue;
                }
                let (Some(ca), Some(cb)) = (ship::combatant(scene, a), ship::combatant(scene, b)) else {
                    continue;
                };
                let (Some(mut ta), Some(mut tb)) = (scene.transform(a), scene.transform(b)) else {
                    continue;
                };
                let Some(contact) = separate_pair(&mut ta, ca.hit_radius, &mut tb, cb.hit_radius) else {
                    continue;
                };
                report.ship_contacts += 1;
                scene.set_transform(a, ta);
                scene.set_transform(b, tb);

                let (mut va, mut vb) = (
                    scene.velocity(a).unwrap_or_default(),
                    scene.velocity(b).unwrap_or_default(),
                );
                let impact = pair_impulse(&mut va, &mut vb, contact.normal, PAIR_RESTITUTION);
                scene.set_velocity(a, va);
                scene.set_velocity(b, vb);

                if impact <= RAM_MIN_SPEED {
                    continue;
                }
                let key = pair_key(a, b);
                if self.pair_cooldowns.get(&key).copied().unwrap_or(0.0) > 0.0 {
                    continue;
                }
                self.pair_cooldowns.insert(key, PAIR_CONTACT_COOLDOWN);
                let damage = (impact * RAM_DAMAGE_SCALE).clamp(RAM_DAMAGE_MIN, RAM_DAMAGE_MAX);
                log::debug!("{:?} rammed {:?} at {:.1} m/s for {:.1}", a, b, impact, damage);
                ship::apply_damage(scene, a, damage);
                ship::apply_damage(scene, b, damage);
                report.damage_events += 1;
            }
        }
    }
}

fn active_bodies(scene: &Scene) -> Vec<BodyInfo> {
    scene
        .entities()
        .iter()
        .copied()
        .filter(|&e| scene.is_active(e))
        .filter_map(|e| {
            let body = scene.world.get::<&CelestialBody>(e).ok().map(|b| *b)?;
            let position = scene.transform(e)?.position;
            Some(BodyInfo {
                entity: e,
                kind: body.kind,
                position,
                radius: body.hit_radius,
            })
        })
        .collect()
}

/// Whether `entity` is a ship that has been destroyed.
pub fn is_wreck(scene: &Scene, entity: Entity) -> bool {
    scene
        .world
        .get::<&Combatant>(entity)
        .map(|c| c.is_destroyed())
        .unwrap_or(false)
}
