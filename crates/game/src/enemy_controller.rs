//! Enemy AI: a four-state machine per ship (patrol, chase, attack, evade)
//! with planet avoidance, steering ships through their control inputs.

use std::collections::HashMap;

use engine_core::{safe_normalize, Transform, Velocity};
use glam::Vec3;
use hecs::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::celestial::CelestialBody;
use crate::components::CelestialKind;
use crate::scene::Scene;
use crate::ship;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    Patrol,
    Chase,
    Attack,
    Evade,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStateData {
    pub state: EnemyState,
    /// Seconds spent in `state`.
    pub state_time: f32,
    pub fire_cooldown: f32,
    /// Pitch/yaw/roll command used while patrolling.
    pub patrol_turn: Vec3,
    pub patrol_refresh: f32,
    /// Which way to circle the target while chasing (+1 or -1).
    pub orbit_sign: f32,
    pub orbit_refresh: f32,
}

impl EnemyStateData {
    fn new(state: EnemyState) -> Self {
        Self {
            state,
            state_time: 0.0,
            fire_cooldown: 0.0,
            patrol_turn: Vec3::ZERO,
            patrol_refresh: 0.0,
            orbit_sign: 1.0,
            orbit_refresh: 0.0,
        }
    }

    fn enter(&mut self, state: EnemyState) {
        self.state = state;
        self.state_time = 0.0;
    }
}

fn default_patrol_refresh() -> [f32; 2] {
    [1.2, 2.6]
}

fn default_orbit_refresh() -> [f32; 2] {
    [2.5, 5.0]
}

/// AI tunables. Distances in meters, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub detection_range: f32,
    pub attack_range: f32,
    pub too_close_range: f32,
    pub lose_range: f32,
    pub evade_duration: f32,
    pub fire_interval: f32,
    #[serde(default = "default_patrol_refresh")]
    pub patrol_refresh: [f32; 2],
    #[serde(default = "default_orbit_refresh")]
    pub orbit_refresh: [f32; 2],
    pub attack_facing: f32,
    pub fire_facing: f32,
    pub patrol_throttle: f32,
    /// Distance from a planet surface that overrides all other steering.
    pub emergency_margin: f32,
    /// Distance from a planet surface where repulsion starts.
    pub avoid_margin: f32,
    pub avoid_weight: f32,
    pub steer_gain: f32,
    pub roll_from_yaw: f32,
    pub angular_damping: f32,
    /// Enemies registered closer than this start out evading.
    pub spawn_evade_distance: f32,
    /// Facing dot above which two ships count as nose to nose.
    pub head_on_dot: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            detection_range: 160.0,
            attack_range: 120.0,
            too_close_range: 40.0,
            lose_range: 260.0,
            evade_duration: 3.0,
            fire_interval: 0.35,
            patrol_refresh: default_patrol_refresh(),
            orbit_refresh: default_orbit_refresh(),
            attack_facing: 0.85,
            fire_facing: 0.92,
            patrol_throttle: 0.35,
            emergency_margin: 25.0,
            avoid_margin: 90.0,
            avoid_weight: 2.0,
            steer_gain: 2.5,
            roll_from_yaw: 0.35,
            angular_damping: 0.6,
            spawn_evade_distance: 80.0,
            head_on_dot: 0.9,
        }
    }
}

impl EnemyTuning {
    /// Repair values the AI cannot run with: reversed or non-finite refresh
    /// windows, and ranges that would divide by zero. Each repair is logged.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        self.patrol_refresh = refresh_window("patrol_refresh", self.patrol_refresh, defaults.patrol_refresh);
        self.orbit_refresh = refresh_window("orbit_refresh", self.orbit_refresh, defaults.orbit_refresh);

        let finite = self.attack_range.is_finite() && self.lose_range.is_finite();
        if !finite || self.attack_range <= 0.0 || self.lose_range <= self.attack_range {
            log::warn!(
                "Enemy tuning: lose_range {} must exceed attack_range {}; using {} / {}",
                self.lose_range,
                self.attack_range,
                defaults.lose_range,
                defaults.attack_range
            );
            self.attack_range = defaults.attack_range;
            self.lose_range = defaults.lose_range;
        }
        if !(self.detection_range.is_finite() && self.detection_range > 0.0) {
            log::warn!("Enemy tuning: bad detection_range {}; using {}", self.detection_range, defaults.detection_range);
            self.detection_range = defaults.detection_range;
        }
        if !(self.avoid_margin.is_finite() && self.avoid_margin > 0.0) {
            log::warn!("Enemy tuning: bad avoid_margin {}; using {}", self.avoid_margin, defaults.avoid_margin);
            self.avoid_margin = defaults.avoid_margin;
        }
        self
    }

    fn evade_trigger(&self) -> f32 {
        self.too_close_range * 1.35
    }

    fn evade_release(&self) -> f32 {
        self.too_close_range * 1.5
    }
}

/// Sorted `[min, max]` window of seconds, or `fallback` when unusable.
fn refresh_window(name: &str, window: [f32; 2], fallback: [f32; 2]) -> [f32; 2] {
    let [a, b] = window;
    if !(a.is_finite() && b.is_finite()) {
        log::warn!("Enemy tuning: {} {:?} is not finite; using {:?}", name, window, fallback);
        return fallback;
    }
    if a > b {
        log::warn!("Enemy tuning: {} {:?} is reversed; using [{}, {}]", name, window, b, a);
        return [b, a];
    }
    window
}

/// What an enemy wants to do this frame, before planet avoidance.
#[derive(Debug, Clone, Copy)]
struct Intent {
    /// World-space direction to fly; `None` flies the raw `turn` command.
    desired: Option<Vec3>,
    turn: Vec3,
    throttle: f32,
    fire: bool,
}

/// Planet surface a ship should keep clear of.
#[derive(Debug, Clone, Copy)]
struct Obstacle {
    center: Vec3,
    radius: f32,
}

/// Snapshot of the values a single enemy's decision needs.
#[derive(Debug, Clone, Copy)]
struct Situation {
    transform: Transform,
    angular: Vec3,
    to_target: Vec3,
    distance: f32,
    facing: f32,
}

pub struct EnemyController {
    target: Entity,
    enemies: Vec<Entity>,
    states: HashMap<Entity, EnemyStateData>,
    pub tuning: EnemyTuning,
    rng: StdRng,
}

impl EnemyController {
    pub fn new(target: Entity, tuning: EnemyTuning) -> Self {
        Self::with_rng(target, tuning, StdRng::from_entropy())
    }

    pub fn with_seed(target: Entity, tuning: EnemyTuning, seed: u64) -> Self {
        Self::with_rng(target, tuning, StdRng::seed_from_u64(seed))
    }

    fn with_rng(target: Entity, tuning: EnemyTuning, rng: StdRng) -> Self {
        Self {
            target,
            enemies: Vec::new(),
            states: HashMap::new(),
            tuning: tuning.validated(),
            rng,
        }
    }

    pub fn target(&self) -> Entity {
        self.target
    }

    /// Take over `enemy`. Ships spawned on top of the target, or nose to nose
    /// with it, start out evading.
    pub fn add_enemy(&mut self, scene: &Scene, enemy: Entity) {
        if self.states.contains_key(&enemy) {
            return;
        }

        let mut initial = EnemyState::Patrol;
        if let (Some(me), Some(target)) = (scene.transform(enemy), scene.transform(self.target)) {
            let offset = target.position - me.position;
            let distance = offset.length();
            let to_target = safe_normalize(offset, me.front());
            let head_on = me.front().dot(to_target) > self.tuning.head_on_dot
                && target.front().dot(-to_target) > self.tuning.head_on_dot;
            if distance < self.tuning.spawn_evade_distance
                || (head_on && distance < self.tuning.detection_range)
            {
                initial = EnemyState::Evade;
            }
        }

        log::debug!("Enemy {:?} registered in {:?}", enemy, initial);
        self.enemies.push(enemy);
        self.states.insert(enemy, EnemyStateData::new(initial));
    }

    pub fn remove_enemy(&mut self, enemy: Entity) {
        self.enemies.retain(|e| *e != enemy);
        self.states.remove(&enemy);
    }

    pub fn state_of(&self, enemy: Entity) -> Option<EnemyState> {
        self.states.get(&enemy).map(|s| s.state)
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    pub fn update(&mut self, scene: &mut Scene, dt: f32) {
        let gone: Vec<Entity> = self
            .enemies
            .iter()
            .copied()
            .filter(|&e| !scene.is_active(e))
            .collect();
        for enemy in gone {
            log::debug!("Enemy {:?} deregistered", enemy);
            self.remove_enemy(enemy);
        }

        if !scene.is_active(self.target) {
            return;
        }
        let Some(target) = scene.transform(self.target) else {
            return;
        };
        let obstacles = planets(scene);

        for enemy in self.enemies.clone() {
            let Some(transform) = scene.transform(enemy) else {
                continue;
            };
            let angular = scene.velocity(enemy).map(|v: Velocity| v.angular).unwrap_or_default();
            let offset = target.position - transform.position;
            let to_target = safe_normalize(offset, transform.front());
            let situation = Situation {
                transform,
                angular,
                to_target,
                distance: offset.length(),
                facing: transform.front().dot(to_target),
            };

            let Some(mut data) = self.states.get(&enemy).copied() else {
                continue;
            };
            data.state_time += dt;
            if data.fire_cooldown > 0.0 {
                data.fire_cooldown -= dt;
            }
            self.transition(enemy, &mut data, &situation);

            let intent = self.behave(&mut data, &situation, dt);
            let intent = self.avoid_planets(intent, &situation, &obstacles);
            let (pitch, yaw, roll) = self.steer(&intent, &situation);

            ship::set_control_input(scene, enemy, intent.throttle, pitch, yaw, roll);
            ship::set_firing(scene, enemy, intent.fire);
            self.states.insert(enemy, data);
        }
    }

    fn transition(&self, enemy: Entity, data: &mut EnemyStateData, s: &Situation) {
        let t = &self.tuning;
        let next = match data.state {
            EnemyState::Patrol if s.distance < t.evade_trigger() => Some(EnemyState::Evade),
            EnemyState::Patrol if s.distance < t.detection_range => Some(EnemyState::Chase),
            // Checked ahead of the attack transition (the reverse of the
            // documented order) so a chaser never rams while lining up.
            EnemyState::Chase if s.distance < t.evade_trigger() => Some(EnemyState::Evade),
            EnemyState::Chase if s.distance < t.attack_range && s.facing > t.attack_facing => {
                Some(EnemyState::Attack)
            }
            EnemyState::Chase if s.distance > t.lose_range => Some(EnemyState::Patrol),
            EnemyState::Attack if s.distance > t.attack_range * 1.2 => Some(EnemyState::Chase),
            EnemyState::Attack if s.distance < t.evade_trigger() => Some(EnemyState::Evade),
            EnemyState::Evade
                if data.state_time >= t.evade_duration && s.distance > t.evade_release() =>
            {
                Some(EnemyState::Chase)
            }
            _ => None,
        };

        if let Some(next) = next {
            log::debug!(
                "Enemy {:?}: {:?} -> {:?} (distance {:.1}, facing {:.2})",
                enemy,
                data.state,
                next,
                s.distance,
                s.facing
            );
            data.enter(next);
        }
    }

    fn behave(&mut self, data: &mut EnemyStateData, s: &Situation, dt: f32) -> Intent {
        let t = &self.tuning;
        match data.state {
            EnemyState::Patrol => {
                data.patrol_refresh -= dt;
                if data.patrol_refresh <= 0.0 {
                    data.patrol_turn = Vec3::new(
                        self.rng.gen_range(-0.35..=0.35),
                        self.rng.gen_range(-0.35..=0.35),
                        self.rng.gen_range(-0.35..=0.35),
                    );
                    data.patrol_refresh = self.rng.gen_range(t.patrol_refresh[0]..=t.patrol_refresh[1]);
                }
                Intent {
                    desired: None,
                    turn: data.patrol_turn,
                    throttle: t.patrol_throttle,
                    fire: false,
                }
            }
            EnemyState::Chase => {
                data.orbit_refresh -= dt;
                if data.orbit_refresh <= 0.0 {
                    data.orbit_sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                    data.orbit_refresh = self.rng.gen_range(t.orbit_refresh[0]..=t.orbit_refresh[1]);
                }

                let far = s.distance > t.detection_range;
                let very_close = s.distance < t.spawn_evade_distance;
                let desired = if far || very_close || s.facing < 0.3 {
                    s.to_target
                } else {
                    let closeness = (1.0 - s.distance / t.detection_range).clamp(0.0, 1.0);
                    let lateral = safe_normalize(Vec3::Y.cross(s.to_target), Vec3::X) * data.orbit_sign;
                    safe_normalize(s.to_target + lateral * (0.6 * closeness), s.to_target)
                };

                let far01 = ((s.distance - t.attack_range) / (t.lose_range - t.attack_range)).clamp(0.0, 1.0);
                let facing_scale = if s.facing < 0.0 { 0.7 } else { 1.0 };
                Intent {
                    desired: Some(desired),
                    turn: Vec3::ZERO,
                    throttle: (0.6 + 0.4 * far01) * facing_scale,
                    fire: false,
                }
            }
            EnemyState::Attack => {
                let desired = if s.facing > 0.7 {
                    let lateral = safe_normalize(Vec3::Y.cross(s.to_target), Vec3::X) * data.orbit_sign;
                    safe_normalize(s.to_target + lateral * 0.25, s.to_target)
                } else {
                    s.to_target
                };
                let fire = s.facing > t.fire_facing && ship::cooldown_ready(data.fire_cooldown);
                if fire {
                    data.fire_cooldown += t.fire_interval;
                } else if data.fire_cooldown < 0.0 {
                    data.fire_cooldown = 0.0;
                }
                Intent {
                    desired: Some(desired),
                    turn: Vec3::ZERO,
                    throttle: 0.5,
                    fire,
                }
            }
            EnemyState::Evade => Intent {
                desired: Some(-s.to_target),
                turn: Vec3::ZERO,
                throttle: 1.0,
                fire: false,
            },
        }
    }

    fn avoid_planets(&self, mut intent: Intent, s: &Situation, obstacles: &[Obstacle]) -> Intent {
        let t = &self.tuning;
        let position = s.transform.position;
        let mut repulsion = Vec3::ZERO;

        for obstacle in obstacles {
            let offset = position - obstacle.center;
            let away = safe_normalize(offset, Vec3::Y);
            let surface = offset.length() - obstacle.radius;
            if surface < t.emergency_margin {
                intent.desired = Some(away);
                return intent;
            }
            if surface < t.avoid_margin {
                let falloff = 1.0 - surface / t.avoid_margin;
                repulsion += away * falloff * falloff * t.avoid_weight;
            }
        }

        if repulsion != Vec3::ZERO {
            let base = intent.desired.unwrap_or_else(|| s.transform.front());
            intent.desired = Some(safe_normalize(base + repulsion, base));
        }
        intent
    }

    /// Turn the intent into clamped pitch/yaw/roll commands.
    fn steer(&self, intent: &Intent, s: &Situation) -> (f32, f32, f32) {
        let t = &self.tuning;
        let (mut pitch, mut yaw, mut roll) = match intent.desired {
            Some(desired) => {
                let local = s.transform.rotation.inverse() * desired;
                let mut yaw = (local.x * t.steer_gain).clamp(-1.0, 1.0);
                let pitch = (-local.y * t.steer_gain).clamp(-1.0, 1.0);
                if local.z < 0.0 {
                    // Behind us: turn as hard as possible.
                    yaw = if local.x < 0.0 { -1.0 } else { 1.0 };
                }
                (pitch, yaw, yaw * t.roll_from_yaw)
            }
            None => (intent.turn.x, intent.turn.y, intent.turn.z),
        };

        pitch -= s.angular.x * t.angular_damping;
        yaw -= s.angular.y * t.angular_damping;
        roll -= s.angular.z * t.angular_damping;
        (
            pitch.clamp(-1.0, 1.0),
            yaw.clamp(-1.0, 1.0),
            roll.clamp(-1.0, 1.0),
        )
    }
}

fn planets(scene: &Scene) -> Vec<Obstacle> {
    scene
        .entities()
        .iter()
        .copied()
        .filter(|&e| scene.is_active(e))
        .filter_map(|e| {
            let body = scene.world.get::<&CelestialBody>(e).ok().map(|b| *b)?;
            if body.kind != CelestialKind::Planet {
                return None;
            }
            Some(Obstacle {
                center: scene.transform(e)?.position,
                radius: body.hit_radius,
            })
        })
        .collect()
}
