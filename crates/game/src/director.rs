//! Wave pacing: when enemies spawn, how many, and where.

use std::f32::consts::TAU;

use engine_core::Transform;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FIRST_INTERMISSION: f32 = 2.0;
const INTERMISSION: f32 = 4.0;
const MAX_ALIVE: usize = 8;
const BURST_FROM_WAVE: u32 = 3;
const BURST_CHANCE: f64 = 0.35;
const STALL_REINFORCE_AFTER: f32 = 18.0;
const JITTER: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectorPhase {
    Intermission { remaining: f32 },
    Spawning,
    /// Quota met; waiting for the survivors to die.
    Cleanup { stall: f32 },
    Victory,
}

/// Drives the enemy spawn schedule across a fixed number of waves.
#[derive(Debug, Clone)]
pub struct EncounterDirector {
    phase: DirectorPhase,
    wave: u32,
    total_waves: u32,
    spawned_this_wave: u32,
    spawn_timer: f32,
    /// Alternates pincer sides.
    pincer_left: bool,
    rng: StdRng,
}

impl EncounterDirector {
    pub fn new(total_waves: u32) -> Self {
        Self::with_rng(total_waves, StdRng::from_entropy())
    }

    pub fn with_seed(total_waves: u32, seed: u64) -> Self {
        Self::with_rng(total_waves, StdRng::seed_from_u64(seed))
    }

    fn with_rng(total_waves: u32, rng: StdRng) -> Self {
        Self {
            phase: DirectorPhase::Intermission {
                remaining: FIRST_INTERMISSION,
            },
            wave: 0,
            total_waves: total_waves.max(1),
            spawned_this_wave: 0,
            spawn_timer: 0.0,
            pincer_left: true,
            rng,
        }
    }

    pub fn phase(&self) -> DirectorPhase {
        self.phase
    }

    /// Current wave, 1-based; 0 before the first wave starts.
    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn total_waves(&self) -> u32 {
        self.total_waves
    }

    pub fn is_victory(&self) -> bool {
        self.phase == DirectorPhase::Victory
    }

    pub fn wave_quota(wave: u32) -> u32 {
        3 + 2 * wave
    }

    pub fn alive_cap(wave: u32) -> usize {
        (3 + wave as usize).min(MAX_ALIVE)
    }

    pub fn spawn_interval(wave: u32) -> f32 {
        (1.8 - 0.15 * wave as f32).max(0.6)
    }

    /// Advance the schedule. `alive` is the number of enemies still flying.
    /// Returns the positions to spawn enemies at this frame.
    pub fn update(&mut self, dt: f32, alive: usize, player: &Transform) -> Vec<Vec3> {
        let mut spawns = Vec::new();
        match self.phase {
            DirectorPhase::Intermission { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.start_wave();
                } else {
                    self.phase = DirectorPhase::Intermission { remaining };
                }
            }
            DirectorPhase::Spawning => {
                let quota = Self::wave_quota(self.wave);
                self.spawn_timer -= dt;
                if self.spawn_timer <= 0.0 && alive < Self::alive_cap(self.wave) {
                    let burst = self.wave >= BURST_FROM_WAVE && self.rng.gen_bool(BURST_CHANCE);
                    let wanted: u32 = if burst { 2 } else { 1 };
                    let room = (Self::alive_cap(self.wave) - alive) as u32;
                    let count = wanted.min(room).min(quota - self.spawned_this_wave);
                    for _ in 0..count {
                        spawns.push(self.spawn_position(player));
                    }
                    self.spawned_this_wave += count;
                    self.spawn_timer = Self::spawn_interval(self.wave);
                }
                if self.spawned_this_wave >= quota {
                    log::debug!("Wave {} fully deployed", self.wave);
                    self.phase = DirectorPhase::Cleanup { stall: 0.0 };
                }
            }
            DirectorPhase::Cleanup { stall } => {
                if alive == 0 {
                    self.finish_wave();
                } else {
                    let mut stall = stall + dt;
                    if stall > STALL_REINFORCE_AFTER {
                        log::info!("Wave {} stalled; sending reinforcements", self.wave);
                        for _ in 0..2 {
                            spawns.push(self.spawn_position(player));
                        }
                        stall = 0.0;
                    }
                    self.phase = DirectorPhase::Cleanup { stall };
                }
            }
            DirectorPhase::Victory => {}
        }
        spawns
    }

    fn start_wave(&mut self) {
        self.wave += 1;
        self.spawned_this_wave = 0;
        self.spawn_timer = 0.0;
        self.phase = DirectorPhase::Spawning;
        log::info!(
            "Wave {}/{} begins: {} enemies",
            self.wave,
            self.total_waves,
            Self::wave_quota(self.wave)
        );
    }

    fn finish_wave(&mut self) {
        if self.wave >= self.total_waves {
            log::info!("All {} waves cleared", self.total_waves);
            self.phase = DirectorPhase::Victory;
        } else {
            log::info!("Wave {} cleared", self.wave);
            self.phase = DirectorPhase::Intermission {
                remaining: INTERMISSION,
            };
        }
    }

    /// Pick a spawn point around the player using this wave's pattern.
    fn spawn_position(&mut self, player: &Transform) -> Vec3 {
        let base = match self.wave % 3 {
            1 => {
                // Uniform on a sphere shell.
                let radius = 150.0;
                let phi = (1.0 - 2.0 * self.rng.gen::<f32>()).acos();
                let theta = self.rng.gen::<f32>() * TAU;
                player.position
                    + Vec3::new(
                        radius * phi.sin() * theta.cos(),
                        radius * phi.sin() * theta.sin(),
                        radius * phi.cos(),
                    )
            }
            2 => {
                let side = if self.pincer_left { 1.0 } else { -1.0 };
                self.pincer_left = !self.pincer_left;
                player.position + player.right() * (140.0 * side) + player.front() * 40.0
            }
            _ => {
                let spread = self.rng.gen_range(-60.0..=60.0);
                player.position + player.front() * 170.0 + player.right() * spread
            }
        };
        base + Vec3::new(
            self.rng.gen_range(-JITTER..=JITTER),
            self.rng.gen_range(-JITTER..=JITTER),
            self.rng.gen_range(-JITTER..=JITTER),
        )
    }
}
