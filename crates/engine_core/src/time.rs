//! Time management for the game loop.

use std::time::{Duration, Instant};

/// Largest frame delta the simulation will accept (10 FPS).
///
/// A stalled window or a debugger break would otherwise hand the integrator
/// a multi-second step and tunnel ships through planets.
pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(100);

/// Manages frame timing and delta time calculation.
#[derive(Debug)]
pub struct Time {
    /// Wall-clock instant of the previous `tick`.
    last_frame: Option<Instant>,
    /// Scaled, clamped duration of the last frame.
    delta: Duration,
    /// Total scaled simulation time.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Simulation speed multiplier (0 pauses logic, 0.5 is slow motion).
    time_scale: f32,
    /// Upper bound on a single raw frame delta.
    max_delta: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: None,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            time_scale: 1.0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Forget the previous frame instant so the next `tick` yields a zero delta.
    pub fn reset(&mut self) {
        self.last_frame = None;
        self.delta = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        self.frame_count = 0;
    }

    /// Sample the wall clock and advance by the time since the last tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let raw = match self.last_frame {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_frame = Some(now);
        self.advance(raw);
    }

    /// Advance by an externally measured raw delta (clamped, then scaled).
    pub fn advance(&mut self, raw: Duration) {
        let clamped = if raw > self.max_delta {
            log::trace!("Frame delta {:?} clamped to {:?}", raw, self.max_delta);
            self.max_delta
        } else {
            raw
        };
        self.delta = clamped.mul_f32(self.time_scale.max(0.0));
        self.elapsed += self.delta;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the delta time as a Duration.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn set_max_delta(&mut self, max_delta: Duration) {
        self.max_delta = max_delta;
    }

    /// Get the current FPS (from the last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_deltas_are_clamped() {
        let mut time = Time::new();
        time.advance(Duration::from_secs(3));
        assert!((time.delta_seconds() - 0.1).abs() < 1e-6);
        assert_eq!(time.frame_count(), 1);
    }

    #[test]
    fn time_scale_applies_after_clamp() {
        let mut time = Time::new();
        time.set_time_scale(0.5);
        time.advance(Duration::from_millis(20));
        assert!((time.delta_seconds() - 0.01).abs() < 1e-6);
        time.advance(Duration::from_secs(1));
        assert!((time.delta_seconds() - 0.05).abs() < 1e-6);
        assert!((time.elapsed_seconds() - 0.06).abs() < 1e-5);
    }

    #[test]
    fn first_tick_is_zero() {
        let mut time = Time::new();
        time.tick();
        assert_eq!(time.delta(), Duration::ZERO);
        assert_eq!(time.fps(), 0.0);
    }
}
