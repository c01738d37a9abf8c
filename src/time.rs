//! Wall-clock pacing for the host loop.
//!
//! The engine itself only sees `dt` values passed to
//! [`Engine::tick`](crate::Engine::tick). [`FrameClock`] produces them from
//! real time, clamped so that a window resumed after being hidden does not
//! fast-forward through several phases in one frame.
//!
//! # Example
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // Once per redraw:
//! let dt = clock.tick();
//! engine.tick(dt);
//! ```

use std::time::{Duration, Instant};

/// Largest delta handed to the engine by default, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

/// Produces per-frame deltas from real time.
#[derive(Debug)]
pub struct FrameClock {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Delta returned by the last tick.
    delta_secs: f32,
    /// Sum of all returned deltas.
    elapsed_secs: f32,
    /// Total frames ticked.
    frame_count: u64,
    /// Upper bound on a single delta.
    max_delta: f32,
    /// Fixed delta for deterministic stepping (optional).
    fixed_delta: Option<f32>,
    /// Whether the clock is paused (window occluded).
    paused: bool,
    /// Calculated FPS (updated periodically).
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    /// Create a clock starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_secs: 0.0,
            elapsed_secs: 0.0,
            frame_count: 0,
            max_delta: DEFAULT_MAX_DELTA,
            fixed_delta: None,
            paused: false,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_secs(2),
        }
    }

    /// A clock that always returns `delta`, for headless rendering.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(delta));
        clock
    }

    /// Advance one frame and return its delta in seconds.
    ///
    /// Returns `0.0` while paused.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.delta_secs = self.fixed_delta.unwrap_or(raw).clamp(0.0, self.max_delta);
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        let since = now.duration_since(self.fps_update_time);
        if since >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            log::debug!("{:.1} fps", self.fps);
        }

        self.delta_secs
    }

    /// Delta returned by the last tick.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Sum of every delta returned so far.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume without counting the paused interval.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.last_frame = Instant::now();
        }
    }

    /// Upper bound on a single delta. Non-positive values are ignored.
    pub fn set_max_delta(&mut self, seconds: f32) {
        if seconds.is_finite() && seconds > 0.0 {
            self.max_delta = seconds;
        }
    }

    /// Use a fixed delta instead of real time. Still subject to the clamp.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.filter(|d| d.is_finite() && *d >= 0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_clock() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_tick_measures_real_time() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let dt = clock.tick();
        assert!(dt > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let mut clock = FrameClock::new();
        clock.set_max_delta(0.005);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.tick(), 0.005);
    }

    #[test]
    fn test_paused_returns_zero() {
        let mut clock = FrameClock::fixed(1.0 / 60.0);
        clock.tick();
        clock.pause();
        let elapsed = clock.elapsed();
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.elapsed(), elapsed);
        assert_eq!(clock.frame(), 1);

        clock.resume();
        assert!((clock.tick() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::fixed(1.0 / 60.0);
        thread::sleep(Duration::from_millis(50));
        assert!((clock.tick() - 1.0 / 60.0).abs() < 1e-6);
        clock.set_fixed_delta(Some(f32::NAN));
        thread::sleep(Duration::from_millis(1));
        assert!(clock.tick() > 0.0);
    }
}
