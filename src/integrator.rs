//! Per-frame motion of particles toward their targets.
//!
//! Constants are expressed per reference frame at 60 Hz, which is how scenes
//! are tuned. A tick covering `dt` seconds advances `dt * 60` reference
//! frames, so the look does not depend on the display refresh rate.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::error::ConfigError;
use crate::particle::Particle;
use crate::shapes::hash01;

/// Reference frame rate the easing and spring constants are tuned for.
pub const REFERENCE_FPS: f32 = 60.0;

/// Motion model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Integrator {
    /// `position += (target - position) * rate` per frame.
    ///
    /// Converges monotonically, never overshoots. `0 < rate <= 1`.
    Ease { rate: f32 },

    /// `velocity += (target - position) * stiffness; velocity *= damping;
    /// position += velocity` per frame.
    ///
    /// Overshoots and settles, for a livelier feel.
    Spring { stiffness: f32, damping: f32 },
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator::Ease { rate: 0.05 }
    }
}

impl Integrator {
    /// Check the constants are in their stable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Integrator::Ease { rate } => check_rate("easing rate", rate),
            Integrator::Spring { stiffness, damping } => {
                if !(stiffness.is_finite() && stiffness > 0.0 && stiffness < 1.0) {
                    return Err(ConfigError::Invalid(format!(
                        "spring stiffness must be in (0, 1), got {}",
                        stiffness
                    )));
                }
                if !(damping.is_finite() && (0.0..1.0).contains(&damping)) {
                    return Err(ConfigError::Invalid(format!(
                        "spring damping must be in [0, 1), got {}",
                        damping
                    )));
                }
                Ok(())
            }
        }
    }

    /// Easing rate used when no phase overrides it. Springs have none.
    pub fn base_rate(&self) -> Option<f32> {
        match *self {
            Integrator::Ease { rate } => Some(rate),
            Integrator::Spring { .. } => None,
        }
    }

    /// Move every particle toward its target.
    ///
    /// * `ease_rate` - per-frame rate for [`Integrator::Ease`], already
    ///   resolved against phase overrides. Springs use their own constants.
    /// * `frames` - reference frames covered by this tick (`dt * 60`).
    pub fn step(&self, particles: &mut [Particle], ease_rate: f32, frames: f32) {
        if !(frames.is_finite() && frames > 0.0) {
            return;
        }
        match *self {
            Integrator::Ease { .. } => {
                let k = frame_rate_independent(ease_rate, frames);
                for p in particles.iter_mut() {
                    p.position += (p.target - p.position) * k;
                }
            }
            Integrator::Spring { stiffness, damping } => {
                // Sub-steps never span more than one reference frame.
                let steps = frames.ceil().max(1.0);
                let h = frames / steps;
                let decay = damping.powf(h);
                for _ in 0..steps as u32 {
                    for p in particles.iter_mut() {
                        p.velocity += (p.target - p.position) * stiffness * h;
                        p.velocity *= decay;
                        p.position += p.velocity * h;
                    }
                }
            }
        }
    }
}

/// Ease every particle's color toward its target color.
pub fn ease_colors(particles: &mut [Particle], rate: f32, frames: f32) {
    if !(frames.is_finite() && frames > 0.0) {
        return;
    }
    let k = frame_rate_independent(rate, frames);
    for p in particles.iter_mut() {
        p.color += (p.target_color - p.color) * k;
    }
}

/// Per-frame rate `k` compounded over `frames`: `1 - (1 - k)^frames`.
///
/// Equals `k` for one frame and stays in `[0, 1]`, so easing never
/// overshoots at any frame rate.
pub fn frame_rate_independent(rate: f32, frames: f32) -> f32 {
    let rate = rate.clamp(0.0, 1.0);
    (1.0 - (1.0 - rate).powf(frames)).clamp(0.0, 1.0)
}

pub(crate) fn check_rate(what: &str, rate: f32) -> Result<(), ConfigError> {
    if rate.is_finite() && rate > 0.0 && rate <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be in (0, 1], got {}",
            what, rate
        )))
    }
}

/// Display-only noise added to positions before projection.
///
/// Recomputed from `(index, time)` every frame and never written back, so it
/// cannot accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jitter {
    /// Peak offset per axis in world units.
    pub amplitude: f32,
    /// Oscillations per second.
    pub frequency: f32,
}

impl Jitter {
    /// Offset for particle `index` at `time` seconds.
    pub fn offset(&self, index: usize, time: f32) -> Vec3 {
        let seed = (index as u32).wrapping_mul(3);
        let phase = Vec3::new(hash01(seed), hash01(seed + 1), hash01(seed + 2)) * TAU;
        let t = time * self.frequency * TAU;
        Vec3::new(
            (t + phase.x).sin(),
            (t * 1.3 + phase.y).sin(),
            (t * 0.7 + phase.z).sin(),
        ) * self.amplitude
    }
}
