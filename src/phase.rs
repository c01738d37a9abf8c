//! Phase controller: a timer-driven cycle through an ordered list of shapes.
//!
//! Transitions are unconditional and wrap around; there is no terminal
//! phase. The only other way to change phase is the explicit
//! [`PhaseController::force`] override.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::particle::Particle;
use crate::shapes::{ShapeContext, ShapeKind, ShapeScale};
use crate::visuals::{sample_stops, Palette};

fn default_duration() -> f32 {
    6.0
}

/// One named target geometry in the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Display name, used in logs.
    pub name: String,
    /// Generator for this phase's targets.
    pub shape: ShapeKind,
    /// Unit-space to world-space scale.
    #[serde(default)]
    pub scale: ShapeScale,
    /// Seconds before the controller advances to the next phase.
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// Palette for this phase's target colors. Falls back to the engine palette.
    #[serde(default)]
    pub palette: Option<Palette>,
    /// Steady-state easing rate for this phase, overriding the engine's.
    #[serde(default)]
    pub easing: Option<f32>,
}

impl Phase {
    /// A phase with default scale and duration.
    pub fn new(name: impl Into<String>, shape: ShapeKind) -> Self {
        Self {
            name: name.into(),
            shape,
            scale: ShapeScale::default(),
            duration: default_duration(),
            palette: None,
            easing: None,
        }
    }

    pub fn with_scale(mut self, scale: ShapeScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn with_easing(mut self, rate: f32) -> Self {
        self.easing = Some(rate);
        self
    }
}

/// Higher easing rate for a short window right after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionBoost {
    /// Seconds after entering a phase during which `rate` applies.
    pub window: f32,
    /// Easing rate used inside the window.
    pub rate: f32,
}

/// Cycles through phases on a timer and rewrites particle targets on entry.
#[derive(Debug, Clone)]
pub struct PhaseController {
    phases: Vec<Phase>,
    current: usize,
    elapsed: f32,
    boost: Option<TransitionBoost>,
}

impl PhaseController {
    /// Create a controller starting at phase 0.
    ///
    /// Fails if `phases` is empty or any duration is not a positive number.
    pub fn new(phases: Vec<Phase>, boost: Option<TransitionBoost>) -> Result<Self, ConfigError> {
        if phases.is_empty() {
            return Err(ConfigError::Invalid("at least one phase is required".into()));
        }
        if let Some(bad) = phases
            .iter()
            .find(|p| !(p.duration.is_finite() && p.duration > 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "phase '{}' has non-positive duration {}",
                bad.name, bad.duration
            )));
        }
        Ok(Self {
            phases,
            current: 0,
            elapsed: 0.0,
            boost,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Index of the active phase.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// The active phase.
    #[inline]
    pub fn current_phase(&self) -> &Phase {
        &self.phases[self.current]
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Seconds spent in the active phase.
    #[inline]
    pub fn elapsed_in_phase(&self) -> f32 {
        self.elapsed
    }

    /// Advance the timer by `dt` seconds.
    ///
    /// Returns the new phase index if at least one boundary was crossed.
    /// A large `dt` may cross several boundaries; phases wrap modulo the
    /// phase count.
    pub fn advance(&mut self, dt: f32) -> Option<usize> {
        if !(dt.is_finite() && dt > 0.0) {
            return None;
        }
        self.elapsed += dt;
        let mut changed = false;
        while self.elapsed >= self.phases[self.current].duration {
            self.elapsed -= self.phases[self.current].duration;
            self.current = (self.current + 1) % self.phases.len();
            changed = true;
        }
        if changed {
            log::debug!(
                "entering phase {} ({})",
                self.current,
                self.phases[self.current].name
            );
        }
        changed.then_some(self.current)
    }

    /// Jump to `index` and restart its timer.
    ///
    /// Returns `false` (and changes nothing) when `index` is out of range.
    pub fn force(&mut self, index: usize) -> bool {
        if index >= self.phases.len() {
            return false;
        }
        self.current = index;
        self.elapsed = 0.0;
        log::debug!("forced phase {} ({})", index, self.phases[index].name);
        true
    }

    /// Easing rate for this frame.
    ///
    /// Inside the transition window the boost rate applies; afterwards the
    /// phase's own rate, or `base` if the phase has none.
    pub fn easing_rate(&self, base: f32) -> f32 {
        match self.boost {
            Some(boost) if self.elapsed < boost.window => boost.rate,
            _ => self.current_phase().easing.unwrap_or(base),
        }
    }

    /// Whether the active phase needs fresh targets every frame.
    pub fn is_dynamic(&self) -> bool {
        self.current_phase().shape.is_dynamic()
    }

    /// Whether the active phase must be regenerated when the surface resizes.
    pub fn depends_on_viewport(&self) -> bool {
        self.current_phase().scale.depends_on_viewport()
    }

    /// Rewrite every particle's target (and target color) for the active phase.
    ///
    /// * `viewport` - logical surface size, for viewport-relative scales
    /// * `time` - elapsed engine time, for dynamic shapes
    /// * `fallback` - palette used when the phase has none
    pub fn retarget(
        &self,
        particles: &mut [Particle],
        viewport: (f32, f32),
        time: f32,
        fallback: &Palette,
    ) {
        self.write_targets(particles, viewport, time, fallback, false);
    }

    /// Move a dynamic phase's targets to `time`.
    ///
    /// A target that wraps around the shape carries its particle across by
    /// the same number of laps, so the particle keeps heading the same way.
    pub fn refresh(
        &self,
        particles: &mut [Particle],
        viewport: (f32, f32),
        time: f32,
        fallback: &Palette,
    ) {
        self.write_targets(particles, viewport, time, fallback, true);
    }

    fn write_targets(
        &self,
        particles: &mut [Particle],
        viewport: (f32, f32),
        time: f32,
        fallback: &Palette,
        carry: bool,
    ) {
        let phase = self.current_phase();
        let scale = phase.scale.resolve(viewport.0, viewport.1);
        let stops = phase.palette.as_ref().unwrap_or(fallback).colors();
        let total = particles.len();
        let lap = phase
            .shape
            .wrap_length()
            .map(|length| (length * scale).abs())
            .filter(|lap| carry && *lap > 0.0);

        for (index, particle) in particles.iter_mut().enumerate() {
            let ctx = ShapeContext::new(index, total).at_time(time);
            let target = phase.shape.generate(&ctx);
            let previous = particle.target;
            particle.target = target.position * scale;
            particle.target_color = sample_stops(&stops, target.tone.unwrap_or(ctx.progress()));

            if let Some(lap) = lap {
                let jump = particle.target.x - previous.x;
                if jump.abs() > lap * 0.5 {
                    particle.position.x += (jump / lap).round() * lap;
                    particle.velocity = Vec3::ZERO;
                }
            }
        }
    }
}
