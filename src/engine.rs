//! Engine instance, builder and frame loop.
//!
//! One [`Engine`] owns its particles, phase cycle, camera and drawing
//! surface. A host drives it by calling [`Engine::tick`] once per frame and
//! feeds it pointer and resize messages in between.

use glam::Vec2;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use crate::camera::{Camera, CameraConfig, Projected, Projection};
use crate::config::EngineConfig;
use crate::depth::sort_back_to_front;
use crate::error::{ConfigError, HostError, SnapshotError};
use crate::input::{FrameInput, InputEvent, InputQueue, PointerUpdate};
use crate::integrator::{ease_colors, Integrator, Jitter, REFERENCE_FPS};
use crate::particle::{Particle, Particles};
use crate::phase::{Phase, PhaseController, TransitionBoost};
use crate::render::{FrameStats, Renderer};
use crate::shapes::{hash01, ShapeContext};
use crate::surface::{Surface, SurfaceSize};
use crate::visuals::{Palette, VisualConfig};

/// Cancellation token for a running engine.
///
/// Cloning shares the token. Once cancelled, the engine's next
/// [`tick`](Engine::tick) releases its surface and returns
/// [`FrameOutcome::Stopped`]; it never draws again until restarted.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    running: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.running.set(false);
    }

    pub fn is_cancelled(&self) -> bool {
        !self.running.get()
    }
}

/// Result of one [`Engine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The engine is not started or was stopped; nothing was drawn.
    Stopped,
    /// The surface has no area yet; nothing advanced or drew.
    Deferred,
    /// A frame was drawn.
    Rendered(FrameStats),
}

impl FrameOutcome {
    pub fn stats(&self) -> Option<FrameStats> {
        match self {
            FrameOutcome::Rendered(stats) => Some(*stats),
            _ => None,
        }
    }
}

/// A particle morph engine.
///
/// Build with [`Engine::builder`] or [`Engine::new`]. The particle count is
/// fixed at construction.
pub struct Engine {
    config: EngineConfig,
    particles: Particles,
    phases: PhaseController,
    camera: Camera,
    renderer: Renderer,
    surface: Surface,
    viewport: SurfaceSize,
    input: InputQueue,
    running: Rc<Cell<bool>>,
    time: f32,
    targets_stale: bool,
    settle_on_retarget: bool,
    projected: Vec<Option<Projected>>,
    order: Vec<usize>,
    last_stats: Option<FrameStats>,
}

impl Engine {
    /// Start configuring an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Build an engine from a complete config.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let phases = PhaseController::new(config.phases.clone(), config.transition)?;

        let count = config.particle_count;
        let stops = config.palette.colors();
        let particles = Particles::new(count, |i| {
            let tone = ShapeContext::new(i, count).progress();
            let color = crate::visuals::sample_stops(&stops, tone);
            let size = 1.0 - config.size_variation * hash01((i as u32) ^ 0x51_2E);
            Particle::at(config.spawn_position(i), color, size)
        });

        log::info!(
            "built engine '{}' with {} particles and {} phases",
            config.name,
            count,
            phases.len()
        );

        Ok(Self {
            camera: Camera::new(config.camera),
            renderer: Renderer::new(config.visuals.clone()),
            settle_on_retarget: config.spawn_radius <= 0.0,
            particles,
            phases,
            surface: Surface::new(),
            viewport: SurfaceSize::ZERO,
            input: InputQueue::new(),
            running: Rc::new(Cell::new(false)),
            time: 0.0,
            targets_stale: true,
            projected: vec![None; count],
            order: Vec::with_capacity(count),
            last_stats: None,
            config,
        })
    }

    // ========== Lifecycle ==========

    /// Arm the frame loop and return its cancellation token.
    ///
    /// Each call hands out a fresh token; handles from earlier calls are
    /// cancelled and stay cancelled.
    pub fn start(&mut self) -> LoopHandle {
        if !self.running.replace(false) {
            log::info!("starting engine '{}'", self.config.name);
        }
        self.running = Rc::new(Cell::new(true));
        LoopHandle {
            running: self.running.clone(),
        }
    }

    /// Cancel the frame loop and release the surface.
    pub fn stop(&mut self) {
        if self.running.replace(false) {
            log::info!("stopping engine '{}'", self.config.name);
        }
        self.surface.release();
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// The container changed size. Applied at the start of the next tick.
    pub fn on_resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.push_input(InputEvent::Resize(SurfaceSize::new(width, height, pixel_ratio)));
    }

    /// Pointer moved to `(nx, ny)` in `[-1, 1]`. Applied at the next tick.
    pub fn on_pointer_move(&mut self, nx: f32, ny: f32) {
        self.push_input(InputEvent::PointerMove(Vec2::new(nx, ny)));
    }

    /// Pointer left the container.
    pub fn on_pointer_leave(&mut self) {
        self.push_input(InputEvent::PointerLeave);
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Jump to phase `index` now. Returns `false` if out of range.
    pub fn force_phase(&mut self, index: usize) -> bool {
        let forced = self.phases.force(index);
        if forced {
            self.targets_stale = true;
        }
        forced
    }

    /// Advance the engine by `dt` seconds and draw a frame.
    pub fn tick(&mut self, dt: f32) -> FrameOutcome {
        let input = self.input.drain();
        self.apply_input(input);

        if !self.running.get() {
            if !self.surface.is_empty() {
                self.surface.release();
            }
            return FrameOutcome::Stopped;
        }
        if self.viewport.is_zero() {
            return FrameOutcome::Deferred;
        }
        self.surface.resize(self.viewport);

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.time += dt;
        self.camera.advance(dt);

        if self.phases.advance(dt).is_some() {
            self.targets_stale = true;
        }
        if self.targets_stale {
            self.retarget();
        } else if self.phases.is_dynamic() {
            let viewport = (self.viewport.width, self.viewport.height);
            self.phases.refresh(
                self.particles.as_mut_slice(),
                viewport,
                self.time,
                &self.config.palette,
            );
        }

        let frames = dt * REFERENCE_FPS;
        let rate = self
            .phases
            .easing_rate(self.config.integrator.base_rate().unwrap_or(1.0));
        let particles = self.particles.as_mut_slice();
        self.config.integrator.step(particles, rate, frames);
        ease_colors(particles, self.config.color_easing, frames);

        self.project();

        let square = self.phases.current_phase().shape.prefers_square();
        let stats = self.renderer.draw(
            &mut self.surface,
            self.particles.as_slice(),
            &self.projected,
            &self.order,
            square,
        );
        self.last_stats = Some(stats);
        FrameOutcome::Rendered(stats)
    }

    /// Open a window and drive this engine until it is closed.
    pub fn run(self) -> Result<(), HostError> {
        crate::host::run(self)
    }

    /// Write the current surface as a PNG.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.surface.save_png(path)
    }

    // ========== Queries ==========

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Last logical size seen by a tick.
    pub fn viewport(&self) -> SurfaceSize {
        self.viewport
    }

    /// Index of the active phase.
    pub fn current_phase(&self) -> usize {
        self.phases.current()
    }

    pub fn phase_controller(&self) -> &PhaseController {
        &self.phases
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Seconds advanced since construction.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Projection of every particle from the last rendered frame.
    pub fn projected(&self) -> &[Option<Projected>] {
        &self.projected
    }

    /// Visible particle indices in the order they were drawn.
    pub fn draw_order(&self) -> &[usize] {
        &self.order
    }

    pub fn last_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    // ========== Frame steps ==========

    fn apply_input(&mut self, input: FrameInput) {
        if let Some(size) = input.resize {
            if size != self.viewport {
                log::debug!(
                    "resize to {}x{} @{}",
                    size.width,
                    size.height,
                    size.pixel_ratio
                );
                let area_changed =
                    size.width != self.viewport.width || size.height != self.viewport.height;
                self.viewport = size;
                if area_changed && self.phases.depends_on_viewport() {
                    self.targets_stale = true;
                }
            }
        }
        match input.pointer {
            Some(PointerUpdate::Move(p)) => self.camera.set_pointer(p),
            Some(PointerUpdate::Leave) => self.camera.clear_pointer(),
            None => {}
        }
    }

    fn retarget(&mut self) {
        let viewport = (self.viewport.width, self.viewport.height);
        let particles = self.particles.as_mut_slice();
        self.phases
            .retarget(particles, viewport, self.time, &self.config.palette);
        if self.settle_on_retarget {
            for p in particles.iter_mut() {
                p.position = p.target;
                p.color = p.target_color;
            }
            self.settle_on_retarget = false;
        }
        self.targets_stale = false;
    }

    fn project(&mut self) {
        let rotation = self.camera.rotation();
        let projection = &self.config.projection;
        let center = projection.center(self.viewport.width, self.viewport.height);
        let jitter = self.config.jitter;
        let time = self.time;

        self.order.clear();
        for (i, (particle, slot)) in self
            .particles
            .iter()
            .zip(self.projected.iter_mut())
            .enumerate()
        {
            let world = match jitter {
                Some(j) => particle.position + j.offset(i, time),
                None => particle.position,
            };
            *slot = projection.project(rotation.apply(world), center);
            if slot.is_some() {
                self.order.push(i);
            }
        }

        if self.renderer.visuals().needs_depth_sort() {
            let projected = &self.projected;
            sort_back_to_front(&mut self.order, |i| {
                projected[i].map_or(f32::NEG_INFINITY, |p| p.depth)
            });
        }
    }
}

/// Fluent construction of an [`Engine`].
///
/// ```ignore
/// let engine = Engine::builder()
///     .with_name("globe")
///     .with_particle_count(500)
///     .with_phase(Phase::new("sphere", ShapeKind::Sphere))
///     .with_phase(Phase::new("cube", ShapeKind::Cube { spacing: 0.25 }))
///     .with_easing(0.05)
///     .with_visuals(|v| {
///         v.connections(60.0);
///     })
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    phases: Vec<Phase>,
    phase_duration: Option<f32>,
}

impl EngineBuilder {
    /// Start from [`EngineConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config, such as a preset.
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            phases: Vec::new(),
            phase_duration: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.config.particle_count = count;
        self
    }

    /// Append a phase. The first call replaces the starting config's phases.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Replace the phase list.
    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        self
    }

    /// Set every phase's duration in seconds, including phases added later.
    pub fn with_phase_duration(mut self, seconds: f32) -> Self {
        self.phase_duration = Some(seconds);
        self
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.config.integrator = integrator;
        self
    }

    /// Direct easing at `rate` per frame.
    pub fn with_easing(self, rate: f32) -> Self {
        self.with_integrator(Integrator::Ease { rate })
    }

    /// Spring-damper motion.
    pub fn with_spring(self, stiffness: f32, damping: f32) -> Self {
        self.with_integrator(Integrator::Spring { stiffness, damping })
    }

    pub fn with_color_easing(mut self, rate: f32) -> Self {
        self.config.color_easing = rate;
        self
    }

    /// Use `rate` for `window` seconds after each phase change.
    pub fn with_transition(mut self, window: f32, rate: f32) -> Self {
        self.config.transition = Some(TransitionBoost { window, rate });
        self
    }

    pub fn with_jitter(mut self, amplitude: f32, frequency: f32) -> Self {
        self.config.jitter = Some(Jitter {
            amplitude,
            frequency,
        });
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.config.palette = palette;
        self
    }

    /// Enable or disable pointer influence on the camera.
    pub fn with_pointer(mut self, enabled: bool) -> Self {
        self.config.camera.pointer_enabled = enabled;
        self
    }

    /// Enable motion trails, see [`VisualConfig::trails`].
    pub fn with_trails(mut self, fade: f32) -> Self {
        self.config.visuals.trails(fade);
        self
    }

    pub fn with_spawn_radius(mut self, radius: f32) -> Self {
        self.config.spawn_radius = radius;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.config.camera = camera;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.config.projection = projection;
        self
    }

    /// Configure visuals.
    ///
    /// ```ignore
    /// .with_visuals(|v| {
    ///     v.blend_mode(BlendMode::Additive);
    ///     v.trails(0.1);
    /// })
    /// ```
    pub fn with_visuals<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut VisualConfig),
    {
        configure(&mut self.config.visuals);
        self
    }

    /// The config as it would be built.
    pub fn config(&self) -> EngineConfig {
        let mut config = self.config.clone();
        if !self.phases.is_empty() {
            config.phases = self.phases.clone();
        }
        if let Some(seconds) = self.phase_duration {
            for phase in config.phases.iter_mut() {
                phase.duration = seconds;
            }
        }
        config
    }

    /// Validate and build the engine.
    pub fn build(self) -> Result<Engine, ConfigError> {
        Engine::new(self.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;

    const DT: f32 = 1.0 / 60.0;

    fn engine() -> Engine {
        Engine::builder()
            .with_particle_count(64)
            .with_spawn_radius(0.0)
            .build()
            .expect("valid engine")
    }

    #[test]
    fn test_not_started_is_stopped() {
        let mut e = engine();
        e.on_resize(200.0, 100.0, 1.0);
        assert_eq!(e.tick(DT), FrameOutcome::Stopped);
        assert!(e.surface().is_empty());
    }

    #[test]
    fn test_zero_size_defers() {
        let mut e = engine();
        e.start();
        assert_eq!(e.tick(DT), FrameOutcome::Deferred);
        e.on_resize(0.0, 0.0, 2.0);
        assert_eq!(e.tick(DT), FrameOutcome::Deferred);
        assert_eq!(e.time(), 0.0);
    }

    #[test]
    fn test_renders_after_resize() {
        let mut e = engine();
        e.start();
        e.on_resize(200.0, 100.0, 2.0);
        let stats = e.tick(DT).stats().expect("rendered");
        assert_eq!(stats.drawn + stats.culled, 64);
        assert_eq!(e.surface().physical_size(), (400, 200));
    }

    #[test]
    fn test_cancel_via_handle_releases_surface() {
        let mut e = engine();
        let handle = e.start();
        e.on_resize(100.0, 100.0, 1.0);
        assert!(e.tick(DT).stats().is_some());
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(e.tick(DT), FrameOutcome::Stopped);
        assert!(e.surface().is_empty());
    }

    #[test]
    fn test_restart_after_stop() {
        let mut e = engine();
        e.start();
        e.on_resize(100.0, 100.0, 1.0);
        e.tick(DT);
        e.stop();
        assert!(e.surface().is_empty());
        assert_eq!(e.tick(DT), FrameOutcome::Stopped);
        e.start();
        assert!(e.tick(DT).stats().is_some());
        assert!(!e.surface().is_empty());
    }

    #[test]
    fn test_spawn_radius_zero_starts_on_targets() {
        let mut e = engine();
        e.start();
        e.on_resize(100.0, 100.0, 1.0);
        e.tick(0.0);
        for p in e.particles() {
            assert_eq!(p.position, p.target);
        }
    }

    #[test]
    fn test_force_phase_retargets() {
        let mut e = Engine::builder()
            .with_particle_count(27)
            .with_phase(Phase::new("sphere", ShapeKind::Sphere))
            .with_phase(Phase::new("cube", ShapeKind::Cube { spacing: 1.0 }))
            .build()
            .expect("valid engine");
        e.start();
        e.on_resize(100.0, 100.0, 1.0);
        e.tick(DT);
        assert!(e.force_phase(1));
        assert!(!e.force_phase(2));
        e.tick(DT);
        assert_eq!(e.current_phase(), 1);
        // Corner of the 3x3x3 lattice at the default scale of 200.
        assert_eq!(e.particles().get(0).map(|p| p.target.x), Some(-200.0));
    }

    #[test]
    fn test_builder_phases_replace_defaults() {
        let config = Engine::builder()
            .with_phase(Phase::new("only", ShapeKind::Sphere))
            .with_phase_duration(2.0)
            .config();
        assert_eq!(config.phases.len(), 1);
        assert_eq!(config.phases[0].duration, 2.0);
    }

    #[test]
    fn test_phase_duration_ignores_call_order() {
        let before = Engine::builder()
            .with_phase_duration(3.0)
            .with_phase(Phase::new("a", ShapeKind::Sphere))
            .with_phase(Phase::new("b", ShapeKind::Cloud { spread: 1.0 }).with_duration(9.0))
            .config();
        let after = Engine::builder()
            .with_phase(Phase::new("a", ShapeKind::Sphere))
            .with_phase(Phase::new("b", ShapeKind::Cloud { spread: 1.0 }).with_duration(9.0))
            .with_phase_duration(3.0)
            .config();
        assert_eq!(before, after);
        assert!(before.phases.iter().all(|p| p.duration == 3.0));
    }

    #[test]
    fn test_restart_keeps_old_handles_cancelled() {
        let mut e = engine();
        let first = e.start();
        e.on_resize(100.0, 100.0, 1.0);
        first.cancel();
        assert_eq!(e.tick(DT), FrameOutcome::Stopped);

        let second = e.start();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(e.tick(DT).stats().is_some());

        // Starting while running also retires the live handle.
        let third = e.start();
        assert!(second.is_cancelled());
        assert!(!third.is_cancelled());
        second.cancel();
        assert!(e.is_running());
    }

    #[test]
    fn test_build_rejects_invalid() {
        assert!(Engine::builder().with_particle_count(0).build().is_err());
        assert!(Engine::builder().with_easing(1.5).build().is_err());
    }

    #[test]
    fn test_pointer_reaches_camera_on_next_tick() {
        let mut e = engine();
        e.start();
        e.on_resize(100.0, 100.0, 1.0);
        e.on_pointer_move(1.0, 0.0);
        assert_eq!(e.camera().pointer(), Vec2::ZERO);
        e.tick(DT);
        assert!(e.camera().pointer().x > 0.0);
    }
}
