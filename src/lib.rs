//! # Particle Morph - Interactive particle backdrops
//!
//! A fixed population of particles that eases between 3D target shapes,
//! rotated by a slowly turning camera that leans toward the pointer, and
//! drawn with perspective onto a 2D surface.
//!
//! The engine owns everything per instance: particles, phase cycle, camera
//! and drawing surface. Any number of engines can run side by side.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particle_morph::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let engine = Engine::builder()
//!         .with_name("globe")
//!         .with_particle_count(600)
//!         .with_phase(Phase::new("sphere", ShapeKind::Sphere))
//!         .with_phase(Phase::new("cube", ShapeKind::Cube { spacing: 0.25 }))
//!         .with_phase(Phase::new("torus", ShapeKind::Torus { major: 1.0, tube: 0.35 }))
//!         .with_easing(0.05)
//!         .with_visuals(|v| {
//!             v.connections(50.0);
//!         })
//!         .build()?;
//!
//!     engine.run()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Phases
//!
//! A [`Phase`] pairs a [`ShapeKind`] with a duration and an optional palette.
//! When a phase becomes active every particle gets a new target from the
//! shape generator; it then eases toward it over the following frames.
//! Phases cycle in order.
//!
//! ### Motion
//!
//! [`Integrator::Ease`] moves each particle a fixed fraction of the way to
//! its target per reference frame. [`Integrator::Spring`] carries velocity
//! and overshoots. Both scale with the real frame time, so motion looks the
//! same at 30, 60 or 144 Hz.
//!
//! ### Hosting
//!
//! [`Engine::run`] opens a window and presents frames through wgpu. Hosts
//! that draw elsewhere call [`Engine::tick`] themselves and read
//! [`Engine::surface`].
//!
//! ## Shapes
//!
//! | Shape | Layout |
//! |-------|--------|
//! | [`ShapeKind::Sphere`] | Fibonacci sphere |
//! | [`ShapeKind::Cube`] | Cubic lattice |
//! | [`ShapeKind::Torus`] | Ring of rings |
//! | [`ShapeKind::Cloud`] | Seeded random ball |
//! | [`ShapeKind::Ring`] | Flat spiral band |
//! | [`ShapeKind::Tower`] | Stacked rectangle outlines |
//! | [`ShapeKind::Prism`] | Faceted sphere |
//! | [`ShapeKind::FlowLanes`] | Moving parallel lanes |
//! | [`ShapeKind::Helix`] | Double helix |

pub mod camera;
pub mod config;
pub mod depth;
pub mod engine;
pub mod error;
mod host;
pub mod input;
pub mod integrator;
pub mod particle;
pub mod phase;
pub mod presets;
pub mod render;
pub mod shapes;
pub mod surface;
pub mod time;
pub mod visuals;

pub use camera::{Camera, CameraConfig, Projected, Projection, Rotation};
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder, FrameOutcome, LoopHandle};
pub use error::{ConfigError, EngineError, GpuError, HostError, SnapshotError};
pub use glam::{Vec2, Vec3};
pub use input::InputEvent;
pub use integrator::{Integrator, Jitter};
pub use particle::{Particle, Particles};
pub use phase::{Phase, PhaseController, TransitionBoost};
pub use presets::Preset;
pub use render::FrameStats;
pub use shapes::{ShapeContext, ShapeKind, ShapeScale, ShapeTarget};
pub use surface::{Surface, SurfaceSize};
pub use time::FrameClock;
pub use visuals::{BlendMode, ClearMode, Connections, Palette, ParticleShape, VisualConfig};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use particle_morph::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{CameraConfig, Projection};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{Engine, EngineBuilder, FrameOutcome};
    pub use crate::error::EngineError;
    pub use crate::integrator::{Integrator, Jitter};
    pub use crate::phase::Phase;
    pub use crate::presets::Preset;
    pub use crate::shapes::{ShapeKind, ShapeScale};
    pub use crate::visuals::{BlendMode, ClearMode, Palette, ParticleShape, VisualConfig};
    pub use crate::{Vec2, Vec3};
}
