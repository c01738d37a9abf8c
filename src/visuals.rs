//! How particles look: palettes, glyphs, blending and connections.
//!
//! This module controls how particles look, separate from the phases and
//! integrator that control where they go.
//!
//! # Usage
//!
//! ```ignore
//! Engine::builder()
//!     .with_visuals(|v| {
//!         v.blend_mode(BlendMode::Additive);
//!         v.shape(ParticleShape::Circle);
//!         v.trails(0.2);
//!         v.connections(60.0);
//!     })
//!     .build()?;
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Color palettes sampled by palette position (0.0-1.0).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Purple to yellow, perceptually uniform.
    Viridis,
    /// Deep blue through pink to yellow.
    Plasma,
    /// Navy to pale cyan.
    #[default]
    Ocean,
    /// Magenta to warm yellow.
    Sunset,
    /// White to deep blue.
    Ice,
    /// Pink, purple, blue, cyan, green.
    Neon,
    Grayscale,
    /// Brand colors, evenly spaced. An empty list samples white.
    Custom(Vec<Vec3>),
}

impl Palette {
    /// Color stops, first to last.
    pub fn colors(&self) -> Vec<Vec3> {
        match self {
            Palette::Viridis => vec![
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.282, 0.140, 0.458),
                Vec3::new(0.127, 0.566, 0.551),
                Vec3::new(0.369, 0.789, 0.383),
                Vec3::new(0.993, 0.906, 0.144),
            ],
            Palette::Plasma => vec![
                Vec3::new(0.050, 0.030, 0.528),
                Vec3::new(0.494, 0.012, 0.658),
                Vec3::new(0.798, 0.280, 0.470),
                Vec3::new(0.973, 0.580, 0.254),
                Vec3::new(0.940, 0.975, 0.131),
            ],
            Palette::Ocean => vec![
                Vec3::new(0.0, 0.2, 0.4),
                Vec3::new(0.0, 0.4, 0.6),
                Vec3::new(0.2, 0.6, 0.8),
                Vec3::new(0.4, 0.8, 0.9),
                Vec3::new(0.6, 0.9, 1.0),
            ],
            Palette::Sunset => vec![
                Vec3::new(0.5, 0.0, 0.5),
                Vec3::new(1.0, 0.2, 0.4),
                Vec3::new(1.0, 0.5, 0.2),
                Vec3::new(1.0, 0.9, 0.4),
            ],
            Palette::Ice => vec![
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(0.8, 0.9, 1.0),
                Vec3::new(0.4, 0.7, 1.0),
                Vec3::new(0.1, 0.4, 0.8),
            ],
            Palette::Neon => vec![
                Vec3::new(1.0, 0.0, 0.5),
                Vec3::new(0.5, 0.0, 1.0),
                Vec3::new(0.0, 0.5, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.5, 1.0, 0.5),
            ],
            Palette::Grayscale => vec![Vec3::ZERO, Vec3::ONE],
            Palette::Custom(colors) => colors.clone(),
        }
    }

    /// Sample the palette at `t` (clamped to 0.0-1.0), blending linearly
    /// between neighbouring stops.
    pub fn sample(&self, t: f32) -> Vec3 {
        sample_stops(&self.colors(), t)
    }
}

/// Sample pre-fetched palette stops. Lets callers coloring many particles
/// fetch [`Palette::colors`] once.
pub fn sample_stops(stops: &[Vec3], t: f32) -> Vec3 {
    match stops.len() {
        0 => Vec3::ONE,
        1 => stops[0],
        n => {
            let scaled = t.clamp(0.0, 1.0) * (n - 1) as f32;
            let lower = (scaled.floor() as usize).min(n - 2);
            stops[lower].lerp(stops[lower + 1], scaled - lower as f32)
        }
    }
}

/// Blend mode for particle rendering.
///
/// Controls how particle colors combine with the background and each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Standard alpha blending (default).
    #[default]
    Alpha,

    /// Additive blending.
    ///
    /// Overlapping particles become brighter. Good for glowing scenes.
    Additive,
}

/// Particle glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleShape {
    /// Square for grid-like phases (cube, tower), soft circle otherwise.
    #[default]
    Auto,

    /// Soft circle with a one-pixel falloff.
    Circle,

    /// Hard-edged circle with no falloff.
    CircleHard,

    /// Filled square.
    Square,
}

/// How the surface is cleared before each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearMode {
    /// Fully repaint the background (crisp look).
    #[default]
    Opaque,

    /// Paint the background at `fade` opacity over the previous frame,
    /// leaving motion trails. Lower values give longer trails.
    Trails { fade: f32 },
}

/// Proximity edges between nearby particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    /// Screen-space distance (logical pixels at scale 1.0) under which two
    /// particles are linked. Shrinks with the pair's average scale.
    pub radius: f32,
    /// Stroke opacity for a zero-length edge at scale 1.0.
    pub opacity: f32,
    /// Stroke color (RGB, 0.0-1.0).
    pub color: Vec3,
    /// Maximum edges drawn from any one particle.
    pub max_per_particle: u32,
}

impl Default for Connections {
    fn default() -> Self {
        Self {
            radius: 50.0,
            opacity: 0.35,
            color: Vec3::new(0.5, 0.7, 1.0),
            max_per_particle: 4,
        }
    }
}

/// Configuration for particle visuals.
///
/// Built using the closure passed to
/// [`EngineBuilder::with_visuals`](crate::EngineBuilder::with_visuals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Blend mode for particle rendering.
    pub blend_mode: BlendMode,
    /// Particle glyph.
    pub shape: ParticleShape,
    /// Base particle radius in logical pixels at scale 1.0.
    pub particle_size: f32,
    /// Particle opacity at scale 1.0. Farther particles fade below this.
    pub opacity: f32,
    /// Opacity floor so far particles never vanish entirely.
    pub min_opacity: f32,
    /// Background color (RGB, 0.0-1.0).
    pub background_color: Vec3,
    /// Frame clearing strategy.
    pub clear: ClearMode,
    /// Proximity edges, if enabled.
    pub connections: Option<Connections>,
    /// Draw back-to-front. Forced on when connections are enabled.
    pub depth_sort: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Alpha,
            shape: ParticleShape::Auto,
            particle_size: 2.0,
            opacity: 0.9,
            min_opacity: 0.08,
            background_color: Vec3::new(0.02, 0.02, 0.05), // Dark blue-black
            clear: ClearMode::Opaque,
            connections: None,
            depth_sort: true,
        }
    }
}

impl VisualConfig {
    /// Create a new visual config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blend mode.
    pub fn blend_mode(&mut self, mode: BlendMode) -> &mut Self {
        self.blend_mode = mode;
        self
    }

    /// Set the particle glyph.
    pub fn shape(&mut self, shape: ParticleShape) -> &mut Self {
        self.shape = shape;
        self
    }

    /// Set the base particle radius in logical pixels.
    pub fn particle_size(&mut self, size: f32) -> &mut Self {
        self.particle_size = size;
        self
    }

    /// Set the near-particle opacity.
    pub fn opacity(&mut self, opacity: f32) -> &mut Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set the background color.
    pub fn background(&mut self, color: Vec3) -> &mut Self {
        self.background_color = color;
        self
    }

    /// Enable motion trails.
    ///
    /// # Arguments
    ///
    /// * `fade` - Background opacity painted each frame (0.0-1.0). `1.0`
    ///   behaves like an opaque clear.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .with_visuals(|v| {
    ///     v.trails(0.15); // Long, soft trails
    /// })
    /// ```
    pub fn trails(&mut self, fade: f32) -> &mut Self {
        self.clear = ClearMode::Trails {
            fade: fade.clamp(0.0, 1.0),
        };
        self
    }

    /// Enable connections between nearby particles.
    ///
    /// Draws lines between projected particles within `radius` logical
    /// pixels. Enabling connections also enables depth sorting.
    pub fn connections(&mut self, radius: f32) -> &mut Self {
        let current = self.connections.unwrap_or_default();
        self.connections = Some(Connections { radius, ..current });
        self.depth_sort = true;
        self
    }

    /// Set the color for particle connections, enabling them if needed.
    pub fn connections_color(&mut self, color: Vec3) -> &mut Self {
        let current = self.connections.unwrap_or_default();
        self.connections = Some(Connections { color, ..current });
        self.depth_sort = true;
        self
    }

    /// Toggle back-to-front sorting.
    pub fn depth_sort(&mut self, enabled: bool) -> &mut Self {
        self.depth_sort = enabled;
        self
    }

    /// Whether particles must be drawn in depth order this frame.
    pub fn needs_depth_sort(&self) -> bool {
        self.depth_sort || self.connections.is_some()
    }
}
