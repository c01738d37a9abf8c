//! Construction parameters for an engine.
//!
//! [`EngineConfig`] is the whole descriptor of a scene: particle count,
//! phases, motion constants, palette, camera, projection and visuals. The
//! builder edits one of these; presets are just functions returning one; the
//! CLI can load and save them as JSON.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::camera::{CameraConfig, Projection};
use crate::error::ConfigError;
use crate::integrator::{check_rate, Integrator, Jitter};
use crate::phase::{Phase, TransitionBoost};
use crate::shapes::{ShapeKind, ShapeScale};
use crate::visuals::{Palette, VisualConfig};

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scene name, used in logs and the window title.
    pub name: String,
    /// Number of particles. Fixed for the life of the engine.
    pub particle_count: usize,
    /// Ordered phase cycle.
    pub phases: Vec<Phase>,
    /// Faster easing right after each phase change.
    pub transition: Option<TransitionBoost>,
    /// Position integrator.
    pub integrator: Integrator,
    /// Per-frame color easing rate.
    pub color_easing: f32,
    /// Display-only positional noise.
    pub jitter: Option<Jitter>,
    /// Palette for phases that do not carry their own.
    pub palette: Palette,
    /// Radius of the seeded ball particles start in, in world units.
    /// `0.0` starts every particle on its first target.
    pub spawn_radius: f32,
    /// Fraction (0.0-1.0) by which per-particle size may shrink below 1.0.
    pub size_variation: f32,
    pub camera: CameraConfig,
    pub projection: Projection,
    pub visuals: VisualConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "untitled".into(),
            particle_count: 600,
            phases: vec![
                Phase::new("sphere", ShapeKind::Sphere),
                Phase::new("cube", ShapeKind::Cube { spacing: 0.25 }),
                Phase::new("ring", ShapeKind::Ring { turns: 6.0, thickness: 0.15 }),
            ],
            transition: None,
            integrator: Integrator::default(),
            color_easing: 0.05,
            jitter: None,
            palette: Palette::default(),
            spawn_radius: 300.0,
            size_variation: 0.4,
            camera: CameraConfig::default(),
            projection: Projection::default(),
            visuals: VisualConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read a config from a JSON file. The result is not validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every parameter an engine depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::Invalid("particle_count must be > 0".into()));
        }
        if self.phases.is_empty() {
            return Err(ConfigError::Invalid("at least one phase is required".into()));
        }
        for phase in &self.phases {
            if !(phase.duration.is_finite() && phase.duration > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "phase '{}' has non-positive duration {}",
                    phase.name, phase.duration
                )));
            }
            if let Some(rate) = phase.easing {
                check_rate(&format!("phase '{}' easing", phase.name), rate)?;
            }
            let scale = match phase.scale {
                ShapeScale::Fixed(s) | ShapeScale::Viewport(s) => s,
            };
            if !scale.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "phase '{}' has a non-finite scale",
                    phase.name
                )));
            }
            phase.shape.validate()?;
        }
        if let Some(boost) = self.transition {
            check_rate("transition rate", boost.rate)?;
            if !(boost.window.is_finite() && boost.window >= 0.0) {
                return Err(ConfigError::Invalid("transition window must be >= 0".into()));
            }
        }
        self.integrator.validate()?;
        check_rate("color easing", self.color_easing)?;
        if let Some(jitter) = self.jitter {
            if !(jitter.amplitude.is_finite() && jitter.frequency.is_finite()) {
                return Err(ConfigError::Invalid("jitter must be finite".into()));
            }
        }
        if !(self.spawn_radius.is_finite() && self.spawn_radius >= 0.0) {
            return Err(ConfigError::Invalid("spawn_radius must be >= 0".into()));
        }
        if !(0.0..=1.0).contains(&self.size_variation) {
            return Err(ConfigError::Invalid("size_variation must be in [0, 1]".into()));
        }
        if !(self.visuals.particle_size.is_finite() && self.visuals.particle_size > 0.0) {
            return Err(ConfigError::Invalid("particle_size must be > 0".into()));
        }
        if !self.visuals.background_color.is_finite() {
            return Err(ConfigError::Invalid("background color must be finite".into()));
        }
        self.camera.validate()?;
        self.projection.validate()
    }

    /// Seeded start position for particle `index`.
    pub(crate) fn spawn_position(&self, index: usize) -> Vec3 {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        if self.spawn_radius <= 0.0 {
            return Vec3::ZERO;
        }
        let mut rng = SmallRng::seed_from_u64(index as u64 ^ 0x5EED_5EED);
        let dir = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        )
        .normalize_or_zero();
        dir * self.spawn_radius * rng.gen::<f32>().cbrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().expect("default config validates");
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EngineConfig::default();
        config.name = "round-trip".into();
        config.jitter = Some(Jitter { amplitude: 1.5, frequency: 2.0 });
        config.visuals.trails(0.2);
        let json = config.to_json().expect("serializes");
        let back = EngineConfig::from_json(&json).expect("parses");
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "name": "tiny",
            "particle_count": 32,
            "phases": [
                { "name": "ball", "shape": { "kind": "sphere" } },
                { "name": "lanes",
                  "shape": { "kind": "flow_lanes", "lanes": 4, "length": 2.0,
                             "spacing": 0.3, "speed": 0.1 },
                  "scale": { "viewport": 0.4 }, "duration": 3.0 }
            ],
            "integrator": { "model": "spring", "stiffness": 0.05, "damping": 0.85 }
        }"#;
        let config = EngineConfig::from_json(json).expect("parses");
        assert_eq!(config.particle_count, 32);
        assert_eq!(config.phases[0].duration, 6.0);
        assert_eq!(config.phases[1].scale, ShapeScale::Viewport(0.4));
        assert_eq!(config.projection, Projection::default());
        config.validate().expect("valid");
    }

    #[test]
    fn test_validation_failures() {
        let cases: Vec<(&str, fn(&mut EngineConfig))> = vec![
            ("zero count", |c: &mut EngineConfig| c.particle_count = 0),
            ("no phases", |c: &mut EngineConfig| c.phases.clear()),
            ("zero duration", |c: &mut EngineConfig| c.phases[0].duration = 0.0),
            ("easing", |c: &mut EngineConfig| {
                c.integrator = Integrator::Ease { rate: 0.0 }
            }),
            ("damping", |c: &mut EngineConfig| {
                c.integrator = Integrator::Spring { stiffness: 0.1, damping: 1.2 }
            }),
            ("focal", |c: &mut EngineConfig| c.projection.focal_length = -1.0),
            ("far", |c: &mut EngineConfig| c.projection.far_plane = 0.0),
            ("phase easing", |c: &mut EngineConfig| c.phases[1].easing = Some(2.0)),
            ("shape", |c: &mut EngineConfig| {
                c.phases[0].shape = ShapeKind::Cube { spacing: f32::NAN }
            }),
        ];
        for (label, mutate) in cases {
            let mut config = EngineConfig::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{} should be rejected",
                label
            );
        }
    }

    #[test]
    fn test_bad_json_is_a_json_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_spawn_positions_are_seeded() {
        let config = EngineConfig::default();
        assert_eq!(config.spawn_position(7), config.spawn_position(7));
        assert!(config.spawn_position(7).length() <= config.spawn_radius + 1e-3);
        let settled = EngineConfig {
            spawn_radius: 0.0,
            ..EngineConfig::default()
        };
        assert_eq!(settled.spawn_position(7), Vec3::ZERO);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join("particle-morph-config-test.json");
        let config = EngineConfig::default();
        config.save(&path).expect("writes");
        let back = EngineConfig::load(&path).expect("reads");
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, config);
    }
}
