//! Ready-made scenes.
//!
//! Each preset is a thin descriptor over [`EngineConfig`]: a phase list, a
//! palette, motion constants and a few visual choices. The frame loop is the
//! same for all of them.
//!
//! ```ignore
//! let engine = EngineBuilder::from_config(Preset::HeroGlobe.config())
//!     .with_particle_count(400)
//!     .build()?;
//! ```

use glam::Vec3;

use crate::camera::{CameraConfig, Projection};
use crate::config::EngineConfig;
use crate::integrator::{Integrator, Jitter};
use crate::phase::{Phase, TransitionBoost};
use crate::shapes::{ShapeKind, ShapeScale};
use crate::visuals::{BlendMode, Palette, VisualConfig};

/// Built-in scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Globe, cloud and torus behind a hero headline, biased right on wide screens.
    HeroGlobe,
    /// Faceted prism, ring and sphere on a lively spring.
    TrustShield,
    /// Cube lattice and layered tower with soft trails.
    ComplianceVault,
    /// Sparse cloud with glowing connections and signal jitter.
    NetworkMesh,
    /// Streaming lanes that collapse into a ring.
    LogisticsFlow,
    /// Stacked tower and lattice, drawn as squares.
    DataTower,
    /// Double helix that folds into a cell.
    HealthHelix,
}

impl Preset {
    /// Every preset, in listing order.
    pub fn all() -> &'static [Preset] {
        &[
            Preset::HeroGlobe,
            Preset::TrustShield,
            Preset::ComplianceVault,
            Preset::NetworkMesh,
            Preset::LogisticsFlow,
            Preset::DataTower,
            Preset::HealthHelix,
        ]
    }

    /// Command-line name.
    pub fn name(&self) -> &'static str {
        match self {
            Preset::HeroGlobe => "hero-globe",
            Preset::TrustShield => "trust-shield",
            Preset::ComplianceVault => "compliance-vault",
            Preset::NetworkMesh => "network-mesh",
            Preset::LogisticsFlow => "logistics-flow",
            Preset::DataTower => "data-tower",
            Preset::HealthHelix => "health-helix",
        }
    }

    pub fn from_name(name: &str) -> Option<Preset> {
        Self::all().iter().copied().find(|p| p.name() == name)
    }

    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            Preset::HeroGlobe => "globe, cloud and torus with proximity lines",
            Preset::TrustShield => "faceted prism, ring and sphere on a spring",
            Preset::ComplianceVault => "cube lattice and layered tower with trails",
            Preset::NetworkMesh => "glowing mesh with jittering nodes",
            Preset::LogisticsFlow => "streaming lanes folding into a ring",
            Preset::DataTower => "stacked layers and a lattice, square glyphs",
            Preset::HealthHelix => "double helix folding into a cell",
        }
    }

    /// The scene's full configuration.
    pub fn config(&self) -> EngineConfig {
        let base = EngineConfig {
            name: self.name().into(),
            ..EngineConfig::default()
        };
        match self {
            Preset::HeroGlobe => hero_globe(base),
            Preset::TrustShield => trust_shield(base),
            Preset::ComplianceVault => compliance_vault(base),
            Preset::NetworkMesh => network_mesh(base),
            Preset::LogisticsFlow => logistics_flow(base),
            Preset::DataTower => data_tower(base),
            Preset::HealthHelix => health_helix(base),
        }
    }
}

fn brand() -> Palette {
    Palette::Custom(vec![
        Vec3::new(0.05, 0.22, 0.55),
        Vec3::new(0.10, 0.55, 0.90),
        Vec3::new(0.45, 0.85, 1.00),
    ])
}

fn hero_globe(base: EngineConfig) -> EngineConfig {
    let mut visuals = VisualConfig::new();
    visuals.connections(38.0);
    if let Some(c) = visuals.connections.as_mut() {
        c.max_per_particle = 3;
        c.opacity = 0.25;
    }

    EngineConfig {
        particle_count: 700,
        phases: vec![
            Phase::new("globe", ShapeKind::Sphere).with_scale(ShapeScale::Viewport(0.32)),
            Phase::new("cloud", ShapeKind::Cloud { spread: 1.1 })
                .with_scale(ShapeScale::Viewport(0.3)),
            Phase::new("torus", ShapeKind::Torus { major: 1.0, tube: 0.35 })
                .with_scale(ShapeScale::Viewport(0.26)),
        ],
        transition: Some(TransitionBoost { window: 1.2, rate: 0.08 }),
        integrator: Integrator::Ease { rate: 0.035 },
        palette: brand(),
        projection: Projection {
            horizontal_bias: 0.2,
            ..Projection::default()
        },
        visuals,
        ..base
    }
}

fn trust_shield(base: EngineConfig) -> EngineConfig {
    EngineConfig {
        particle_count: 500,
        phases: vec![
            Phase::new("shield", ShapeKind::Prism { facets: 8 })
                .with_scale(ShapeScale::Viewport(0.3)),
            Phase::new("orbit", ShapeKind::Ring { turns: 5.0, thickness: 0.12 })
                .with_scale(ShapeScale::Viewport(0.34))
                .with_palette(Palette::Ice),
            Phase::new("core", ShapeKind::Sphere).with_scale(ShapeScale::Viewport(0.25)),
        ],
        integrator: Integrator::Spring { stiffness: 0.02, damping: 0.88 },
        palette: brand(),
        camera: CameraConfig {
            sensitivity: glam::Vec2::new(0.9, 0.5),
            pointer_smoothing: 0.12,
            ..CameraConfig::default()
        },
        ..base
    }
}

fn compliance_vault(base: EngineConfig) -> EngineConfig {
    let mut visuals = VisualConfig::new();
    visuals.trails(0.25);

    EngineConfig {
        particle_count: 512,
        phases: vec![
            Phase::new("vault", ShapeKind::Cube { spacing: 0.28 })
                .with_scale(ShapeScale::Viewport(0.3))
                .with_duration(7.0),
            Phase::new(
                "ledger",
                ShapeKind::Tower { layers: 8, width: 1.4, depth: 1.0, height: 1.8 },
            )
            .with_scale(ShapeScale::Viewport(0.3)),
            Phase::new("seal", ShapeKind::Prism { facets: 6 })
                .with_scale(ShapeScale::Viewport(0.28))
                .with_easing(0.03),
        ],
        palette: Palette::Viridis,
        visuals,
        ..base
    }
}

fn network_mesh(base: EngineConfig) -> EngineConfig {
    let mut visuals = VisualConfig::new();
    visuals
        .blend_mode(BlendMode::Additive)
        .particle_size(2.5)
        .connections(70.0)
        .connections_color(Vec3::new(0.6, 0.3, 1.0));
    if let Some(c) = visuals.connections.as_mut() {
        c.max_per_particle = 5;
    }

    EngineConfig {
        particle_count: 260,
        phases: vec![
            Phase::new("mesh", ShapeKind::Cloud { spread: 1.0 })
                .with_scale(ShapeScale::Viewport(0.35)),
            Phase::new("hub", ShapeKind::Sphere).with_scale(ShapeScale::Viewport(0.28)),
        ],
        jitter: Some(Jitter { amplitude: 2.0, frequency: 0.5 }),
        palette: Palette::Neon,
        visuals,
        ..base
    }
}

fn logistics_flow(base: EngineConfig) -> EngineConfig {
    EngineConfig {
        particle_count: 600,
        phases: vec![
            Phase::new(
                "lanes",
                ShapeKind::FlowLanes { lanes: 6, length: 3.0, spacing: 0.35, speed: 0.08 },
            )
            .with_scale(ShapeScale::Viewport(0.25))
            .with_duration(8.0),
            Phase::new("hub", ShapeKind::Ring { turns: 3.0, thickness: 0.2 })
                .with_scale(ShapeScale::Viewport(0.3)),
        ],
        integrator: Integrator::Ease { rate: 0.06 },
        palette: Palette::Sunset,
        camera: CameraConfig {
            auto_speed: 0.1,
            base_pitch: 0.45,
            ..CameraConfig::default()
        },
        ..base
    }
}

fn data_tower(base: EngineConfig) -> EngineConfig {
    let mut visuals = VisualConfig::new();
    visuals.particle_size(1.6);

    EngineConfig {
        particle_count: 640,
        phases: vec![
            Phase::new(
                "tower",
                ShapeKind::Tower { layers: 10, width: 1.2, depth: 1.2, height: 2.2 },
            )
            .with_scale(ShapeScale::Viewport(0.22)),
            Phase::new("lattice", ShapeKind::Cube { spacing: 0.25 })
                .with_scale(ShapeScale::Viewport(0.25)),
        ],
        palette: Palette::Plasma,
        visuals,
        ..base
    }
}

fn health_helix(base: EngineConfig) -> EngineConfig {
    let mut visuals = VisualConfig::new();
    visuals.trails(0.3);

    EngineConfig {
        particle_count: 400,
        phases: vec![
            Phase::new("helix", ShapeKind::Helix { turns: 3.0, height: 2.4 })
                .with_scale(ShapeScale::Viewport(0.2))
                .with_palette(Palette::Custom(vec![
                    Vec3::new(0.1, 0.8, 0.7),
                    Vec3::new(0.95, 0.35, 0.55),
                ])),
            Phase::new("cell", ShapeKind::Sphere).with_scale(ShapeScale::Viewport(0.25)),
        ],
        integrator: Integrator::Spring { stiffness: 0.03, damping: 0.85 },
        color_easing: 0.08,
        palette: Palette::Ocean,
        visuals,
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_validates() {
        for preset in Preset::all() {
            let config = preset.config();
            config
                .validate()
                .unwrap_or_else(|e| panic!("{} invalid: {}", preset.name(), e));
            assert_eq!(config.name, preset.name());
        }
    }

    #[test]
    fn test_lookup_by_name() {
        for preset in Preset::all() {
            assert_eq!(Preset::from_name(preset.name()), Some(*preset));
        }
        assert_eq!(Preset::from_name("nope"), None);
    }

    #[test]
    fn test_presets_cover_both_integrators() {
        let springs = Preset::all()
            .iter()
            .filter(|p| matches!(p.config().integrator, Integrator::Spring { .. }))
            .count();
        assert!(springs > 0 && springs < Preset::all().len());
    }
}
