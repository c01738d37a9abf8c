//! Camera rotation and perspective projection.
//!
//! The camera composes a time-driven yaw with an optional pointer offset and
//! applies it as two plane rotations: around Y first, then around X. The
//! projection is a single focal-length divide, `scale = f / (f + z)`, with
//! `+z` pointing away from the viewer and `+y` pointing down the screen.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::integrator::{check_rate, frame_rate_independent, REFERENCE_FPS};

/// Yaw and pitch in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    /// Angle around the Y axis, applied first.
    pub yaw: f32,
    /// Angle around the X axis, applied second.
    pub pitch: f32,
}

impl Rotation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Rotate a world-space point into camera space (Y, then X).
    #[inline]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let x = p.x * cy - p.z * sy;
        let z = p.x * sy + p.z * cy;

        let (sp, cp) = self.pitch.sin_cos();
        let y = p.y * cp - z * sp;
        let z = p.y * sp + z * cp;

        Vec3::new(x, y, z)
    }
}

/// Camera motion settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Automatic yaw speed in radians per second.
    pub auto_speed: f32,
    /// Resting pitch in radians.
    pub base_pitch: f32,
    /// Whether pointer movement tilts the camera.
    pub pointer_enabled: bool,
    /// Radians of (yaw, pitch) offset at the edge of the pointer range.
    pub sensitivity: Vec2,
    /// Per-frame easing of the applied offset toward the pointer.
    /// `1.0` follows the pointer immediately.
    pub pointer_smoothing: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            auto_speed: 0.25,
            base_pitch: 0.3,
            pointer_enabled: true,
            sensitivity: Vec2::new(0.6, 0.4),
            pointer_smoothing: 0.08,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.auto_speed.is_finite() && self.base_pitch.is_finite()) {
            return Err(ConfigError::Invalid("camera angles must be finite".into()));
        }
        if !(self.sensitivity.is_finite()) {
            return Err(ConfigError::Invalid("pointer sensitivity must be finite".into()));
        }
        check_rate("pointer smoothing", self.pointer_smoothing)
    }
}

/// Camera state: accumulated time plus the smoothed pointer offset.
///
/// Advances monotonically for the life of the engine.
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    elapsed: f32,
    pointer_target: Vec2,
    pointer: Vec2,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
            pointer_target: Vec2::ZERO,
            pointer: Vec2::ZERO,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Seconds of camera time.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Offset currently applied, after smoothing.
    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Record the latest pointer position in `[-1, 1]` on both axes.
    ///
    /// Ignored when pointer influence is disabled.
    pub fn set_pointer(&mut self, normalized: Vec2) {
        if self.config.pointer_enabled && normalized.is_finite() {
            self.pointer_target = normalized.clamp(Vec2::NEG_ONE, Vec2::ONE);
        }
    }

    /// Let the camera drift back to its resting orientation.
    pub fn clear_pointer(&mut self) {
        self.pointer_target = Vec2::ZERO;
    }

    /// Advance camera time by `dt` seconds and ease the pointer offset.
    pub fn advance(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.elapsed += dt;
        let k = frame_rate_independent(self.config.pointer_smoothing, dt * REFERENCE_FPS);
        self.pointer += (self.pointer_target - self.pointer) * k;
    }

    /// Rotation for the current frame.
    pub fn rotation(&self) -> Rotation {
        let offset = if self.config.pointer_enabled {
            self.pointer * self.config.sensitivity
        } else {
            Vec2::ZERO
        };
        Rotation {
            yaw: self.elapsed * self.config.auto_speed + offset.x,
            pitch: self.config.base_pitch + offset.y,
        }
    }
}

/// A point that survived projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Screen x in logical pixels.
    pub x: f32,
    /// Screen y in logical pixels.
    pub y: f32,
    /// Perspective scale, `f / (f + z)`. Always finite and positive.
    pub scale: f32,
    /// Camera-space z, larger is farther.
    pub depth: f32,
}

/// Perspective divide and screen placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    /// Distance from the eye to the `z = 0` plane, in world units.
    pub focal_length: f32,
    /// Points with camera-space z beyond this are culled.
    pub far_plane: f32,
    /// Points must stay this far in front of the eye (`f + z > near_margin`).
    pub near_margin: f32,
    /// Logical width at and above which the center is biased.
    pub wide_breakpoint: f32,
    /// Horizontal center shift on wide viewports, as a fraction of the width.
    pub horizontal_bias: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            focal_length: 400.0,
            far_plane: 1000.0,
            near_margin: 1.0,
            wide_breakpoint: 1024.0,
            horizontal_bias: 0.0,
        }
    }
}

impl Projection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.focal_length.is_finite() && self.focal_length > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "focal length must be positive, got {}",
                self.focal_length
            )));
        }
        if !(self.far_plane.is_finite() && self.far_plane > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "far plane must be positive, got {}",
                self.far_plane
            )));
        }
        if !(self.near_margin.is_finite() && self.near_margin > 0.0) {
            return Err(ConfigError::Invalid("near margin must be positive".into()));
        }
        if !(self.wide_breakpoint.is_finite() && self.horizontal_bias.is_finite()) {
            return Err(ConfigError::Invalid("centering values must be finite".into()));
        }
        Ok(())
    }

    /// Screen-space origin for a `width` x `height` logical viewport.
    pub fn center(&self, width: f32, height: f32) -> Vec2 {
        let bias = if width >= self.wide_breakpoint {
            self.horizontal_bias * width
        } else {
            0.0
        };
        Vec2::new(width * 0.5 + bias, height * 0.5)
    }

    /// Project a camera-space point.
    ///
    /// Returns `None` for points behind or too close to the eye, beyond the
    /// far plane, or with non-finite coordinates.
    #[inline]
    pub fn project(&self, p: Vec3, center: Vec2) -> Option<Projected> {
        if !p.is_finite() || p.z > self.far_plane {
            return None;
        }
        let denom = self.focal_length + p.z;
        if denom <= self.near_margin {
            return None;
        }
        let scale = self.focal_length / denom;
        Some(Projected {
            x: center.x + p.x * scale,
            y: center.y + p.y * scale,
            scale,
            depth: p.z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_origin_projects_to_center() {
        let proj = Projection::default();
        let center = proj.center(800.0, 600.0);
        let p = proj.project(Vec3::ZERO, center).expect("origin is visible");
        assert_eq!((p.x, p.y), (400.0, 300.0));
        assert_eq!(p.scale, 1.0);
    }

    #[test]
    fn test_near_focal_points_are_rejected() {
        let proj = Projection::default();
        let c = Vec2::ZERO;
        assert!(proj.project(Vec3::new(0.0, 0.0, -400.0), c).is_none());
        assert!(proj.project(Vec3::new(0.0, 0.0, -399.5), c).is_none());
        assert!(proj.project(Vec3::new(0.0, 0.0, -600.0), c).is_none());

        // Just outside the margin: huge but finite.
        let p = proj
            .project(Vec3::new(1.0, 1.0, -398.0), c)
            .expect("in front of the eye");
        assert!(p.scale.is_finite() && p.x.is_finite());
        assert!(p.scale > 100.0);
    }

    #[test]
    fn test_far_plane_and_nan_culled() {
        let proj = Projection::default();
        assert!(proj.project(Vec3::new(0.0, 0.0, 1001.0), Vec2::ZERO).is_none());
        assert!(proj.project(Vec3::new(f32::NAN, 0.0, 0.0), Vec2::ZERO).is_none());
    }

    #[test]
    fn test_farther_is_smaller() {
        let proj = Projection::default();
        let near = proj.project(Vec3::new(10.0, 0.0, -100.0), Vec2::ZERO).expect("visible");
        let far = proj.project(Vec3::new(10.0, 0.0, 100.0), Vec2::ZERO).expect("visible");
        assert!(near.scale > 1.0 && far.scale < 1.0);
        assert!(near.x > far.x);
    }

    #[test]
    fn test_wide_viewport_bias() {
        let proj = Projection {
            horizontal_bias: 0.25,
            ..Projection::default()
        };
        assert_eq!(proj.center(800.0, 600.0), Vec2::new(400.0, 300.0));
        assert_eq!(proj.center(1200.0, 600.0), Vec2::new(900.0, 300.0));
    }

    #[test]
    fn test_rotation_order_is_y_then_x() {
        let r = Rotation::new(FRAC_PI_2, FRAC_PI_2);
        // Y by 90 degrees takes +x to +z; X by 90 degrees then takes +z to -y.
        let p = r.apply(Vec3::X);
        assert!((p - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);

        // X first would leave +x alone and Y would then carry it to +z.
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn test_rotation_preserves_length() {
        let r = Rotation::new(1.1, -0.7);
        let p = Vec3::new(3.0, -4.0, 12.0);
        assert!((r.apply(p).length() - 13.0).abs() < 1e-4);
    }

    #[test]
    fn test_camera_yaw_follows_time_and_pointer() {
        let mut cam = Camera::new(CameraConfig {
            auto_speed: 0.5,
            base_pitch: 0.0,
            pointer_smoothing: 1.0,
            sensitivity: Vec2::new(1.0, 2.0),
            pointer_enabled: true,
        });
        cam.advance(2.0);
        assert!((cam.rotation().yaw - 1.0).abs() < 1e-6);

        cam.set_pointer(Vec2::new(5.0, -0.5));
        cam.advance(1.0 / 60.0);
        assert_eq!(cam.pointer(), Vec2::new(1.0, -0.5));
        let r = cam.rotation();
        assert!((r.pitch + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_disabled_is_ignored() {
        let mut cam = Camera::new(CameraConfig {
            pointer_enabled: false,
            pointer_smoothing: 1.0,
            ..CameraConfig::default()
        });
        cam.set_pointer(Vec2::ONE);
        cam.advance(0.1);
        assert_eq!(cam.pointer(), Vec2::ZERO);
        assert_eq!(cam.rotation().pitch, cam.config().base_pitch);
    }

    #[test]
    fn test_pointer_smoothing_eases() {
        let mut cam = Camera::new(CameraConfig {
            pointer_smoothing: 0.5,
            ..CameraConfig::default()
        });
        cam.set_pointer(Vec2::new(1.0, 0.0));
        cam.advance(1.0 / 60.0);
        assert!((cam.pointer().x - 0.5).abs() < 1e-5);
        cam.clear_pointer();
        cam.advance(1.0 / 60.0);
        assert!((cam.pointer().x - 0.25).abs() < 1e-5);
    }
}
