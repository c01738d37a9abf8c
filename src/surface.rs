//! Software drawing surface.
//!
//! The engine owns one [`Surface`] and rasterizes every frame into it on the
//! CPU. Drawing calls take logical coordinates; the surface multiplies by the
//! device-pixel ratio. Every call clips to the pixel buffer, so drawing into a
//! zero-size or released surface is a no-op.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::path::Path;

use crate::error::SnapshotError;
use crate::visuals::BlendMode;

/// One RGBA8 pixel, laid out for direct upload as `Rgba8Unorm`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Opaque pixel from an RGB color in 0.0-1.0.
    pub fn opaque(color: Vec3) -> Self {
        Self {
            r: to_u8(color.x),
            g: to_u8(color.y),
            b: to_u8(color.z),
            a: 255,
        }
    }

    /// RGB channels as 0.0-1.0.
    pub fn rgb(&self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Logical size of the surface plus its device-pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    /// Logical width.
    pub width: f32,
    /// Logical height.
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub pixel_ratio: f32,
}

impl SurfaceSize {
    /// Sanitized size: negative or non-finite dimensions become zero and a
    /// bad ratio becomes `1.0`.
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let dim = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            width: dim(width),
            height: dim(height),
            pixel_ratio,
        }
    }

    pub const ZERO: SurfaceSize = SurfaceSize {
        width: 0.0,
        height: 0.0,
        pixel_ratio: 1.0,
    };

    /// Backing buffer size in physical pixels.
    pub fn physical(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round() as u32,
            (self.height * self.pixel_ratio).round() as u32,
        )
    }

    /// Whether there is nothing to draw into.
    pub fn is_zero(&self) -> bool {
        let (w, h) = self.physical();
        w == 0 || h == 0
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::ZERO
    }
}

/// CPU pixel buffer with a handful of 2D primitives.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    size: SurfaceSize,
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Surface {
    /// An empty surface. Call [`Surface::resize`] before drawing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size: SurfaceSize) -> Self {
        let mut surface = Self::new();
        surface.resize(size);
        surface
    }

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Physical dimensions of the pixel buffer.
    #[inline]
    pub fn physical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Match the surface to `size`.
    ///
    /// Returns `true` if the pixel buffer was reallocated. Repeating the
    /// same size is a cheap no-op.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        let (width, height) = size.physical();
        let unchanged = width == self.width
            && height == self.height
            && size.pixel_ratio == self.size.pixel_ratio;
        self.size = size;
        if unchanged {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![Pixel::default(); width as usize * height as usize];
        true
    }

    /// Drop the pixel buffer.
    pub fn release(&mut self) {
        self.size = SurfaceSize::ZERO;
        self.width = 0;
        self.height = 0;
        self.pixels = Vec::new();
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Raw RGBA8 bytes, row-major, no padding.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Pixel at physical coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Fill the whole surface with an opaque color.
    pub fn clear(&mut self, color: Vec3) {
        self.pixels.fill(Pixel::opaque(color));
    }

    /// Paint `color` at `alpha` over the whole surface.
    pub fn fade(&mut self, color: Vec3, alpha: f32) {
        if alpha >= 1.0 {
            self.clear(color);
            return;
        }
        for px in &mut self.pixels {
            blend(px, color, alpha, BlendMode::Alpha);
        }
    }

    /// Filled circle centered at `center` (logical).
    ///
    /// `soft` gives the edge a one-pixel falloff.
    pub fn fill_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        color: Vec3,
        alpha: f32,
        mode: BlendMode,
        soft: bool,
    ) {
        let ratio = self.size.pixel_ratio;
        let c = center * ratio;
        let r = (radius * ratio).max(0.5);
        let pad = Vec2::splat(r + 1.0);
        let Some((x0, y0, x1, y1)) = self.clip_box(c - pad, c + pad) else {
            return;
        };

        for y in y0..y1 {
            for x in x0..x1 {
                let d = (Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - c).length();
                let coverage = if soft {
                    (r - d + 0.5).clamp(0.0, 1.0)
                } else if d <= r {
                    1.0
                } else {
                    0.0
                };
                if coverage > 0.0 {
                    let i = (y * self.width + x) as usize;
                    blend(&mut self.pixels[i], color, alpha * coverage, mode);
                }
            }
        }
    }

    /// Filled axis-aligned square of half-extent `half` (logical).
    pub fn fill_rect(&mut self, center: Vec2, half: f32, color: Vec3, alpha: f32, mode: BlendMode) {
        let ratio = self.size.pixel_ratio;
        let c = center * ratio;
        let h = (half * ratio).max(0.5);
        let Some((x0, y0, x1, y1)) = self.clip_box(c - Vec2::splat(h), c + Vec2::splat(h)) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let i = (y * self.width + x) as usize;
                blend(&mut self.pixels[i], color, alpha, mode);
            }
        }
    }

    /// One-pixel line from `a` to `b` (logical), clipped to the surface.
    pub fn draw_line(&mut self, a: Vec2, b: Vec2, color: Vec3, alpha: f32, mode: BlendMode) {
        let ratio = self.size.pixel_ratio;
        let bounds = Vec2::new(self.width as f32, self.height as f32);
        let Some((a, b)) = clip_segment(a * ratio, b * ratio, bounds) else {
            return;
        };

        let delta = b - a;
        let steps = delta.abs().max_element().ceil().max(1.0) as u32;
        let step = delta / steps as f32;
        let mut p = a;
        for _ in 0..=steps {
            let (x, y) = (p.x as i64, p.y as i64);
            if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
                let i = (y as u32 * self.width + x as u32) as usize;
                blend(&mut self.pixels[i], color, alpha, mode);
            }
            p += step;
        }
    }

    /// Write the surface as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        if self.is_empty() {
            return Err(SnapshotError::EmptySurface);
        }
        image::save_buffer(
            path,
            self.as_bytes(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    /// Integer pixel range covering `[min, max)`, or `None` if off-surface.
    fn clip_box(&self, min: Vec2, max: Vec2) -> Option<(u32, u32, u32, u32)> {
        if self.pixels.is_empty() || !(min.is_finite() && max.is_finite()) {
            return None;
        }
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(self.height);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

#[inline]
fn blend(dst: &mut Pixel, color: Vec3, alpha: f32, mode: BlendMode) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let current = dst.rgb();
    let out = match mode {
        BlendMode::Alpha => current.lerp(color, alpha),
        BlendMode::Additive => current + color * alpha,
    };
    *dst = Pixel::opaque(out);
}

/// Liang-Barsky clip of segment `a`-`b` against `[0, bounds]`.
fn clip_segment(a: Vec2, b: Vec2, bounds: Vec2) -> Option<(Vec2, Vec2)> {
    if bounds.x <= 0.0 || bounds.y <= 0.0 || !(a.is_finite() && b.is_finite()) {
        return None;
    }
    let d = b - a;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    let edges = [
        (-d.x, a.x),
        (d.x, bounds.x - a.x),
        (-d.y, a.y),
        (d.y, bounds.y - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
    }
    Some((a + d * t0, a + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: f32, h: f32) -> Surface {
        let mut s = Surface::with_size(SurfaceSize::new(w, h, 1.0));
        s.clear(Vec3::ZERO);
        s
    }

    #[test]
    fn test_pixel_layout_is_rgba8() {
        assert_eq!(std::mem::size_of::<Pixel>(), 4);
        let s = {
            let mut s = surface(2.0, 1.0);
            s.clear(Vec3::new(1.0, 0.0, 0.0));
            s
        };
        assert_eq!(s.as_bytes(), &[255, 0, 0, 255, 255, 0, 0, 255]);
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut s = Surface::new();
        assert!(s.resize(SurfaceSize::new(10.0, 10.0, 2.0)));
        assert_eq!(s.physical_size(), (20, 20));
        s.clear(Vec3::ONE);
        assert!(!s.resize(SurfaceSize::new(10.0, 10.0, 2.0)));
        assert_eq!(s.pixel(0, 0), Some(Pixel::opaque(Vec3::ONE)));
    }

    #[test]
    fn test_zero_size_drawing_is_noop() {
        let mut s = Surface::with_size(SurfaceSize::new(0.0, 0.0, 1.0));
        assert!(s.is_empty());
        s.clear(Vec3::ONE);
        s.fill_circle(Vec2::ZERO, 5.0, Vec3::ONE, 1.0, BlendMode::Alpha, true);
        s.draw_line(Vec2::ZERO, Vec2::splat(100.0), Vec3::ONE, 1.0, BlendMode::Alpha);
        assert!(s.pixels().is_empty());
        assert!(matches!(s.save_png("unused.png"), Err(SnapshotError::EmptySurface)));
    }

    #[test]
    fn test_bad_sizes_are_sanitized() {
        let size = SurfaceSize::new(-5.0, f32::NAN, 0.0);
        assert_eq!(size, SurfaceSize::ZERO);
        assert!(size.is_zero());
    }

    #[test]
    fn test_circle_covers_center_not_corner() {
        let mut s = surface(20.0, 20.0);
        s.fill_circle(Vec2::splat(10.0), 3.0, Vec3::ONE, 1.0, BlendMode::Alpha, false);
        assert_eq!(s.pixel(10, 10), Some(Pixel::opaque(Vec3::ONE)));
        assert_eq!(s.pixel(0, 0), Some(Pixel::opaque(Vec3::ZERO)));
    }

    #[test]
    fn test_offscreen_shapes_are_clipped() {
        let mut s = surface(10.0, 10.0);
        s.fill_circle(Vec2::splat(-50.0), 3.0, Vec3::ONE, 1.0, BlendMode::Alpha, true);
        s.fill_rect(Vec2::splat(1e9), 3.0, Vec3::ONE, 1.0, BlendMode::Alpha);
        let (a, b) = (Vec2::new(-100.0, -100.0), Vec2::new(-1.0, -50.0));
        s.draw_line(a, b, Vec3::ONE, 1.0, BlendMode::Alpha);
        assert!(s.pixels().iter().all(|p| *p == Pixel::opaque(Vec3::ZERO)));
    }

    #[test]
    fn test_line_is_clipped_through_surface() {
        let mut s = surface(10.0, 10.0);
        let (a, b) = (Vec2::new(-100.0, 5.5), Vec2::new(100.0, 5.5));
        s.draw_line(a, b, Vec3::ONE, 1.0, BlendMode::Alpha);
        for x in 0..10 {
            assert_eq!(s.pixel(x, 5), Some(Pixel::opaque(Vec3::ONE)), "x = {}", x);
        }
        assert_eq!(s.pixel(5, 4), Some(Pixel::opaque(Vec3::ZERO)));
    }

    #[test]
    fn test_additive_brightens() {
        let mut s = surface(4.0, 4.0);
        s.fill_rect(Vec2::splat(2.0), 2.0, Vec3::new(0.4, 0.0, 0.0), 1.0, BlendMode::Additive);
        s.fill_rect(Vec2::splat(2.0), 2.0, Vec3::new(0.4, 0.0, 0.0), 1.0, BlendMode::Additive);
        let r = s.pixel(1, 1).map(|p| p.r).unwrap_or(0);
        assert!((203..=205).contains(&r), "r = {}", r);
    }

    #[test]
    fn test_fade_moves_toward_background() {
        let mut s = surface(2.0, 2.0);
        s.clear(Vec3::ONE);
        s.fade(Vec3::ZERO, 0.5);
        let r = s.pixel(0, 0).map(|p| p.r).unwrap_or(0);
        assert!((127..=128).contains(&r));
    }

    #[test]
    fn test_release_drops_pixels() {
        let mut s = surface(8.0, 8.0);
        s.release();
        assert!(s.is_empty());
        assert_eq!(s.physical_size(), (0, 0));
        assert!(s.size().is_zero());
    }
}
