//! Frame rasterization: clear, edges, then particles.

use glam::Vec2;

use crate::camera::Projected;
use crate::particle::Particle;
use crate::surface::Surface;
use crate::visuals::{ClearMode, Connections, ParticleShape, VisualConfig};

/// What one rendered frame contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Particles drawn.
    pub drawn: usize,
    /// Particles rejected by the projection.
    pub culled: usize,
    /// Connection edges drawn.
    pub edges: usize,
}

/// Draws projected particles into a [`Surface`].
#[derive(Debug, Clone)]
pub struct Renderer {
    visuals: VisualConfig,
    edge_counts: Vec<u32>,
}

impl Renderer {
    pub fn new(visuals: VisualConfig) -> Self {
        Self {
            visuals,
            edge_counts: Vec::new(),
        }
    }

    pub fn visuals(&self) -> &VisualConfig {
        &self.visuals
    }

    /// Clear according to the configured [`ClearMode`].
    pub fn clear(&self, surface: &mut Surface) {
        match self.visuals.clear {
            ClearMode::Opaque => surface.clear(self.visuals.background_color),
            ClearMode::Trails { fade } => surface.fade(self.visuals.background_color, fade),
        }
    }

    /// Render one frame.
    ///
    /// * `projected` - one entry per particle, `None` if culled
    /// * `order` - visible particle indices in draw order
    /// * `square` - the active shape prefers square glyphs
    pub fn draw(
        &mut self,
        surface: &mut Surface,
        particles: &[Particle],
        projected: &[Option<Projected>],
        order: &[usize],
        square: bool,
    ) -> FrameStats {
        self.clear(surface);

        let mut stats = FrameStats {
            culled: particles.len().saturating_sub(order.len()),
            ..FrameStats::default()
        };

        if let Some(connections) = self.visuals.connections {
            stats.edges = self.draw_edges(surface, projected, order, &connections);
        }

        let v = &self.visuals;
        let floor = v.min_opacity.min(v.opacity);
        for &i in order {
            let (Some(p), Some(particle)) = (projected[i], particles.get(i)) else {
                continue;
            };
            let radius = v.particle_size * particle.size * p.scale;
            let alpha = (v.opacity * p.scale).clamp(floor, v.opacity);
            let at = Vec2::new(p.x, p.y);

            let glyph = match v.shape {
                ParticleShape::Auto if square => ParticleShape::Square,
                ParticleShape::Auto => ParticleShape::Circle,
                other => other,
            };
            match glyph {
                ParticleShape::Square => {
                    surface.fill_rect(at, radius, particle.color, alpha, v.blend_mode)
                }
                ParticleShape::CircleHard => {
                    surface.fill_circle(at, radius, particle.color, alpha, v.blend_mode, false)
                }
                _ => surface.fill_circle(at, radius, particle.color, alpha, v.blend_mode, true),
            }
            stats.drawn += 1;
        }

        stats
    }

    fn draw_edges(
        &mut self,
        surface: &mut Surface,
        projected: &[Option<Projected>],
        order: &[usize],
        connections: &Connections,
    ) -> usize {
        self.edge_counts.clear();
        self.edge_counts.resize(order.len(), 0);
        let cap = connections.max_per_particle;
        let mode = self.visuals.blend_mode;
        let mut drawn = 0;

        for a in 0..order.len() {
            let Some(pa) = projected[order[a]] else { continue };
            for b in (a + 1)..order.len() {
                if self.edge_counts[a] >= cap {
                    break;
                }
                if self.edge_counts[b] >= cap {
                    continue;
                }
                let Some(pb) = projected[order[b]] else { continue };

                let scale = (pa.scale + pb.scale) * 0.5;
                let threshold = connections.radius * scale;
                let (from, to) = (Vec2::new(pa.x, pa.y), Vec2::new(pb.x, pb.y));
                let dist = from.distance(to);
                if dist >= threshold {
                    continue;
                }

                let alpha = connections.opacity * (1.0 - dist / threshold) * scale.min(1.0);
                surface.draw_line(from, to, connections.color, alpha, mode);
                self.edge_counts[a] += 1;
                self.edge_counts[b] += 1;
                drawn += 1;
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Pixel, SurfaceSize};
    use glam::Vec3;

    fn at(x: f32, y: f32, scale: f32) -> Option<Projected> {
        Some(Projected { x, y, scale, depth: 0.0 })
    }

    fn white(n: usize) -> Vec<Particle> {
        vec![Particle::at(Vec3::ZERO, Vec3::ONE, 1.0); n]
    }

    fn surface() -> Surface {
        Surface::with_size(SurfaceSize::new(100.0, 100.0, 1.0))
    }

    #[test]
    fn test_opaque_clear_paints_background() {
        let mut visuals = VisualConfig::new();
        visuals.background(Vec3::new(0.0, 0.0, 1.0));
        let mut s = surface();
        Renderer::new(visuals).draw(&mut s, &[], &[], &[], false);
        assert!(s.pixels().iter().all(|p| *p == Pixel::opaque(Vec3::Z)));
    }

    #[test]
    fn test_stats_count_drawn_and_culled() {
        let mut s = surface();
        let projected = vec![at(10.0, 10.0, 1.0), None, at(50.0, 50.0, 0.5)];
        let stats =
            Renderer::new(VisualConfig::new()).draw(&mut s, &white(3), &projected, &[0, 2], false);
        assert_eq!(stats, FrameStats { drawn: 2, culled: 1, edges: 0 });
        assert_ne!(s.pixel(10, 10), s.pixel(90, 90));
    }

    #[test]
    fn test_edges_respect_threshold_and_cap() {
        let mut visuals = VisualConfig::new();
        visuals.connections(30.0);
        if let Some(c) = visuals.connections.as_mut() {
            c.max_per_particle = 1;
        }
        let mut s = surface();
        // Three particles in a tight cluster plus one far away.
        let projected = vec![
            at(10.0, 10.0, 1.0),
            at(20.0, 10.0, 1.0),
            at(10.0, 20.0, 1.0),
            at(90.0, 90.0, 1.0),
        ];
        let order = [0, 1, 2, 3];
        let stats = Renderer::new(visuals).draw(&mut s, &white(4), &projected, &order, false);
        // 0-1 uses up both budgets; 2 has no partner left under the cap.
        assert_eq!(stats.edges, 1);
    }

    #[test]
    fn test_far_pairs_use_shrunken_threshold() {
        let mut visuals = VisualConfig::new();
        visuals.connections(30.0);
        let mut s = surface();
        let near = vec![at(10.0, 10.0, 1.0), at(30.0, 10.0, 1.0)];
        let far = vec![at(10.0, 10.0, 0.5), at(30.0, 10.0, 0.5)];
        let mut renderer = Renderer::new(visuals);
        assert_eq!(renderer.draw(&mut s, &white(2), &near, &[0, 1], false).edges, 1);
        assert_eq!(renderer.draw(&mut s, &white(2), &far, &[0, 1], false).edges, 0);
    }

    #[test]
    fn test_auto_glyph_uses_square_for_grids() {
        let mut visuals = VisualConfig::new();
        visuals.particle_size(4.0).opacity(1.0);
        let projected = vec![at(50.0, 50.0, 1.0)];

        let mut round = surface();
        Renderer::new(visuals.clone()).draw(&mut round, &white(1), &projected, &[0], false);
        let mut square = surface();
        Renderer::new(visuals).draw(&mut square, &white(1), &projected, &[0], true);

        // The square reaches its corner; the circle does not.
        assert_eq!(square.pixel(47, 47), Some(Pixel::opaque(Vec3::ONE)));
        assert_ne!(round.pixel(46, 46), Some(Pixel::opaque(Vec3::ONE)));
    }
}
