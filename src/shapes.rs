//! Shape generators.
//!
//! Every shape is a pure function of `(index, total, params)` and, for dynamic
//! shapes only, the elapsed time. Randomized shapes seed their RNG from the
//! particle index, so a target never jitters from one call to the next.
//!
//! Generators work in unit space (a sphere has radius 1.0). The phase scales
//! the result into world units, see [`ShapeScale`].
//!
//! ```ignore
//! let shape = ShapeKind::Cube { spacing: 0.2 };
//! let target = shape.generate(&ShapeContext::new(999, 1000));
//! ```

use glam::{UVec3, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::error::ConfigError;

/// Golden angle in radians, `PI * (3 - sqrt(5))`.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Inputs to a shape generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeContext {
    /// Index of the particle (0 to total-1).
    pub index: usize,
    /// Total number of particles.
    pub total: usize,
    /// Elapsed engine time in seconds. Ignored by static shapes.
    pub time: f32,
}

impl ShapeContext {
    pub fn new(index: usize, total: usize) -> Self {
        Self {
            index,
            total,
            time: 0.0,
        }
    }

    pub fn at_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    /// Normalized progress through the population (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.total <= 1 {
            0.0
        } else {
            self.index as f32 / (self.total - 1) as f32
        }
    }

    fn rng(&self, salt: u64) -> SmallRng {
        let seed = (self.index as u64)
            .wrapping_add(1)
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ salt;
        SmallRng::seed_from_u64(seed)
    }
}

/// Result of a generator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeTarget {
    /// Target position in unit space.
    pub position: Vec3,
    /// Optional palette position (0.0-1.0) for the target color.
    pub tone: Option<f32>,
}

impl ShapeTarget {
    fn plain(position: Vec3) -> Self {
        Self {
            position,
            tone: None,
        }
    }

    fn toned(position: Vec3, tone: f32) -> Self {
        Self {
            position,
            tone: Some(tone.clamp(0.0, 1.0)),
        }
    }
}

/// How a phase turns unit-space targets into world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeScale {
    /// Fixed world-unit multiplier.
    Fixed(f32),
    /// Fraction of `min(width, height)` of the surface, in logical pixels.
    Viewport(f32),
}

impl ShapeScale {
    /// Resolve to a world-unit multiplier for a surface of the given size.
    pub fn resolve(&self, width: f32, height: f32) -> f32 {
        match *self {
            ShapeScale::Fixed(s) => s,
            ShapeScale::Viewport(fraction) => fraction * width.min(height).max(0.0),
        }
    }

    /// Whether the resolved scale changes with the surface size.
    pub fn depends_on_viewport(&self) -> bool {
        matches!(self, ShapeScale::Viewport(_))
    }
}

impl Default for ShapeScale {
    fn default() -> Self {
        ShapeScale::Fixed(200.0)
    }
}

/// Named geometric configurations particles morph between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    /// Fibonacci sphere (near-uniform surface coverage).
    Sphere,

    /// Cube lattice of `ceil(cbrt(total))` points per side.
    Cube {
        /// Distance between neighbouring lattice points.
        spacing: f32,
    },

    /// Torus-knot scatter around a main radius.
    Torus {
        /// Distance from center to tube center.
        major: f32,
        /// Tube radius.
        tube: f32,
    },

    /// Seeded random ball for loose, organic clusters.
    Cloud {
        /// Ball radius.
        spread: f32,
    },

    /// Single angle swept around a ring several times.
    Ring {
        /// Full turns across the population.
        turns: f32,
        /// Radial and vertical noise band.
        thickness: f32,
    },

    /// Stacked layers, each tracing a rectangular perimeter.
    Tower {
        layers: u32,
        width: f32,
        depth: f32,
        height: f32,
    },

    /// Sphere with angles snapped to a coarse grid, giving flat facets.
    Prism {
        /// Facets around the equator (minimum 3).
        facets: u32,
    },

    /// Horizontal lanes streaming along X. Dynamic.
    FlowLanes {
        lanes: u32,
        length: f32,
        spacing: f32,
        /// Lane lengths travelled per second.
        speed: f32,
    },

    /// Double helix along Y.
    Helix { turns: f32, height: f32 },
}

impl ShapeKind {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Cube { .. } => "Cube",
            ShapeKind::Torus { .. } => "Torus",
            ShapeKind::Cloud { .. } => "Cloud",
            ShapeKind::Ring { .. } => "Ring",
            ShapeKind::Tower { .. } => "Tower",
            ShapeKind::Prism { .. } => "Prism",
            ShapeKind::FlowLanes { .. } => "FlowLanes",
            ShapeKind::Helix { .. } => "Helix",
        }
    }

    /// Whether targets move with time and must be refreshed every frame.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ShapeKind::FlowLanes { speed, .. } if *speed != 0.0)
    }

    /// Length along X after which moving targets wrap back, in shape units.
    pub fn wrap_length(&self) -> Option<f32> {
        match *self {
            ShapeKind::FlowLanes { length, speed, .. } if speed != 0.0 => Some(length),
            _ => None,
        }
    }

    /// Whether the shape reads as a grid and looks best drawn with squares.
    pub fn prefers_square(&self) -> bool {
        matches!(self, ShapeKind::Cube { .. } | ShapeKind::Tower { .. })
    }

    /// Reject parameters that would produce non-finite targets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let params: Vec<f32> = match self {
            ShapeKind::Sphere | ShapeKind::Prism { .. } => vec![],
            ShapeKind::Cube { spacing } => vec![*spacing],
            ShapeKind::Torus { major, tube } => vec![*major, *tube],
            ShapeKind::Cloud { spread } => vec![*spread],
            ShapeKind::Ring { turns, thickness } => vec![*turns, *thickness],
            ShapeKind::Tower {
                width,
                depth,
                height,
                ..
            } => vec![*width, *depth, *height],
            ShapeKind::FlowLanes {
                length,
                spacing,
                speed,
                ..
            } => vec![*length, *spacing, *speed],
            ShapeKind::Helix { turns, height } => vec![*turns, *height],
        };
        if params.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "{} has non-finite parameters",
                self.name()
            )))
        }
    }

    /// Compute the unit-space target for one particle.
    pub fn generate(&self, ctx: &ShapeContext) -> ShapeTarget {
        match *self {
            ShapeKind::Sphere => ShapeTarget::plain(fibonacci_sphere(ctx.index, ctx.total)),
            ShapeKind::Cube { spacing } => {
                let dim = lattice_dim(ctx.total);
                let coord = lattice_coord(ctx.index, ctx.total).as_vec3();
                let center = (dim.saturating_sub(1)) as f32 * 0.5;
                ShapeTarget::plain((coord - Vec3::splat(center)) * spacing)
            }
            ShapeKind::Torus { major, tube } => {
                let mut rng = ctx.rng(0x7031);
                let u = rng.gen_range(0.0..TAU);
                let v = rng.gen_range(0.0..TAU);
                let ring = major + tube * v.cos();
                ShapeTarget::plain(Vec3::new(ring * u.cos(), tube * v.sin(), ring * u.sin()))
            }
            ShapeKind::Cloud { spread } => {
                let mut rng = ctx.rng(0xC10D);
                let theta = rng.gen_range(0.0..TAU);
                let cos_phi = rng.gen_range(-1.0f32..1.0);
                let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
                // Cube root for uniform volume distribution
                let r = spread * rng.gen::<f32>().cbrt();
                ShapeTarget::plain(Vec3::new(
                    r * sin_phi * theta.cos(),
                    r * cos_phi,
                    r * sin_phi * theta.sin(),
                ))
            }
            ShapeKind::Ring { turns, thickness } => {
                let mut rng = ctx.rng(0x2196);
                let angle = ctx.index as f32 / ctx.total.max(1) as f32 * TAU * turns;
                let radius = 1.0 + (rng.gen::<f32>() - 0.5) * thickness;
                let lift = (rng.gen::<f32>() - 0.5) * thickness * 0.5;
                ShapeTarget::plain(Vec3::new(radius * angle.cos(), lift, radius * angle.sin()))
            }
            ShapeKind::Tower {
                layers,
                width,
                depth,
                height,
            } => {
                let bucket = Bucket::of(ctx.index, ctx.total, layers as usize);
                let y = if bucket.buckets > 1 {
                    bucket.fraction() * height - height * 0.5
                } else {
                    0.0
                };
                let (x, z) = rectangle_perimeter(bucket.local_progress(), width, depth);
                ShapeTarget::toned(Vec3::new(x, y, z), bucket.fraction())
            }
            ShapeKind::Prism { facets } => ShapeTarget::plain(faceted_sphere(ctx, facets)),
            ShapeKind::FlowLanes {
                lanes,
                length,
                spacing,
                speed,
            } => {
                let bucket = Bucket::of(ctx.index, ctx.total, lanes as usize);
                let u = (bucket.local_progress() + ctx.time * speed).rem_euclid(1.0);
                let center = (bucket.buckets - 1) as f32 * 0.5;
                let y = (bucket.bucket as f32 - center) * spacing;
                let z = (u * TAU * 2.0 + bucket.bucket as f32).sin() * spacing * 0.25;
                ShapeTarget::toned(Vec3::new((u - 0.5) * length, y, z), bucket.fraction())
            }
            ShapeKind::Helix { turns, height } => {
                let strand = ctx.index % 2;
                let per_strand = ctx.total.div_ceil(2).max(1);
                let step = ctx.index / 2;
                let t = if per_strand > 1 {
                    step as f32 / (per_strand - 1) as f32
                } else {
                    0.0
                };
                let angle = t * TAU * turns + strand as f32 * PI;
                ShapeTarget::toned(
                    Vec3::new(angle.cos(), (t - 0.5) * height, angle.sin()),
                    strand as f32,
                )
            }
        }
    }
}

/// Point `index` of a Fibonacci (golden-angle) sphere of radius 1.
pub fn fibonacci_sphere(index: usize, total: usize) -> Vec3 {
    let y = if total > 1 {
        1.0 - 2.0 * index as f32 / (total - 1) as f32
    } else {
        0.0
    };
    let radius = (1.0 - y * y).max(0.0).sqrt();
    let theta = GOLDEN_ANGLE * index as f32;
    Vec3::new(theta.cos() * radius, y, theta.sin() * radius)
}

/// Points per side of the cube lattice: `ceil(cbrt(total))`, computed exactly.
pub fn lattice_dim(total: usize) -> usize {
    if total <= 1 {
        return 1;
    }
    let mut dim = (total as f64).cbrt().round() as usize;
    while dim * dim * dim < total {
        dim += 1;
    }
    while dim > 1 && (dim - 1) * (dim - 1) * (dim - 1) >= total {
        dim -= 1;
    }
    dim
}

/// Grid coordinate of `index` in the cube lattice, before centering.
pub fn lattice_coord(index: usize, total: usize) -> UVec3 {
    let dim = lattice_dim(total);
    UVec3::new(
        (index % dim) as u32,
        ((index / dim) % dim) as u32,
        (index / (dim * dim)) as u32,
    )
}

/// Split of a population into equal buckets; leftovers join the last bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bucket {
    pub bucket: usize,
    pub buckets: usize,
    pub local: usize,
    pub count: usize,
}

impl Bucket {
    pub fn of(index: usize, total: usize, buckets: usize) -> Self {
        let buckets = buckets.max(1);
        let per = total / buckets;
        if per == 0 {
            // Fewer particles than buckets: one particle per bucket.
            return Self {
                bucket: index.min(buckets - 1),
                buckets,
                local: 0,
                count: 1,
            };
        }
        let bucket = (index / per).min(buckets - 1);
        let count = if bucket == buckets - 1 {
            total - bucket * per
        } else {
            per
        };
        Self {
            bucket,
            buckets,
            local: index - bucket * per,
            count,
        }
    }

    /// Bucket position in 0.0-1.0.
    pub fn fraction(&self) -> f32 {
        if self.buckets > 1 {
            self.bucket as f32 / (self.buckets - 1) as f32
        } else {
            0.0
        }
    }

    /// Position within the bucket in 0.0-1.0 (exclusive end).
    pub fn local_progress(&self) -> f32 {
        self.local as f32 / self.count.max(1) as f32
    }
}

/// Walk a `width` x `depth` rectangle perimeter centered on the origin.
fn rectangle_perimeter(t: f32, width: f32, depth: f32) -> (f32, f32) {
    let (hw, hd) = (width * 0.5, depth * 0.5);
    let perimeter = 2.0 * (width + depth);
    if perimeter <= 0.0 {
        return (0.0, 0.0);
    }
    let mut s = t.rem_euclid(1.0) * perimeter;
    if s < width {
        return (-hw + s, -hd);
    }
    s -= width;
    if s < depth {
        return (hw, -hd + s);
    }
    s -= depth;
    if s < width {
        return (hw - s, hd);
    }
    s -= width;
    (-hw, hd - s)
}

/// Fibonacci direction whose angles are snapped to a `facets` grid; the
/// residual is laid out on the plane tangent to the facet center.
fn faceted_sphere(ctx: &ShapeContext, facets: u32) -> Vec3 {
    let facets = facets.max(3);
    let rings = (facets / 2).max(2);
    let n = ctx.total.max(1) as f32;

    let phi = (1.0 - 2.0 * (ctx.index as f32 + 0.5) / n).clamp(-1.0, 1.0).acos();
    let theta = (GOLDEN_ANGLE * ctx.index as f32).rem_euclid(TAU);

    let theta_step = TAU / facets as f32;
    let phi_step = PI / rings as f32;
    let theta_q = ((theta / theta_step).floor() + 0.5) * theta_step;
    let phi_q = ((phi / phi_step).floor().min(rings as f32 - 1.0) + 0.5) * phi_step;

    let (sin_p, cos_p) = phi_q.sin_cos();
    let (sin_t, cos_t) = theta_q.sin_cos();
    let center = Vec3::new(sin_p * cos_t, cos_p, sin_p * sin_t);
    let along_theta = Vec3::new(-sin_t, 0.0, cos_t);
    let along_phi = Vec3::new(cos_p * cos_t, -sin_p, cos_p * sin_t);

    center + along_theta * ((theta - theta_q) * sin_p) + along_phi * (phi - phi_q)
}

/// Cheap integer hash to 0.0-1.0. Used for per-frame noise where an RNG per
/// particle would be wasteful.
#[inline]
pub(crate) fn hash01(seed: u32) -> f32 {
    let x = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
    let x = x ^ (x >> 16);
    let x = x.wrapping_mul(0x45d9_f3b);
    let x = x ^ (x >> 16);
    (x & 0x7FFF_FFFF) as f32 / 0x7FFF_FFFF as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_kinds() -> Vec<ShapeKind> {
        vec![
            ShapeKind::Sphere,
            ShapeKind::Cube { spacing: 0.2 },
            ShapeKind::Torus { major: 1.0, tube: 0.3 },
            ShapeKind::Cloud { spread: 1.0 },
            ShapeKind::Ring { turns: 3.0, thickness: 0.1 },
            ShapeKind::Tower { layers: 6, width: 1.0, depth: 0.6, height: 2.0 },
            ShapeKind::Prism { facets: 8 },
            ShapeKind::FlowLanes { lanes: 5, length: 3.0, spacing: 0.3, speed: 0.2 },
            ShapeKind::Helix { turns: 2.0, height: 2.0 },
        ]
    }

    #[test]
    fn test_every_shape_is_deterministic() {
        for kind in all_kinds() {
            for index in [0, 1, 17, 255, 511] {
                let ctx = ShapeContext::new(index, 512).at_time(1.25);
                let a = kind.generate(&ctx);
                let b = kind.generate(&ctx);
                assert_eq!(a, b, "{} is not pure at index {}", kind.name(), index);
                assert!(a.position.is_finite(), "{} produced non-finite", kind.name());
            }
        }
    }

    #[test]
    fn test_only_flow_lanes_are_dynamic() {
        for kind in all_kinds() {
            assert_eq!(kind.is_dynamic(), matches!(kind, ShapeKind::FlowLanes { .. }));
        }
        let still = ShapeKind::FlowLanes { lanes: 2, length: 1.0, spacing: 1.0, speed: 0.0 };
        assert!(!still.is_dynamic());
    }

    #[test]
    fn test_only_moving_lanes_wrap() {
        let lanes = ShapeKind::FlowLanes { lanes: 2, length: 3.0, spacing: 1.0, speed: 0.4 };
        assert_eq!(lanes.wrap_length(), Some(3.0));
        let still = ShapeKind::FlowLanes { lanes: 2, length: 3.0, spacing: 1.0, speed: 0.0 };
        assert_eq!(still.wrap_length(), None);
        assert_eq!(ShapeKind::Sphere.wrap_length(), None);
    }

    #[test]
    fn test_lattice_dim_is_exact_cube_root_ceiling() {
        assert_eq!(lattice_dim(1), 1);
        assert_eq!(lattice_dim(8), 2);
        assert_eq!(lattice_dim(9), 3);
        assert_eq!(lattice_dim(27), 3);
        assert_eq!(lattice_dim(1000), 10);
        assert_eq!(lattice_dim(1001), 11);
    }

    #[test]
    fn test_cube_1000_last_index_is_far_corner() {
        assert_eq!(lattice_coord(999, 1000), UVec3::new(9, 9, 9));
        assert_eq!(lattice_coord(0, 1000), UVec3::ZERO);
        assert_eq!(lattice_coord(10, 1000), UVec3::new(0, 1, 0));

        // Centered: the corner sits at +4.5 spacings on every axis.
        let target = ShapeKind::Cube { spacing: 2.0 }.generate(&ShapeContext::new(999, 1000));
        assert_eq!(target.position, Vec3::splat(9.0));
    }

    #[test]
    fn test_sphere_points_are_unit_and_poles_included() {
        let first = fibonacci_sphere(0, 512);
        let last = fibonacci_sphere(511, 512);
        assert!((first.y - 1.0).abs() < 1e-6);
        assert!((last.y + 1.0).abs() < 1e-6);
        for i in 0..512 {
            assert!((fibonacci_sphere(i, 512).length() - 1.0).abs() < 1e-4);
        }
        assert_eq!(fibonacci_sphere(0, 1), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_bucket_assigns_leftovers_to_last() {
        // 10 particles into 3 layers: 3, 3, 4.
        let counts: Vec<usize> = (0..3)
            .map(|b| (0..10).filter(|&i| Bucket::of(i, 10, 3).bucket == b).count())
            .collect();
        assert_eq!(counts, vec![3, 3, 4]);
        let last = Bucket::of(9, 10, 3);
        assert_eq!((last.bucket, last.local, last.count), (2, 3, 4));

        // Fewer particles than buckets.
        assert_eq!(Bucket::of(1, 2, 5).bucket, 1);
    }

    #[test]
    fn test_tower_layers_stack_and_stay_on_perimeter() {
        let tower = ShapeKind::Tower { layers: 4, width: 2.0, depth: 1.0, height: 3.0 };
        let total = 42;
        let mut ys: Vec<f32> = (0..total)
            .map(|i| tower.generate(&ShapeContext::new(i, total)).position.y)
            .collect();
        ys.dedup();
        assert_eq!(ys.len(), 4);
        assert!((ys[0] + 1.5).abs() < 1e-5);
        assert!((ys[3] - 1.5).abs() < 1e-5);

        for i in 0..total {
            let p = tower.generate(&ShapeContext::new(i, total)).position;
            let on_x_edge = (p.x.abs() - 1.0).abs() < 1e-4;
            let on_z_edge = (p.z.abs() - 0.5).abs() < 1e-4;
            assert!(on_x_edge || on_z_edge, "{:?} is inside the rectangle", p);
        }
    }

    #[test]
    fn test_prism_points_lie_near_unit_sphere() {
        let prism = ShapeKind::Prism { facets: 6 };
        for i in 0..300 {
            let p = prism.generate(&ShapeContext::new(i, 300)).position;
            // Flat facets bulge slightly inside/outside the sphere but stay close.
            assert!(p.length() > 0.8 && p.length() < 1.6, "{:?}", p);
        }
    }

    #[test]
    fn test_flow_lanes_move_with_time() {
        let lanes = ShapeKind::FlowLanes { lanes: 3, length: 2.0, spacing: 0.5, speed: 0.5 };
        let ctx = ShapeContext::new(4, 30);
        let a = lanes.generate(&ctx.at_time(0.0)).position;
        let b = lanes.generate(&ctx.at_time(0.1)).position;
        assert!((a.x - b.x).abs() > 1e-4);
        assert_eq!(a.y, b.y);
        assert!(a.x.abs() <= 1.0 && b.x.abs() <= 1.0);
    }

    #[test]
    fn test_helix_alternates_strands() {
        let helix = ShapeKind::Helix { turns: 1.0, height: 2.0 };
        let a = helix.generate(&ShapeContext::new(0, 10));
        let b = helix.generate(&ShapeContext::new(1, 10));
        assert_eq!(a.tone, Some(0.0));
        assert_eq!(b.tone, Some(1.0));
        // Opposite strands at the same height sit on opposite sides.
        assert!((a.position.x + b.position.x).abs() < 1e-5);
        assert_eq!(a.position.y, b.position.y);
    }

    #[test]
    fn test_viewport_scale_resolves_against_short_side() {
        assert_eq!(ShapeScale::Viewport(0.5).resolve(800.0, 600.0), 300.0);
        assert_eq!(ShapeScale::Fixed(120.0).resolve(0.0, 0.0), 120.0);
        assert_eq!(ShapeScale::Viewport(0.5).resolve(0.0, 600.0), 0.0);
    }

    #[test]
    fn test_hash01_range() {
        for seed in 0..1000 {
            let v = hash01(seed);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
