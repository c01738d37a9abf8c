//! Particle storage.
//!
//! A [`Particles`] store is created once with a fixed count and never grows or
//! shrinks. The engine repositions particles by rewriting their targets; it
//! never adds or removes them. Storage order is stable, so particle `i` is
//! always fed index `i` by the shape generators.

use glam::Vec3;

/// A single particle record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Current world-space position, moved toward `target` every frame.
    pub position: Vec3,
    /// Position the active shape wants this particle at.
    pub target: Vec3,
    /// Velocity, only used by the spring integrator.
    pub velocity: Vec3,
    /// Current RGB color (0.0-1.0).
    pub color: Vec3,
    /// Color the particle is easing toward.
    pub target_color: Vec3,
    /// Base radius multiplier, scaled by perspective at render time.
    pub size: f32,
}

impl Particle {
    /// A particle resting at `position` with matching target.
    pub fn at(position: Vec3, color: Vec3, size: f32) -> Self {
        Self {
            position,
            target: position,
            velocity: Vec3::ZERO,
            color,
            target_color: color,
            size,
        }
    }
}

/// Fixed-size particle store owned by one engine.
#[derive(Debug, Clone)]
pub struct Particles {
    items: Vec<Particle>,
}

impl Particles {
    /// Create `count` particles, each built by `init(index)`.
    pub fn new(count: usize, init: impl FnMut(usize) -> Particle) -> Self {
        Self {
            items: (0..count).map(init).collect(),
        }
    }

    /// Number of particles. Constant for the lifetime of the store.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.items.get(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Particle] {
        &self.items
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.items.iter()
    }

    /// Mutable access to the records. The slice length cannot change.
    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.items
    }
}

impl<'a> IntoIterator for &'a Particles {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_has_fixed_count() {
        let store = Particles::new(64, |i| Particle::at(Vec3::splat(i as f32), Vec3::ONE, 1.0));
        assert_eq!(store.len(), 64);
        assert_eq!(store.get(10).map(|p| p.position.x), Some(10.0));
        assert!(store.get(64).is_none());
    }

    #[test]
    fn test_particle_at_rests_on_target() {
        let p = Particle::at(Vec3::new(1.0, 2.0, 3.0), Vec3::X, 2.0);
        assert_eq!(p.position, p.target);
        assert_eq!(p.color, p.target_color);
        assert_eq!(p.velocity, Vec3::ZERO);
    }
}
