//! Back-to-front ordering (painter's algorithm).
//!
//! Sorts an index array rather than the particles themselves, so storage
//! order stays stable for the shape generators.

use std::cmp::Ordering;

/// Reorder `order` so that `depth(order[i]) >= depth(order[i + 1])`.
///
/// NaN depths compare equal and keep their relative order.
pub fn sort_back_to_front(order: &mut [usize], depth: impl Fn(usize) -> f32) {
    order.sort_by(|&a, &b| depth(b).partial_cmp(&depth(a)).unwrap_or(Ordering::Equal));
}

/// Whether `order` is back-to-front with respect to `depth`.
pub fn is_back_to_front(order: &[usize], depth: impl Fn(usize) -> f32) -> bool {
    order.windows(2).all(|w| depth(w[0]) >= depth(w[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorts_descending_depth() {
        let depths = [3.0, -10.0, 42.0, 0.0, 7.5, -1.0];
        let mut order: Vec<usize> = (0..depths.len()).collect();
        sort_back_to_front(&mut order, |i| depths[i]);
        assert_eq!(order, vec![2, 4, 0, 3, 5, 1]);
        assert!(is_back_to_front(&order, |i| depths[i]));
    }

    #[test]
    fn test_equal_depths_keep_storage_order() {
        let depths = [1.0, 1.0, 2.0, 1.0];
        let mut order: Vec<usize> = (0..depths.len()).collect();
        sort_back_to_front(&mut order, |i| depths[i]);
        assert_eq!(order, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_subset_is_sorted_without_touching_others() {
        let depths = [5.0, 1.0, 9.0, 3.0];
        let mut order = vec![1, 3];
        sort_back_to_front(&mut order, |i| depths[i]);
        assert_eq!(order, vec![3, 1]);
    }
}
