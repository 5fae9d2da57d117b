//! Utility functions for asset-graph.
//!
//! Tolerance-based float comparison, decimal rounding for deterministic
//! export, and index arithmetic for condensed (upper-triangle) pair storage.
//!
//! # Example
//!
//! ```
//! use asset_graph::utils::{approx_eq, round_to_digits, EPSILON};
//!
//! assert!(approx_eq(0.1 + 0.2, 0.3, EPSILON));
//! assert_eq!(round_to_digits(0.956, 2), 0.96);
//! ```

use crate::traits::SeriesElement;

/// Standard epsilon for high-precision floating-point comparisons.
pub const EPSILON: f64 = 1e-10;

/// Looser epsilon for results built from many accumulated operations.
pub const LOOSE_EPSILON: f64 = 1e-6;

/// Approximate equality check for floating-point values.
///
/// Returns `true` if `a` and `b` are within `tolerance` of each other, or if
/// both are NaN. Two infinities of the same sign compare equal.
///
/// ```
/// use asset_graph::utils::{approx_eq, EPSILON};
///
/// assert!(approx_eq(1.0, 1.0 + 1e-11, EPSILON));
/// assert!(approx_eq(f64::NAN, f64::NAN, EPSILON));
/// assert!(!approx_eq(f64::NAN, 1.0, EPSILON));
/// ```
#[inline]
#[must_use]
pub fn approx_eq<T: SeriesElement>(a: T, b: T, tolerance: T) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() < tolerance
}

/// Rounds to a fixed number of decimal digits.
///
/// Non-finite values are returned unchanged.
#[inline]
#[must_use]
pub fn round_to_digits(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10_f64.powi(i32::try_from(digits).unwrap_or(i32::MAX));
    if !scale.is_finite() {
        return value;
    }
    (value * scale).round() / scale
}

/// Number of unordered pairs of distinct items among `n`.
#[inline]
#[must_use]
pub const fn pair_count(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// Position of pair `(i, j)`, `i < j < n`, in row-major upper-triangle order.
///
/// Pairs are laid out as `(0,1), (0,2), ..., (0,n-1), (1,2), ...`.
#[inline]
#[must_use]
pub const fn condensed_index(i: usize, j: usize, n: usize) -> usize {
    // Row i starts after rows 0..i, which hold (n-1) + (n-2) + ... + (n-i) pairs.
    i * (2 * n - i - 1) / 2 + (j - i - 1)
}

/// Inverse of [`condensed_index`]: all `(i, j)` pairs in storage order.
#[must_use]
pub fn upper_triangle_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(pair_count(n));
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0_f64, 1.0 + 1e-12, EPSILON));
        assert!(!approx_eq(1.0_f64, 1.1, EPSILON));
        assert!(approx_eq(f64::INFINITY, f64::INFINITY, EPSILON));
        assert!(!approx_eq(f64::INFINITY, f64::NEG_INFINITY, EPSILON));
        assert!(!approx_eq(f64::INFINITY, 1e300, EPSILON));
    }

    #[test]
    fn test_round_to_digits() {
        assert_eq!(round_to_digits(0.954_9, 2), 0.95);
        assert_eq!(round_to_digits(12.345_6, 0), 12.0);
        assert_eq!(round_to_digits(-1.005_1, 3), -1.005);
        assert!(round_to_digits(f64::NAN, 2).is_nan());
        assert_eq!(round_to_digits(f64::INFINITY, 2), f64::INFINITY);
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(pair_count(2), 1);
        assert_eq!(pair_count(5), 10);
    }

    #[test]
    fn test_condensed_index_matches_enumeration() {
        for n in 0..8 {
            for (k, (i, j)) in upper_triangle_pairs(n).into_iter().enumerate() {
                assert_eq!(condensed_index(i, j, n), k, "pair ({i}, {j}) of {n}");
            }
            assert_eq!(upper_triangle_pairs(n).len(), pair_count(n));
        }
    }
}
