//! Dynamic Time Warping distance.
//!
//! This module implements the canonical DTW recurrence over absolute
//! pointwise differences:
//!
//! ```text
//! cost(0, 0) = 0
//! cost(i, 0) = cost(0, j) = +inf                         (i, j > 0)
//! cost(i, j) = |a[i-1] - b[j-1]| + min(cost(i-1, j), cost(i, j-1), cost(i-1, j-1))
//! dtw(a, b)  = cost(n, m)
//! ```
//!
//! # Band
//!
//! With a band width `w`, only cells with `|i - j| <= max(w, |n - m|)` are
//! evaluated; every other cell is +inf. Widening the window to the length
//! difference keeps the corner cell `(n, m)` reachable for unequal lengths.
//!
//! # Early abandonment
//!
//! Step costs are non-negative, so every warping path through row `i` costs
//! at least that row's minimum. When the minimum of a completed row exceeds
//! the early-abandon threshold, the row minimum is returned immediately: it is
//! a lower bound on the true distance and is itself above the threshold.
//!
//! # Normalization
//!
//! The raw distance is never normalized. [`DtwNormalization`] names the
//! derived per-step quantities separately.
//!
//! # Example
//!
//! ```
//! use asset_graph::distance::{dtw_distance, DtwOptions};
//!
//! let a = [1.0_f64, 2.0, 3.0, 4.0];
//! let c = [4.0_f64, 3.0, 2.0, 1.0];
//!
//! assert_eq!(dtw_distance(&a, &a, &DtwOptions::new()).unwrap(), 0.0);
//! assert!(dtw_distance(&a, &c, &DtwOptions::new()).unwrap() > 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::MatrixKind;
use crate::series::Series;
use crate::traits::{validate_finite, validate_not_empty, PairMetric, SeriesElement};

/// Options for a DTW computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DtwOptions {
    band_width: Option<usize>,
    early_abandon: Option<f64>,
}

impl DtwOptions {
    /// Creates unbounded options: no band, no early abandonment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            band_width: None,
            early_abandon: None,
        }
    }

    /// Limits the alignment to a Sakoe-Chiba band of the given half-width.
    #[must_use]
    pub const fn with_band_width(mut self, width: usize) -> Self {
        self.band_width = Some(width);
        self
    }

    /// Allows the computation to stop once the distance provably exceeds `threshold`.
    #[must_use]
    pub const fn with_early_abandon(mut self, threshold: f64) -> Self {
        self.early_abandon = Some(threshold);
        self
    }

    /// Returns the configured band half-width.
    #[must_use]
    pub const fn band_width(&self) -> Option<usize> {
        self.band_width
    }

    /// Returns the configured early-abandon threshold.
    #[must_use]
    pub const fn early_abandon(&self) -> Option<f64> {
        self.early_abandon
    }

    /// Checks that the options are within range.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for a zero band width or a negative
    /// or NaN threshold.
    pub fn validate(&self) -> Result<()> {
        if self.band_width == Some(0) {
            return Err(Error::invalid_parameter(
                "band_width",
                0,
                "band width must be at least 1",
            ));
        }
        if let Some(t) = self.early_abandon {
            if t.is_nan() || t < 0.0 {
                return Err(Error::invalid_parameter(
                    "early_abandon",
                    t,
                    "threshold must be a non-negative number",
                ));
            }
        }
        Ok(())
    }

    /// Effective window for sequences of length `n` and `m`.
    fn window(&self, n: usize, m: usize) -> usize {
        match self.band_width {
            Some(w) => w.max(n.abs_diff(m)),
            None => n.max(m),
        }
    }
}

/// Derived per-step DTW quantities.
///
/// `None` is the raw cumulative cost. `MinLength` divides it by the length
/// of the shorter sequence. `PathLength` divides the optimal path cost by
/// the number of aligned index pairs on that path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtwNormalization {
    /// Raw cumulative cost.
    #[default]
    None,
    /// Raw cost divided by `min(n, m)`.
    MinLength,
    /// Optimal path cost divided by the warping path length.
    PathLength,
}

/// An optimal warping path and its cost.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpingPath<T> {
    /// Cumulative cost along the path (equals the raw DTW distance).
    pub cost: T,
    /// Aligned `(index_in_a, index_in_b)` pairs from the start to the end.
    pub steps: Vec<(usize, usize)>,
}

impl<T: SeriesElement> WarpingPath<T> {
    /// Number of aligned pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cost divided by the number of aligned pairs.
    ///
    /// # Errors
    ///
    /// Returns `Error::NumericConversion` if the path length cannot be represented.
    pub fn normalized_cost(&self) -> Result<T> {
        if self.steps.is_empty() {
            return Ok(self.cost);
        }
        Ok(self.cost / T::from_usize(self.steps.len())?)
    }
}

fn validate_pair<T: SeriesElement>(a: &[T], b: &[T], options: &DtwOptions) -> Result<()> {
    options.validate()?;
    validate_not_empty(a, "left")?;
    validate_not_empty(b, "right")?;
    validate_finite(a, "left")?;
    validate_finite(b, "right")?;
    Ok(())
}

/// Inclusive column range of row `i` inside the window.
#[inline]
fn band_columns(i: usize, m: usize, window: usize) -> (usize, usize) {
    let lo = if i > window { i - window } else { 1 };
    let hi = m.min(i.saturating_add(window));
    (lo, hi)
}

/// Computes the raw DTW distance between two sequences.
///
/// Memory use is two rows of the cost table.
///
/// # Errors
///
/// Returns:
/// - `Error::InvalidInput` if either sequence is empty or contains NaN or infinity
/// - `Error::InvalidParameter` if the options are out of range
pub fn dtw_distance<T: SeriesElement>(a: &[T], b: &[T], options: &DtwOptions) -> Result<T> {
    validate_pair(a, b, options)?;

    let n = a.len();
    let m = b.len();
    let window = options.window(n, m);
    let threshold = options.early_abandon.map(T::from_f64).transpose()?;

    let inf = T::infinity();
    let mut prev = vec![inf; m + 1];
    let mut curr = vec![inf; m + 1];
    prev[0] = T::zero();

    for i in 1..=n {
        curr.fill(inf);
        let (lo, hi) = band_columns(i, m, window);
        let ai = a[i - 1];
        let mut row_min = inf;

        for j in lo..=hi {
            let best = prev[j].min(curr[j - 1]).min(prev[j - 1]);
            let cell = (ai - b[j - 1]).abs() + best;
            curr[j] = cell;
            row_min = row_min.min(cell);
        }

        if let Some(limit) = threshold {
            if row_min > limit {
                tracing::trace!(row = i, rows = n, "dtw abandoned early");
                return Ok(row_min);
            }
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    Ok(prev[m])
}

/// Computes the DTW distance together with an optimal warping path.
///
/// The early-abandon threshold is ignored because the full table is needed
/// to recover the path. Ties between predecessors prefer the diagonal, then
/// the step that advances in `a`, then the step that advances in `b`.
///
/// # Errors
///
/// Same conditions as [`dtw_distance`].
pub fn dtw_path<T: SeriesElement>(a: &[T], b: &[T], options: &DtwOptions) -> Result<WarpingPath<T>> {
    validate_pair(a, b, options)?;

    let n = a.len();
    let m = b.len();
    let window = options.window(n, m);
    let width = m + 1;
    let inf = T::infinity();

    let mut table = vec![inf; (n + 1) * width];
    table[0] = T::zero();

    for i in 1..=n {
        let (lo, hi) = band_columns(i, m, window);
        for j in lo..=hi {
            let best = table[(i - 1) * width + j]
                .min(table[i * width + j - 1])
                .min(table[(i - 1) * width + j - 1]);
            table[i * width + j] = (a[i - 1] - b[j - 1]).abs() + best;
        }
    }

    let cost = table[n * width + m];
    if !cost.is_finite() {
        return Ok(WarpingPath {
            cost,
            steps: Vec::new(),
        });
    }

    let mut steps = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n, m);
    loop {
        steps.push((i - 1, j - 1));
        if i == 1 && j == 1 {
            break;
        }
        let diag = table[(i - 1) * width + j - 1];
        let up = table[(i - 1) * width + j];
        let left = table[i * width + j - 1];
        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    steps.reverse();

    Ok(WarpingPath { cost, steps })
}

/// Computes a DTW distance under the requested normalization.
///
/// The early-abandon threshold, when set, applies to the raw cost before
/// any division.
///
/// # Errors
///
/// Same conditions as [`dtw_distance`].
pub fn dtw_distance_normalized<T: SeriesElement>(
    a: &[T],
    b: &[T],
    options: &DtwOptions,
    normalization: DtwNormalization,
) -> Result<T> {
    match normalization {
        DtwNormalization::None => dtw_distance(a, b, options),
        DtwNormalization::MinLength => {
            let raw = dtw_distance(a, b, options)?;
            Ok(raw / T::from_usize(a.len().min(b.len()))?)
        }
        DtwNormalization::PathLength => dtw_path(a, b, options)?.normalized_cost(),
    }
}

/// [`PairMetric`] adapter that scores pairs by DTW distance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DtwMetric {
    /// Band and early-abandon options.
    pub options: DtwOptions,
    /// Which distance quantity to report.
    pub normalization: DtwNormalization,
}

impl DtwMetric {
    /// Creates a raw-distance metric with the given options.
    #[must_use]
    pub const fn new(options: DtwOptions) -> Self {
        Self {
            options,
            normalization: DtwNormalization::None,
        }
    }

    /// Sets the normalization.
    #[must_use]
    pub const fn normalization(mut self, normalization: DtwNormalization) -> Self {
        self.normalization = normalization;
        self
    }
}

impl PairMetric for DtwMetric {
    fn kind(&self) -> MatrixKind {
        MatrixKind::Distance
    }

    fn name(&self) -> &'static str {
        match self.normalization {
            DtwNormalization::None => "dtw",
            DtwNormalization::MinLength => "dtw_min_length",
            DtwNormalization::PathLength => "dtw_path_length",
        }
    }

    fn compute(&self, left: &Series, right: &Series) -> Result<f64> {
        dtw_distance_normalized(left.values(), right.values(), &self.options, self.normalization)
    }
}
