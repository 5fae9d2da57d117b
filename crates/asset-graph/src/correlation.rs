//! Pearson and Spearman correlation between index-aligned series.
//!
//! Both inputs must already be aligned (same length, same timestamps);
//! aligning by timestamp is the caller's job, see
//! [`SeriesStore::inner_join`](crate::series::SeriesStore::inner_join).
//!
//! NaN samples mark missing observations. A position is used only when both
//! series have a value there. The result is the NaN sentinel, not an error,
//! when fewer than two (or fewer than `min_periods`) positions remain or when
//! either side has zero variance.
//!
//! # Example
//!
//! ```
//! use asset_graph::correlation::{correlation, CorrelationMethod, CorrelationOptions};
//!
//! let a = [1.0_f64, 2.0, 3.0, 4.0];
//! let b = [10.0_f64, 20.0, 30.0, 45.0];
//!
//! let r = correlation(&a, &b, &CorrelationOptions::new(CorrelationMethod::Spearman)).unwrap();
//! assert!((r - 1.0).abs() < 1e-12);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::MatrixKind;
use crate::series::Series;
use crate::traits::{validate_not_empty, PairMetric, SeriesElement};

/// Correlation coefficient to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Sample (product-moment) correlation.
    #[default]
    Pearson,
    /// Pearson correlation of average ranks.
    Spearman,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pearson => f.write_str("pearson"),
            Self::Spearman => f.write_str("spearman"),
        }
    }
}

/// Options for a correlation computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationOptions {
    /// Which coefficient to compute.
    pub method: CorrelationMethod,
    /// Minimum number of overlapping non-missing samples.
    pub min_periods: Option<usize>,
}

impl CorrelationOptions {
    /// Creates options for the given method with no `min_periods` floor.
    #[must_use]
    pub const fn new(method: CorrelationMethod) -> Self {
        Self {
            method,
            min_periods: None,
        }
    }

    /// Requires at least `periods` overlapping samples for a defined result.
    #[must_use]
    pub const fn min_periods(mut self, periods: usize) -> Self {
        self.min_periods = Some(periods);
        self
    }
}

/// Checks alignment and keeps positions where both samples are present.
fn paired_samples<T: SeriesElement>(a: &[T], b: &[T]) -> Result<(Vec<T>, Vec<T>)> {
    validate_not_empty(a, "left")?;
    validate_not_empty(b, "right")?;
    if a.len() != b.len() {
        return Err(Error::MisalignedInput {
            left_len: a.len(),
            right_len: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .unzip())
}

fn is_constant<T: SeriesElement>(data: &[T]) -> bool {
    data.split_first()
        .is_some_and(|(first, rest)| rest.iter().all(|v| v == first))
}

/// Pearson coefficient of two complete, equal-length samples.
fn pearson_complete<T: SeriesElement>(x: &[T], y: &[T]) -> Result<T> {
    // Rounding in the mean leaves a tiny variance for constant samples such
    // as [0.1, 0.1, 0.1], so constancy is tested on the values themselves.
    if x.len() < 2 || is_constant(x) || is_constant(y) {
        return Ok(T::nan());
    }
    let n = T::from_usize(x.len())?;
    let mean_x = x.iter().fold(T::zero(), |acc, &v| acc + v) / n;
    let mean_y = y.iter().fold(T::zero(), |acc, &v| acc + v) / n;

    let mut cov = T::zero();
    let mut var_x = T::zero();
    let mut var_y = T::zero();
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov = cov + dx * dy;
        var_x = var_x + dx * dx;
        var_y = var_y + dy * dy;
    }

    if var_x == T::zero() || var_y == T::zero() {
        return Ok(T::nan());
    }
    let r = cov / (var_x * var_y).sqrt();
    Ok(r.max(-T::one()).min(T::one()))
}

/// Ranks samples from 1, giving tied values the average of their ranks.
///
/// # Errors
///
/// Returns `Error::NumericConversion` if a rank cannot be represented in `T`.
///
/// ```
/// use asset_graph::correlation::average_ranks;
///
/// let ranks = average_ranks(&[10.0_f64, 30.0, 20.0, 30.0]).unwrap();
/// assert_eq!(ranks, vec![1.0, 3.5, 2.0, 3.5]);
/// ```
pub fn average_ranks<T: SeriesElement>(data: &[T]) -> Result<Vec<T>> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&i, &j| data[i].partial_cmp(&data[j]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![T::zero(); data.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && data[order[end]] == data[order[start]] {
            end += 1;
        }
        // Positions start..end share the mean of ranks start+1 ..= end.
        let rank = T::from_usize(start + 1 + end)? / T::two();
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    Ok(ranks)
}

/// Computes the Pearson correlation coefficient.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for an empty input and
/// `Error::MisalignedInput` if the lengths differ.
pub fn pearson<T: SeriesElement>(a: &[T], b: &[T]) -> Result<T> {
    correlation(a, b, &CorrelationOptions::new(CorrelationMethod::Pearson))
}

/// Computes the Spearman rank correlation coefficient.
///
/// # Errors
///
/// Same conditions as [`pearson`].
pub fn spearman<T: SeriesElement>(a: &[T], b: &[T]) -> Result<T> {
    correlation(a, b, &CorrelationOptions::new(CorrelationMethod::Spearman))
}

/// Computes the configured correlation coefficient.
///
/// Returns a value in `[-1, 1]`, or NaN when the coefficient is undefined.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for an empty input and
/// `Error::MisalignedInput` if the lengths differ.
pub fn correlation<T: SeriesElement>(a: &[T], b: &[T], options: &CorrelationOptions) -> Result<T> {
    let (x, y) = paired_samples(a, b)?;
    if let Some(min) = options.min_periods {
        if x.len() < min {
            return Ok(T::nan());
        }
    }
    match options.method {
        CorrelationMethod::Pearson => pearson_complete(&x, &y),
        CorrelationMethod::Spearman => {
            let rx = average_ranks(&x)?;
            let ry = average_ranks(&y)?;
            pearson_complete(&rx, &ry)
        }
    }
}

/// [`PairMetric`] adapter that scores pairs by correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationMetric {
    /// Method and `min_periods`.
    pub options: CorrelationOptions,
    /// Report `|r|` so strong negative relationships rank like positive ones.
    pub absolute: bool,
}

impl CorrelationMetric {
    /// Creates a metric for the given method.
    #[must_use]
    pub const fn new(method: CorrelationMethod) -> Self {
        Self {
            options: CorrelationOptions::new(method),
            absolute: false,
        }
    }

    /// Sets the `min_periods` floor.
    #[must_use]
    pub const fn min_periods(mut self, periods: usize) -> Self {
        self.options = self.options.min_periods(periods);
        self
    }

    /// Reports absolute correlation.
    #[must_use]
    pub const fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }
}

impl PairMetric for CorrelationMetric {
    fn kind(&self) -> MatrixKind {
        MatrixKind::Similarity
    }

    fn name(&self) -> &'static str {
        match (self.options.method, self.absolute) {
            (CorrelationMethod::Pearson, false) => "pearson",
            (CorrelationMethod::Pearson, true) => "abs_pearson",
            (CorrelationMethod::Spearman, false) => "spearman",
            (CorrelationMethod::Spearman, true) => "abs_spearman",
        }
    }

    fn compute(&self, left: &Series, right: &Series) -> Result<f64> {
        let r = correlation(left.values(), right.values(), &self.options)?;
        Ok(if self.absolute { r.abs() } else { r })
    }
}
