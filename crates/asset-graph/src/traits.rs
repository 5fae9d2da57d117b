//! Core traits for asset-graph numeric operations.
//!
//! # Overview
//!
//! [`SeriesElement`] abstracts over `f32` and `f64` so the distance and
//! correlation engines work on either precision. [`PairMetric`] is the seam
//! between the matrix builder and the engines: anything that can score a pair
//! of [`Series`] symmetrically can drive a matrix build.
//!
//! # Example
//!
//! ```
//! use asset_graph::traits::{SeriesElement, validate_not_empty};
//!
//! fn mean<T: SeriesElement>(data: &[T]) -> asset_graph::Result<T> {
//!     validate_not_empty(data, "left")?;
//!     let n = T::from_usize(data.len())?;
//!     Ok(data.iter().fold(T::zero(), |acc, &x| acc + x) / n)
//! }
//!
//! let m = mean(&[1.0_f64, 2.0, 3.0]).unwrap();
//! assert!((m - 2.0).abs() < 1e-10);
//! ```

use num_traits::{Float, NumCast};

use crate::error::{Error, Result};
use crate::matrix::MatrixKind;
use crate::series::Series;

/// A trait for types that can be used as samples in a series.
///
/// Extends `num_traits::Float` with the conversions the engines need.
pub trait SeriesElement: Float + NumCast + Copy + Default + Send + Sync + 'static {
    /// Creates a series element from a `usize` value.
    ///
    /// # Errors
    ///
    /// Returns `Error::NumericConversion` if the value cannot be represented in this type.
    #[inline]
    fn from_usize(value: usize) -> Result<Self> {
        <Self as NumCast>::from(value).ok_or(Error::NumericConversion {
            context: "usize to series element",
        })
    }

    /// Creates a series element from an `f64` value.
    ///
    /// # Errors
    ///
    /// Returns `Error::NumericConversion` if the value cannot be represented in this type.
    #[inline]
    fn from_f64(value: f64) -> Result<Self> {
        <Self as NumCast>::from(value).ok_or(Error::NumericConversion {
            context: "f64 to series element",
        })
    }

    /// Widens this element to `f64`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NumericConversion` if the value cannot be represented as `f64`.
    #[inline]
    fn into_f64(self) -> Result<f64> {
        self.to_f64().ok_or(Error::NumericConversion {
            context: "series element to f64",
        })
    }

    /// Returns the constant 2 as this type.
    #[inline]
    #[must_use]
    fn two() -> Self {
        Self::one() + Self::one()
    }
}

impl<T: Float + NumCast + Copy + Default + Send + Sync + 'static> SeriesElement for T {}

/// A symmetric scoring function over two series.
///
/// Implementations must be pure: `compute(a, b)` equals `compute(b, a)` and
/// no state is shared between calls, so a matrix build may evaluate pairs on
/// any number of threads.
pub trait PairMetric: Send + Sync {
    /// Whether scores are distances (smaller is closer) or similarities.
    fn kind(&self) -> MatrixKind;

    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Scores one pair of series.
    ///
    /// # Errors
    ///
    /// Returns the engine's error; the matrix builder decides whether it
    /// aborts the build or becomes a missing entry.
    fn compute(&self, left: &Series, right: &Series) -> Result<f64>;

    /// The value placed on the matrix diagonal.
    #[inline]
    fn identity(&self) -> f64 {
        self.kind().identity()
    }
}

impl<M: PairMetric + ?Sized> PairMetric for &M {
    fn kind(&self) -> MatrixKind {
        (**self).kind()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn compute(&self, left: &Series, right: &Series) -> Result<f64> {
        (**self).compute(left, right)
    }
}

/// Validates that a sample slice is not empty.
///
/// # Errors
///
/// Returns `Error::InvalidInput` naming `role` if the slice is empty.
#[inline]
pub fn validate_not_empty<T>(data: &[T], role: &str) -> Result<()> {
    if data.is_empty() {
        Err(Error::invalid_input(role, "sequence is empty"))
    } else {
        Ok(())
    }
}

/// Validates that every sample is finite.
///
/// # Errors
///
/// Returns `Error::InvalidInput` naming `role` and the first offending index.
pub fn validate_finite<T: SeriesElement>(data: &[T], role: &str) -> Result<()> {
    match data.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(Error::invalid_input(
            role,
            format!("non-finite sample at index {index}"),
        )),
        None => Ok(()),
    }
}
