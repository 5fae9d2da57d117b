//! In-memory collection of named price series.
//!
//! A [`Series`] is one asset's ordered samples, optionally paired with
//! timestamps. A [`SeriesStore`] maps unique identifiers to series while
//! preserving insertion order, so every downstream artifact iterates assets
//! deterministically.
//!
//! How the store gets populated (network fetch, CSV cache, ...) is outside
//! this crate; [`SeriesStore::from_rows`] accepts the long
//! `Date, Ticker, Value` row shape those collaborators produce.
//!
//! # Example
//!
//! ```
//! use asset_graph::series::{Series, SeriesStore};
//!
//! let store = SeriesStore::from_series([
//!     Series::new("PETR4", vec![30.1, 30.4, 29.8]).unwrap(),
//!     Series::new("VALE3", vec![61.0, 60.2, 62.5]).unwrap(),
//! ])
//! .unwrap();
//!
//! assert_eq!(store.len(), 2);
//! assert_eq!(store.ids().collect::<Vec<_>>(), vec!["PETR4", "VALE3"]);
//! ```

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};

/// One asset's samples, with optional timestamps of the same length.
///
/// Immutable once constructed. Samples may contain NaN to mark a missing
/// observation; the correlation engine skips such positions, while the
/// distance engine rejects them.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    id: String,
    values: Vec<f64>,
    timestamps: Option<Vec<i64>>,
}

impl Series {
    /// Creates a series without timestamps.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `values` is empty.
    pub fn new(id: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let id = id.into();
        if values.is_empty() {
            return Err(Error::invalid_input(id, "series has no samples"));
        }
        Ok(Self {
            id,
            values,
            timestamps: None,
        })
    }

    /// Creates a series with one timestamp per sample.
    ///
    /// Timestamps are opaque ordinal keys (for example Unix seconds or a
    /// day number); they must be non-decreasing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `values` is empty, the lengths differ,
    /// or the timestamps decrease anywhere.
    pub fn with_timestamps(
        id: impl Into<String>,
        values: Vec<f64>,
        timestamps: Vec<i64>,
    ) -> Result<Self> {
        let mut series = Self::new(id, values)?;
        if timestamps.len() != series.values.len() {
            return Err(Error::invalid_input(
                series.id,
                format!(
                    "{} timestamps for {} samples",
                    timestamps.len(),
                    series.values.len()
                ),
            ));
        }
        if let Some(pos) = timestamps.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::invalid_input(
                series.id,
                format!("timestamps decrease at index {}", pos + 1),
            ));
        }
        series.timestamps = Some(timestamps);
        Ok(series)
    }

    /// Returns the asset identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the samples.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the timestamps, if present.
    #[must_use]
    pub fn timestamps(&self) -> Option<&[i64]> {
        self.timestamps.as_deref()
    }

    /// Returns the number of samples (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; kept for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a copy rescaled to `[0, 1]` by min-max normalization.
    ///
    /// NaN samples are ignored when finding the range and stay NaN. A
    /// constant series maps to all zeros.
    #[must_use]
    pub fn min_max_normalized(&self) -> Self {
        let (min, max) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        let values = self
            .values
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    v
                } else if range > 0.0 && range.is_finite() {
                    (v - min) / range
                } else {
                    0.0
                }
            })
            .collect();
        Self {
            id: self.id.clone(),
            values,
            timestamps: self.timestamps.clone(),
        }
    }
}

/// A single long-format observation: one value of one asset at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    /// Asset identifier.
    pub ticker: String,
    /// Ordinal timestamp.
    pub timestamp: i64,
    /// Observed value.
    pub value: f64,
}

impl SampleRow {
    /// Creates a row.
    pub fn new(ticker: impl Into<String>, timestamp: i64, value: f64) -> Self {
        Self {
            ticker: ticker.into(),
            timestamp,
            value,
        }
    }
}

/// Insertion-ordered mapping from identifier to [`Series`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    series: Vec<Series>,
    index: HashMap<String, usize>,
}

impl SeriesStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` series.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Builds a store from series, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateSeries` if two series share an identifier.
    pub fn from_series(series: impl IntoIterator<Item = Series>) -> Result<Self> {
        let iter = series.into_iter();
        let mut store = Self::with_capacity(iter.size_hint().0);
        for s in iter {
            store.insert(s)?;
        }
        Ok(store)
    }

    /// Builds a store from long-format rows.
    ///
    /// Rows are grouped by ticker in order of first appearance and each
    /// group is sorted by timestamp (stable, so equal timestamps keep input
    /// order).
    ///
    /// # Errors
    ///
    /// Propagates series construction errors.
    pub fn from_rows(rows: impl IntoIterator<Item = SampleRow>) -> Result<Self> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<(i64, f64)>> = HashMap::new();
        for row in rows {
            let group = groups.entry(row.ticker.clone()).or_insert_with(|| {
                order.push(row.ticker.clone());
                Vec::new()
            });
            group.push((row.timestamp, row.value));
        }

        let mut store = Self::with_capacity(order.len());
        for ticker in order {
            let mut samples = groups.remove(&ticker).unwrap_or_default();
            samples.sort_by_key(|&(ts, _)| ts);
            let (timestamps, values): (Vec<i64>, Vec<f64>) = samples.into_iter().unzip();
            store.insert(Series::with_timestamps(ticker, values, timestamps)?)?;
        }
        Ok(store)
    }

    /// Adds a series at the end of the store.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateSeries` if the identifier is already present.
    pub fn insert(&mut self, series: Series) -> Result<()> {
        if self.index.contains_key(series.id()) {
            return Err(Error::DuplicateSeries {
                id: series.id().to_string(),
            });
        }
        self.index.insert(series.id().to_string(), self.series.len());
        self.series.push(series);
        Ok(())
    }

    /// Looks up a series by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Series> {
        self.index.get(id).map(|&i| &self.series[i])
    }

    /// Returns the insertion position of an identifier.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Returns the series at an insertion position.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Series> {
        self.series.get(index)
    }

    /// Iterates identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.series.iter().map(Series::id)
    }

    /// Iterates series in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Series> {
        self.series.iter()
    }

    /// Returns the series as a slice in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Series] {
        &self.series
    }

    /// Returns the number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns true if the store holds no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Returns a store with only the first `n` series.
    #[must_use]
    pub fn truncated(&self, n: usize) -> Self {
        let series: Vec<Series> = self.series.iter().take(n).cloned().collect();
        let index = series
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id().to_string(), i))
            .collect();
        Self { series, index }
    }

    /// Returns a store where every series is min-max normalized.
    #[must_use]
    pub fn min_max_normalized(&self) -> Self {
        Self {
            series: self.series.iter().map(Series::min_max_normalized).collect(),
            index: self.index.clone(),
        }
    }

    /// Restricts every series to the timestamps shared by all of them.
    ///
    /// A timestamp is dropped when any series lacks it or holds NaN there.
    /// When a series repeats a timestamp, its first sample is used.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if a series has no timestamps or if no
    /// timestamp survives the join.
    pub fn inner_join(&self) -> Result<Self> {
        let mut lookups: Vec<HashMap<i64, f64>> = Vec::with_capacity(self.series.len());
        for s in &self.series {
            let ts = s
                .timestamps()
                .ok_or_else(|| Error::invalid_input(s.id(), "series has no timestamps to join on"))?;
            let mut lookup = HashMap::with_capacity(ts.len());
            for (&t, &v) in ts.iter().zip(s.values()) {
                lookup.entry(t).or_insert(v);
            }
            lookups.push(lookup);
        }

        let Some(first) = lookups.first() else {
            return Ok(Self::new());
        };
        let shared: BTreeSet<i64> = first
            .keys()
            .copied()
            .filter(|t| {
                lookups
                    .iter()
                    .all(|l| l.get(t).is_some_and(|v| !v.is_nan()))
            })
            .collect();

        let mut joined = Self::with_capacity(self.series.len());
        for (s, lookup) in self.series.iter().zip(&lookups) {
            let values = shared.iter().map(|t| lookup[t]).collect();
            let timestamps = shared.iter().copied().collect();
            let series = Series::with_timestamps(s.id(), values, timestamps).map_err(|_| {
                Error::invalid_input(s.id(), "no timestamps shared by every series")
            })?;
            joined.insert(series)?;
        }
        Ok(joined)
    }
}

impl<'a> IntoIterator for &'a SeriesStore {
    type Item = &'a Series;
    type IntoIter = std::slice::Iter<'a, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}
