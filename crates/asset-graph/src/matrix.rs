//! Pairwise distance/similarity matrices and their construction.
//!
//! A [`DistanceMatrix`] stores one value per unordered pair of distinct
//! identifiers in condensed upper-triangle form. The diagonal is implied by
//! the [`MatrixKind`]: exactly 0 for distances, exactly 1 for similarities.
//!
//! Entries are `Option<f64>`: `None` marks a pair whose metric failed (the
//! missing-entry marker), while `Some(NaN)` is a computed but undefined value
//! such as the correlation sentinel. Neither ever becomes a graph edge.
//!
//! [`MatrixBuilder`] evaluates a [`PairMetric`] over every pair of a
//! [`SeriesStore`], optionally in parallel, under an optional
//! [`ComputeBudget`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::batch::{BatchProcessor, DEFAULT_PARALLEL_THRESHOLD};
use crate::error::{Error, Result};
use crate::series::SeriesStore;
use crate::traits::PairMetric;
use crate::utils::{condensed_index, pair_count, upper_triangle_pairs};

// ============================================================================
// Matrix kind
// ============================================================================

/// Whether matrix values are distances or similarities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    /// Smaller is closer; diagonal is 0.
    Distance,
    /// Larger is closer; diagonal is 1.
    Similarity,
}

impl MatrixKind {
    /// The diagonal value for this kind.
    #[inline]
    #[must_use]
    pub const fn identity(self) -> f64 {
        match self {
            Self::Distance => 0.0,
            Self::Similarity => 1.0,
        }
    }

    /// Threshold test used by graph selection: `<=` for distances, `>=` for
    /// similarities.
    #[inline]
    #[must_use]
    pub fn passes_threshold(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Distance => value <= threshold,
            Self::Similarity => value >= threshold,
        }
    }

    /// Orders two finite values so that the closer one comes first.
    #[inline]
    #[must_use]
    pub fn closer_first(self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Self::Distance => ord,
            Self::Similarity => ord.reverse(),
        }
    }
}

// ============================================================================
// Matrix
// ============================================================================

/// One matrix entry in canonical form (`left < right`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairValue {
    /// Lexicographically smaller identifier.
    pub left: String,
    /// Lexicographically larger identifier.
    pub right: String,
    /// The stored value, `None` if the pair is missing.
    pub value: Option<f64>,
}

/// Immutable symmetric matrix over a fixed set of identifiers.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceMatrix {
    ids: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    kind: MatrixKind,
    values: Vec<Option<f64>>,
}

impl PartialEq for DistanceMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
            && self.kind == other.kind
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| match (a, b) {
                    (Some(x), Some(y)) => x == y || (x.is_nan() && y.is_nan()),
                    (None, None) => true,
                    _ => false,
                })
    }
}

fn index_ids(ids: &[String]) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(Error::DuplicateSeries { id: id.clone() });
        }
    }
    Ok(index)
}

impl DistanceMatrix {
    /// Builds a matrix from values in condensed upper-triangle order.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateSeries` for a repeated identifier and
    /// `Error::InvalidParameter` if `values` does not hold exactly one entry
    /// per pair.
    pub fn from_condensed(
        ids: Vec<String>,
        kind: MatrixKind,
        values: Vec<Option<f64>>,
    ) -> Result<Self> {
        let index = index_ids(&ids)?;
        let expected = pair_count(ids.len());
        if values.len() != expected {
            return Err(Error::invalid_parameter(
                "values",
                values.len(),
                "must hold one entry per unordered pair",
            ));
        }
        Ok(Self {
            ids,
            index,
            kind,
            values,
        })
    }

    /// Builds a matrix from explicit `(a, b, value)` triples.
    ///
    /// Pairs that are not listed are missing. The order of `a` and `b` does
    /// not matter; a later triple for the same pair replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownSeries` if a triple names an identifier not in
    /// `ids`, `Error::InvalidParameter` for a self-pair and
    /// `Error::DuplicateSeries` for a repeated identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use asset_graph::matrix::{DistanceMatrix, MatrixKind};
    ///
    /// let m = DistanceMatrix::from_pairs(
    ///     ["X", "Y", "Z"],
    ///     MatrixKind::Similarity,
    ///     [("X", "Y", 0.95), ("X", "Z", 0.50), ("Y", "Z", 0.40)],
    /// )
    /// .unwrap();
    /// assert_eq!(m.get("Y", "X").unwrap(), Some(0.95));
    /// assert_eq!(m.get("Z", "Z").unwrap(), Some(1.0));
    /// ```
    pub fn from_pairs<I, S, P, A, B>(ids: I, kind: MatrixKind, pairs: P) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        P: IntoIterator<Item = (A, B, f64)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let values = vec![None; pair_count(ids.len())];
        let mut matrix = Self::from_condensed(ids, kind, values)?;
        for (a, b, value) in pairs {
            let slot = matrix.slot(a.as_ref(), b.as_ref())?.ok_or_else(|| {
                Error::invalid_parameter("pair", a.as_ref(), "self-pairs are fixed by the matrix kind")
            })?;
            matrix.values[slot] = Some(value);
        }
        Ok(matrix)
    }

    /// Identifiers in matrix order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the matrix has no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Distance or similarity.
    #[must_use]
    pub const fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// Position of `id` in matrix order.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Condensed slot of a pair, `None` on the diagonal.
    fn slot(&self, a: &str, b: &str) -> Result<Option<usize>> {
        let i = self
            .position(a)
            .ok_or_else(|| Error::UnknownSeries { id: a.to_string() })?;
        let j = self
            .position(b)
            .ok_or_else(|| Error::UnknownSeries { id: b.to_string() })?;
        Ok(self.slot_at(i, j))
    }

    fn slot_at(&self, i: usize, j: usize) -> Option<usize> {
        let n = self.ids.len();
        match i.cmp(&j) {
            Ordering::Equal => None,
            Ordering::Less => Some(condensed_index(i, j, n)),
            Ordering::Greater => Some(condensed_index(j, i, n)),
        }
    }

    /// Value for a pair of identifiers, in either order.
    ///
    /// Returns `Ok(None)` for a missing entry and the kind's identity on the
    /// diagonal.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownSeries` if either identifier is not in the matrix.
    pub fn get(&self, a: &str, b: &str) -> Result<Option<f64>> {
        Ok(match self.slot(a, b)? {
            Some(slot) => self.values[slot],
            None => Some(self.kind.identity()),
        })
    }

    /// Value by position. Out-of-range positions yield `None`.
    #[must_use]
    pub fn value_at(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.ids.len() || j >= self.ids.len() {
            return None;
        }
        match self.slot_at(i, j) {
            Some(slot) => self.values[slot],
            None => Some(self.kind.identity()),
        }
    }

    /// Value by position expressed as a distance.
    ///
    /// Similarities `s` become `1 - s`. Missing and non-finite entries yield
    /// `None`.
    #[must_use]
    pub fn distance_at(&self, i: usize, j: usize) -> Option<f64> {
        let value = self.value_at(i, j).filter(|v| v.is_finite())?;
        Some(match self.kind {
            MatrixKind::Distance => value,
            MatrixKind::Similarity => 1.0 - value,
        })
    }

    /// Iterates `(i, j, value)` over pairs in storage order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, Option<f64>)> + '_ {
        upper_triangle_pairs(self.ids.len())
            .into_iter()
            .zip(self.values.iter().copied())
            .map(|((i, j), v)| (i, j, v))
    }

    fn canonical(&self, i: usize, j: usize, value: Option<f64>) -> PairValue {
        let (a, b) = (&self.ids[i], &self.ids[j]);
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        PairValue {
            left: left.clone(),
            right: right.clone(),
            value,
        }
    }

    /// Every pair as `(id1, id2, value)` with `id1 < id2`, sorted by
    /// identifiers. This is the canonical export shape.
    #[must_use]
    pub fn sorted_pairs(&self) -> Vec<PairValue> {
        let mut out: Vec<PairValue> = self
            .pairs()
            .map(|(i, j, v)| self.canonical(i, j, v))
            .collect();
        out.sort_by(|a, b| (&a.left, &a.right).cmp(&(&b.left, &b.right)));
        out
    }

    /// Finite entries ordered by absolute value, largest first; ties by
    /// identifier pair.
    #[must_use]
    pub fn ranked_pairs(&self) -> Vec<PairValue> {
        let mut out: Vec<PairValue> = self
            .pairs()
            .filter(|(_, _, v)| v.is_some_and(f64::is_finite))
            .map(|(i, j, v)| self.canonical(i, j, v))
            .collect();
        out.sort_by(|a, b| {
            let va = a.value.map_or(0.0, f64::abs);
            let vb = b.value.map_or(0.0, f64::abs);
            vb.partial_cmp(&va)
                .unwrap_or(Ordering::Equal)
                .then_with(|| (&a.left, &a.right).cmp(&(&b.left, &b.right)))
        });
        out
    }

    /// Canonical identifier pairs whose entry is missing.
    #[must_use]
    pub fn missing_pairs(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .pairs()
            .filter(|(_, _, v)| v.is_none())
            .map(|(i, j, v)| {
                let p = self.canonical(i, j, v);
                (p.left, p.right)
            })
            .collect();
        out.sort();
        out
    }

    /// Returns `true` if no entry is missing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Dense row-major rendering including the diagonal.
    #[must_use]
    pub fn to_square(&self) -> Vec<Vec<Option<f64>>> {
        let n = self.ids.len();
        (0..n)
            .map(|i| (0..n).map(|j| self.value_at(i, j)).collect())
            .collect()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Limits on a matrix build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeBudget {
    /// Maximum number of pairs to evaluate.
    pub max_pairs: Option<usize>,
    /// Wall-clock limit in milliseconds.
    pub max_duration_ms: Option<u64>,
}

impl ComputeBudget {
    /// An unlimited budget.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_pairs: None,
            max_duration_ms: None,
        }
    }

    /// Caps the number of evaluated pairs.
    #[must_use]
    pub const fn max_pairs(mut self, pairs: usize) -> Self {
        self.max_pairs = Some(pairs);
        self
    }

    /// Caps the wall-clock time of the build.
    #[must_use]
    pub const fn max_duration_ms(mut self, millis: u64) -> Self {
        self.max_duration_ms = Some(millis);
        self
    }

    /// The wall-clock limit as a `Duration`.
    #[must_use]
    pub const fn max_duration(&self) -> Option<Duration> {
        match self.max_duration_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }
}

/// Tracks budget consumption across worker threads.
struct BudgetGuard {
    budget: ComputeBudget,
    started: Instant,
    claimed: AtomicUsize,
    exhausted: AtomicBool,
}

impl BudgetGuard {
    fn new(budget: ComputeBudget) -> Self {
        Self {
            budget,
            started: Instant::now(),
            claimed: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Claims one evaluation slot; `false` once the budget is spent.
    fn try_claim(&self) -> bool {
        if self.exhausted.load(AtomicOrdering::Relaxed) {
            return false;
        }
        if let Some(limit) = self.budget.max_duration() {
            if self.started.elapsed() > limit {
                self.exhausted.store(true, AtomicOrdering::Relaxed);
                return false;
            }
        }
        if let Some(max) = self.budget.max_pairs {
            if self.claimed.fetch_add(1, AtomicOrdering::Relaxed) >= max {
                self.exhausted.store(true, AtomicOrdering::Relaxed);
                return false;
            }
        }
        true
    }
}

enum PairOutcome {
    Value(f64),
    Failed(Error),
    Skipped,
}

/// Builds a [`DistanceMatrix`] by evaluating a metric over every pair.
///
/// In the default mode a pair whose metric fails becomes a missing entry and
/// a warning is logged. In strict mode the first failure stops any pair not
/// yet started and the build fails with `Error::PairFailed`. Sequential
/// builds report the first failing pair in canonical pair order; parallel
/// builds report the earliest failure among the pairs that ran.
///
/// # Example
///
/// ```
/// use asset_graph::distance::{DtwMetric, DtwOptions};
/// use asset_graph::matrix::MatrixBuilder;
/// use asset_graph::series::{Series, SeriesStore};
///
/// let store = SeriesStore::from_series([
///     Series::new("A", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
///     Series::new("B", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
///     Series::new("C", vec![4.0, 3.0, 2.0, 1.0]).unwrap(),
/// ])
/// .unwrap();
///
/// let matrix = MatrixBuilder::new()
///     .strict(true)
///     .build(&store, &DtwMetric::new(DtwOptions::new()))
///     .unwrap();
/// assert_eq!(matrix.get("A", "B").unwrap(), Some(0.0));
/// assert!(matrix.get("A", "C").unwrap().unwrap() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixBuilder {
    /// Abort on the first failing pair instead of recording it as missing.
    pub strict: bool,
    /// Minimum number of pairs before evaluation is spread across threads.
    pub min_parallel_threshold: usize,
    /// Optional pair-count and wall-clock limits.
    pub budget: ComputeBudget,
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixBuilder {
    /// Creates a non-strict builder with no budget.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict: false,
            min_parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            budget: ComputeBudget::unlimited(),
        }
    }

    /// Sets strict mode.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the parallel threshold (in pairs).
    #[must_use]
    pub const fn min_parallel_threshold(mut self, threshold: usize) -> Self {
        self.min_parallel_threshold = threshold;
        self
    }

    /// Sets the compute budget.
    #[must_use]
    pub const fn budget(mut self, budget: ComputeBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Evaluates `metric` over every unordered pair of series in `store`.
    ///
    /// # Errors
    ///
    /// - `Error::PairFailed` in strict mode when a pair fails.
    /// - `Error::BudgetExhausted` when the budget stops the build.
    pub fn build<M: PairMetric + ?Sized>(
        &self,
        store: &SeriesStore,
        metric: &M,
    ) -> Result<DistanceMatrix> {
        let series = store.as_slice();
        let ids: Vec<String> = store.ids().map(str::to_string).collect();
        let pairs = upper_triangle_pairs(series.len());
        let total = pairs.len();
        let processor = BatchProcessor::new().min_parallel_threshold(self.min_parallel_threshold);

        tracing::debug!(
            metric = metric.name(),
            series = series.len(),
            pairs = total,
            strict = self.strict,
            parallel = processor.is_parallel_for(total),
            "building matrix"
        );

        let guard = BudgetGuard::new(self.budget);
        // Set by the first failing pair in strict mode; later pairs are skipped.
        let aborted = AtomicBool::new(false);
        let outcomes = processor.map(&pairs, |&(i, j)| {
            if aborted.load(AtomicOrdering::Relaxed) || !guard.try_claim() {
                return PairOutcome::Skipped;
            }
            match metric.compute(&series[i], &series[j]) {
                Ok(value) => PairOutcome::Value(value),
                Err(err) => {
                    if self.strict {
                        aborted.store(true, AtomicOrdering::Relaxed);
                    }
                    PairOutcome::Failed(err)
                }
            }
        });

        let mut values = Vec::with_capacity(total);
        let mut completed = 0;
        let mut skipped = false;
        for (&(i, j), outcome) in pairs.iter().zip(outcomes) {
            match outcome {
                PairOutcome::Value(value) => {
                    completed += 1;
                    values.push(Some(value));
                }
                PairOutcome::Failed(err) => {
                    completed += 1;
                    if self.strict {
                        return Err(Error::PairFailed {
                            left: ids[i].clone(),
                            right: ids[j].clone(),
                            source: Box::new(err),
                        });
                    }
                    tracing::warn!(
                        left = %ids[i],
                        right = %ids[j],
                        error = %err,
                        "pair failed, recording missing entry"
                    );
                    values.push(None);
                }
                PairOutcome::Skipped => {
                    skipped = true;
                    values.push(None);
                }
            }
        }

        if skipped {
            tracing::warn!(completed, total, "compute budget exhausted");
            return Err(Error::BudgetExhausted { completed, total });
        }

        let matrix = DistanceMatrix::from_condensed(ids, metric.kind(), values)?;
        tracing::debug!(
            metric = metric.name(),
            missing = matrix.values.iter().filter(|v| v.is_none()).count(),
            "matrix complete"
        );
        Ok(matrix)
    }
}

/// Builds a matrix with the default (non-strict, unlimited) builder.
///
/// # Errors
///
/// See [`MatrixBuilder::build`].
pub fn build_matrix<M: PairMetric + ?Sized>(store: &SeriesStore, metric: &M) -> Result<DistanceMatrix> {
    MatrixBuilder::new().build(store, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{DtwMetric, DtwOptions};
    use crate::series::Series;

    /// Fails for any pair involving a series named `BAD`.
    struct Picky;

    impl PairMetric for Picky {
        fn kind(&self) -> MatrixKind {
            MatrixKind::Distance
        }

        fn name(&self) -> &'static str {
            "picky"
        }

        fn compute(&self, left: &Series, right: &Series) -> Result<f64> {
            if left.id() == "BAD" || right.id() == "BAD" {
                return Err(Error::MisalignedInput {
                    left_len: left.len(),
                    right_len: right.len(),
                });
            }
            Ok((left.values()[0] - right.values()[0]).abs())
        }
    }

    fn store(ids: &[&str]) -> SeriesStore {
        SeriesStore::from_series(
            ids.iter()
                .enumerate()
                .map(|(k, id)| Series::new(*id, vec![k as f64]).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_kind_semantics() {
        assert_eq!(MatrixKind::Distance.identity(), 0.0);
        assert_eq!(MatrixKind::Similarity.identity(), 1.0);
        assert!(MatrixKind::Distance.passes_threshold(0.5, 0.5));
        assert!(!MatrixKind::Distance.passes_threshold(0.6, 0.5));
        assert!(MatrixKind::Similarity.passes_threshold(0.9, 0.9));
        assert_eq!(MatrixKind::Similarity.closer_first(0.9, 0.1), Ordering::Less);
        assert_eq!(MatrixKind::Distance.closer_first(0.9, 0.1), Ordering::Greater);
    }

    #[test]
    fn test_from_pairs_and_lookup() {
        let m = DistanceMatrix::from_pairs(
            ["X", "Y", "Z"],
            MatrixKind::Similarity,
            [("Y", "X", 0.95), ("X", "Z", 0.5)],
        )
        .unwrap();
        assert_eq!(m.get("X", "Y").unwrap(), Some(0.95));
        assert_eq!(m.get("Y", "Z").unwrap(), None);
        assert_eq!(m.get("X", "X").unwrap(), Some(1.0));
        assert_eq!(
            m.get("X", "W").unwrap_err(),
            Error::UnknownSeries { id: "W".into() }
        );
        assert!(!m.is_complete());
        assert_eq!(m.missing_pairs(), vec![("Y".to_string(), "Z".to_string())]);
    }

    #[test]
    fn test_from_pairs_rejects_bad_input() {
        let dup = DistanceMatrix::from_pairs(["A", "A"], MatrixKind::Distance, [("A", "A", 1.0)]);
        assert_eq!(dup.unwrap_err(), Error::DuplicateSeries { id: "A".into() });

        let unknown = DistanceMatrix::from_pairs(["A", "B"], MatrixKind::Distance, [("A", "C", 1.0)]);
        assert!(matches!(unknown, Err(Error::UnknownSeries { .. })));

        let diagonal = DistanceMatrix::from_pairs(["A", "B"], MatrixKind::Distance, [("B", "B", 1.0)]);
        assert!(matches!(diagonal, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_from_condensed_length_check() {
        let ids = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let err = DistanceMatrix::from_condensed(ids, MatrixKind::Distance, vec![Some(1.0)]);
        assert!(matches!(err, Err(Error::InvalidParameter { parameter: "values", .. })));
    }

    #[test]
    fn test_sorted_pairs_are_canonical() {
        let m = DistanceMatrix::from_pairs(
            ["Z", "A", "M"],
            MatrixKind::Distance,
            [("Z", "A", 1.0), ("Z", "M", 2.0), ("A", "M", 3.0)],
        )
        .unwrap();
        let pairs: Vec<(String, String, Option<f64>)> = m
            .sorted_pairs()
            .into_iter()
            .map(|p| (p.left, p.right, p.value))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("A".into(), "M".into(), Some(3.0)),
                ("A".into(), "Z".into(), Some(1.0)),
                ("M".into(), "Z".into(), Some(2.0)),
            ]
        );
    }

    #[test]
    fn test_ranked_pairs_by_absolute_value() {
        let m = DistanceMatrix::from_pairs(
            ["A", "B", "C", "D"],
            MatrixKind::Similarity,
            [
                ("A", "B", 0.2),
                ("A", "C", -0.9),
                ("A", "D", f64::NAN),
                ("B", "C", 0.5),
                ("B", "D", -0.5),
            ],
        )
        .unwrap();
        let ranked: Vec<(String, String)> = m
            .ranked_pairs()
            .into_iter()
            .map(|p| (p.left, p.right))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("A".into(), "C".into()),
                ("B".into(), "C".into()),
                ("B".into(), "D".into()),
                ("A".into(), "B".into()),
            ]
        );
    }

    #[test]
    fn test_distance_at_converts_similarity() {
        let m = DistanceMatrix::from_pairs(["A", "B"], MatrixKind::Similarity, [("A", "B", 0.75)])
            .unwrap();
        assert_eq!(m.distance_at(0, 1), Some(0.25));
        assert_eq!(m.distance_at(1, 1), Some(0.0));
        assert_eq!(m.distance_at(0, 5), None);
    }

    #[test]
    fn test_to_square_is_symmetric() {
        let m = DistanceMatrix::from_pairs(
            ["A", "B", "C"],
            MatrixKind::Distance,
            [("A", "B", 1.0), ("A", "C", 2.0), ("B", "C", 3.0)],
        )
        .unwrap();
        let sq = m.to_square();
        for (i, row) in sq.iter().enumerate() {
            assert_eq!(row[i], Some(0.0));
            for (j, value) in row.iter().enumerate() {
                assert_eq!(*value, sq[j][i]);
            }
        }
    }

    #[test]
    fn test_build_dtw_scenario() {
        let store = SeriesStore::from_series([
            Series::new("A", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
            Series::new("B", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
            Series::new("C", vec![4.0, 3.0, 2.0, 1.0]).unwrap(),
        ])
        .unwrap();
        let m = build_matrix(&store, &DtwMetric::new(DtwOptions::new())).unwrap();
        assert_eq!(m.kind(), MatrixKind::Distance);
        assert_eq!(m.get("A", "B").unwrap(), Some(0.0));
        for id in ["A", "B", "C"] {
            assert_eq!(m.get(id, id).unwrap(), Some(0.0));
        }
        assert_eq!(m.get("A", "C").unwrap(), m.get("C", "A").unwrap());
        assert_eq!(m.get("A", "C").unwrap(), Some(8.0));
    }

    #[test]
    fn test_non_strict_records_missing() {
        let m = MatrixBuilder::new()
            .build(&store(&["A", "BAD", "C"]), &Picky)
            .unwrap();
        assert_eq!(m.get("A", "BAD").unwrap(), None);
        assert_eq!(m.get("BAD", "C").unwrap(), None);
        assert_eq!(m.get("A", "C").unwrap(), Some(2.0));
        assert_eq!(m.missing_pairs().len(), 2);
    }

    #[test]
    fn test_strict_reports_first_failing_pair() {
        let err = MatrixBuilder::new()
            .strict(true)
            .build(&store(&["A", "BAD", "C"]), &Picky)
            .unwrap_err();
        match err {
            Error::PairFailed { left, right, source } => {
                assert_eq!(left, "A");
                assert_eq!(right, "BAD");
                assert!(matches!(*source, Error::MisalignedInput { .. }));
            }
            other => panic!("Expected PairFailed, got {other:?}"),
        }
    }

    /// Counts how many pairs reach the wrapped metric.
    struct Counting {
        calls: AtomicUsize,
    }

    impl PairMetric for Counting {
        fn kind(&self) -> MatrixKind {
            Picky.kind()
        }

        fn name(&self) -> &'static str {
            "counting"
        }

        fn compute(&self, left: &Series, right: &Series) -> Result<f64> {
            self.calls.fetch_add(1, AtomicOrdering::Relaxed);
            Picky.compute(left, right)
        }
    }

    #[test]
    fn test_strict_stops_after_first_failure() {
        let s = store(&["BAD", "B", "C", "D", "E"]);
        let metric = Counting {
            calls: AtomicUsize::new(0),
        };
        let err = MatrixBuilder::new()
            .strict(true)
            .min_parallel_threshold(usize::MAX)
            .build(&s, &metric)
            .unwrap_err();
        assert!(matches!(err, Error::PairFailed { .. }));
        assert_eq!(metric.calls.load(AtomicOrdering::Relaxed), 1);

        // Non-strict builds still visit every pair.
        let lenient = Counting {
            calls: AtomicUsize::new(0),
        };
        let m = MatrixBuilder::new()
            .min_parallel_threshold(usize::MAX)
            .build(&s, &lenient)
            .unwrap();
        assert_eq!(lenient.calls.load(AtomicOrdering::Relaxed), 10);
        assert_eq!(m.missing_pairs().len(), 4);
    }

    #[test]
    fn test_strict_parallel_reports_a_failing_pair() {
        let ids: Vec<String> = (0..40).map(|i| format!("S{i:02}")).collect();
        let mut refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        refs[7] = "BAD";
        let metric = Counting {
            calls: AtomicUsize::new(0),
        };
        let err = MatrixBuilder::new()
            .strict(true)
            .min_parallel_threshold(1)
            .build(&store(&refs), &metric)
            .unwrap_err();
        match err {
            Error::PairFailed { left, right, .. } => assert!(left == "BAD" || right == "BAD"),
            other => panic!("Expected PairFailed, got {other:?}"),
        }
        assert!(metric.calls.load(AtomicOrdering::Relaxed) <= pair_count(40));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let ids: Vec<String> = (0..12).map(|i| format!("S{i:02}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let s = store(&refs);
        let seq = MatrixBuilder::new()
            .min_parallel_threshold(usize::MAX)
            .build(&s, &Picky)
            .unwrap();
        let par = MatrixBuilder::new()
            .min_parallel_threshold(1)
            .build(&s, &Picky)
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_budget_max_pairs() {
        let err = MatrixBuilder::new()
            .min_parallel_threshold(usize::MAX)
            .budget(ComputeBudget::unlimited().max_pairs(2))
            .build(&store(&["A", "B", "C"]), &Picky)
            .unwrap_err();
        assert_eq!(err, Error::BudgetExhausted { completed: 2, total: 3 });
    }

    #[test]
    fn test_budget_large_enough() {
        let m = MatrixBuilder::new()
            .budget(ComputeBudget::unlimited().max_pairs(3))
            .build(&store(&["A", "B", "C"]), &Picky)
            .unwrap();
        assert!(m.is_complete());
    }

    #[test]
    fn test_empty_and_single_store() {
        let empty = build_matrix(&SeriesStore::new(), &Picky).unwrap();
        assert!(empty.is_empty());
        assert!(empty.sorted_pairs().is_empty());

        let single = build_matrix(&store(&["A"]), &Picky).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single.get("A", "A").unwrap(), Some(0.0));
    }

    #[test]
    fn test_builder_serde_defaults() {
        let builder: MatrixBuilder = serde_json::from_str(r#"{"strict": true}"#).unwrap();
        assert!(builder.strict);
        assert_eq!(builder.min_parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(builder.budget, ComputeBudget::unlimited());
    }
}
