//! Average-linkage agglomerative clustering over a distance matrix.

use super::ClusterAssignment;
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

/// Agglomerates the matrix identifiers into exactly `k` clusters.
///
/// The distance between two clusters is the mean distance between their
/// members. Similarity matrices are read as distances `1 - s`; missing and
/// non-finite entries count as infinitely far apart. Equal distances merge
/// the pair whose identifiers sort first.
///
/// # Errors
///
/// Returns `Error::InvalidParameter` unless `1 <= k <= matrix.len()`.
///
/// # Example
///
/// ```
/// use asset_graph::cluster::hierarchical_average;
/// use asset_graph::matrix::{DistanceMatrix, MatrixKind};
///
/// let m = DistanceMatrix::from_pairs(
///     ["A", "B", "C"],
///     MatrixKind::Distance,
///     [("A", "B", 1.0), ("A", "C", 9.0), ("B", "C", 8.0)],
/// )
/// .unwrap();
///
/// let clusters = hierarchical_average(&m, 2).unwrap();
/// assert_eq!(clusters.label_of("A"), clusters.label_of("B"));
/// assert_ne!(clusters.label_of("A"), clusters.label_of("C"));
/// ```
pub fn hierarchical_average(matrix: &DistanceMatrix, k: usize) -> Result<ClusterAssignment> {
    let n = matrix.len();
    if k == 0 || k > n {
        return Err(Error::invalid_parameter(
            "k",
            k,
            "must be between 1 and the number of series",
        ));
    }

    // Work in identifier order so tie-breaks do not depend on matrix order.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| matrix.ids()[a].cmp(&matrix.ids()[b]));

    let mut dist: Vec<Vec<f64>> = order
        .iter()
        .map(|&a| {
            order
                .iter()
                .map(|&b| matrix.distance_at(a, b).unwrap_or(f64::INFINITY))
                .collect()
        })
        .collect();
    let mut clusters: Vec<Option<Vec<usize>>> = (0..n).map(|r| Some(vec![r])).collect();
    let mut active = n;

    while active > k {
        let mut best: Option<(f64, usize, usize)> = None;
        for i in 0..n {
            if clusters[i].is_none() {
                continue;
            }
            for j in (i + 1)..n {
                if clusters[j].is_none() {
                    continue;
                }
                let d = dist[i][j];
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, i, j));
                }
            }
        }
        let Some((_, keep, absorb)) = best else {
            break;
        };

        #[allow(clippy::cast_precision_loss)]
        let (size_keep, size_absorb) = (
            clusters[keep].as_ref().map_or(0, Vec::len) as f64,
            clusters[absorb].as_ref().map_or(0, Vec::len) as f64,
        );
        for other in 0..n {
            if other == keep || other == absorb || clusters[other].is_none() {
                continue;
            }
            let merged = (size_keep * dist[keep][other] + size_absorb * dist[absorb][other])
                / (size_keep + size_absorb);
            dist[keep][other] = merged;
            dist[other][keep] = merged;
        }

        let moved = clusters[absorb].take().unwrap_or_default();
        if let Some(target) = clusters[keep].as_mut() {
            target.extend(moved);
        }
        active -= 1;
    }

    tracing::debug!(series = n, clusters = k, "average linkage complete");
    Ok(ClusterAssignment::from_clusters(
        clusters
            .into_iter()
            .flatten()
            .map(|c| c.into_iter().map(|r| matrix.ids()[order[r]].clone()).collect())
            .collect(),
    ))
}
