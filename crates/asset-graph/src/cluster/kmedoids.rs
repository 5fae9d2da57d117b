//! k-medoids (PAM-style alternating) clustering over a distance matrix.

use serde::{Deserialize, Serialize};

use super::ClusterAssignment;
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// k-medoids configuration.
///
/// The first `k` identifiers in matrix order seed the medoids. Each round
/// assigns every identifier to its nearest medoid, then moves each medoid to
/// the member with the smallest total distance to its cluster. Rounds stop
/// when no medoid moves or after `max_iterations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KMedoids {
    /// Number of clusters.
    pub k: usize,
    /// Maximum number of assign/update rounds.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

const fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

/// Result of a k-medoids run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedoidClustering {
    /// The partition.
    pub assignment: ClusterAssignment,
    /// Medoid identifiers, in label order.
    pub medoids: Vec<String>,
    /// Rounds executed.
    pub iterations: usize,
}

impl KMedoids {
    /// Creates a configuration for `k` clusters.
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the iteration cap.
    #[must_use]
    pub const fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Clusters the identifiers of `matrix`.
    ///
    /// Similarities are read as distances `1 - s`; missing entries are
    /// infinitely far apart.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` unless `1 <= k <= matrix.len()` and
    /// `max_iterations >= 1`.
    pub fn fit(&self, matrix: &DistanceMatrix) -> Result<MedoidClustering> {
        let n = matrix.len();
        if self.k == 0 || self.k > n {
            return Err(Error::invalid_parameter(
                "k",
                self.k,
                "must be between 1 and the number of series",
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid_parameter(
                "max_iterations",
                self.max_iterations,
                "must be at least 1",
            ));
        }

        let d = |i: usize, j: usize| matrix.distance_at(i, j).unwrap_or(f64::INFINITY);
        let mut medoids: Vec<usize> = (0..self.k).collect();
        let mut owner = vec![0_usize; n];
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            // Assignment: nearest medoid, ties to the lower cluster; medoids own themselves.
            for (point, slot) in owner.iter_mut().enumerate() {
                *slot = match medoids.iter().position(|&m| m == point) {
                    Some(c) => c,
                    None => {
                        let mut best = 0;
                        for c in 1..medoids.len() {
                            if d(point, medoids[c]) < d(point, medoids[best]) {
                                best = c;
                            }
                        }
                        best
                    }
                };
            }

            // Update: member minimising total in-cluster distance; keep the
            // current medoid on ties.
            let mut moved = false;
            for (c, medoid) in medoids.iter_mut().enumerate() {
                let members: Vec<usize> = (0..n).filter(|&p| owner[p] == c).collect();
                let cost = |candidate: usize| members.iter().map(|&p| d(candidate, p)).sum::<f64>();
                let mut best = *medoid;
                let mut best_cost = cost(best);
                for &candidate in &members {
                    let candidate_cost = cost(candidate);
                    if candidate_cost < best_cost {
                        best = candidate;
                        best_cost = candidate_cost;
                    }
                }
                if best != *medoid {
                    *medoid = best;
                    moved = true;
                }
            }

            if !moved {
                break;
            }
        }

        tracing::debug!(k = self.k, iterations, "k-medoids complete");

        let ids = matrix.ids();
        let mut clusters: Vec<Vec<String>> = vec![Vec::new(); self.k];
        for (point, &c) in owner.iter().enumerate() {
            clusters[c].push(ids[point].clone());
        }
        let assignment = ClusterAssignment::from_clusters(clusters);
        let medoids = assignment
            .clusters()
            .iter()
            .map(|members| {
                medoids
                    .iter()
                    .map(|&m| &ids[m])
                    .find(|id| members.binary_search(*id).is_ok())
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        Ok(MedoidClustering {
            assignment,
            medoids,
            iterations,
        })
    }
}
