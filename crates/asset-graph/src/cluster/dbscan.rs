//! Density-based clustering (DBSCAN) over a distance matrix.

use serde::{Deserialize, Serialize};

use super::ClusterAssignment;
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

/// DBSCAN configuration.
///
/// A point is a core point when at least `min_points` points (itself
/// included) lie within `eps`. Clusters grow from core points through their
/// neighbourhoods; points reachable from no core point are noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dbscan {
    /// Neighbourhood radius (inclusive).
    pub eps: f64,
    /// Minimum neighbourhood size for a core point.
    pub min_points: usize,
}

impl Dbscan {
    /// Creates a configuration.
    #[must_use]
    pub const fn new(eps: f64, min_points: usize) -> Self {
        Self { eps, min_points }
    }

    /// Clusters the identifiers of `matrix`.
    ///
    /// Similarities are read as distances `1 - s`; missing entries are never
    /// within `eps`. Points are visited in identifier order, so a border
    /// point reachable from two clusters joins the one discovered first.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for a negative or non-finite `eps`
    /// or `min_points == 0`.
    pub fn fit(&self, matrix: &DistanceMatrix) -> Result<ClusterAssignment> {
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(Error::invalid_parameter(
                "eps",
                self.eps,
                "must be finite and non-negative",
            ));
        }
        if self.min_points == 0 {
            return Err(Error::invalid_parameter(
                "min_points",
                self.min_points,
                "must be at least 1",
            ));
        }

        let ids = matrix.ids();
        let n = ids.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| ids[a].cmp(&ids[b]));

        let neighbourhood = |p: usize| -> Vec<usize> {
            order
                .iter()
                .copied()
                .filter(|&q| matrix.distance_at(p, q).is_some_and(|d| d <= self.eps))
                .collect()
        };

        let mut label: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut clusters: Vec<Vec<usize>> = Vec::new();

        for &p in &order {
            if visited[p] {
                continue;
            }
            visited[p] = true;
            let seeds = neighbourhood(p);
            if seeds.len() < self.min_points {
                continue;
            }

            let c = clusters.len();
            clusters.push(vec![p]);
            label[p] = Some(c);

            let mut queue = seeds;
            let mut head = 0;
            while head < queue.len() {
                let q = queue[head];
                head += 1;
                if label[q].is_none() {
                    label[q] = Some(c);
                    clusters[c].push(q);
                }
                if visited[q] {
                    continue;
                }
                visited[q] = true;
                let reach = neighbourhood(q);
                if reach.len() >= self.min_points {
                    queue.extend(reach);
                }
            }
        }

        let noise: Vec<String> = (0..n)
            .filter(|&p| label[p].is_none())
            .map(|p| ids[p].clone())
            .collect();
        tracing::debug!(
            clusters = clusters.len(),
            noise = noise.len(),
            "dbscan complete"
        );

        Ok(ClusterAssignment::from_clusters(
            clusters
                .into_iter()
                .map(|c| c.into_iter().map(|p| ids[p].clone()).collect())
                .collect(),
        )
        .with_noise(noise))
    }
}
