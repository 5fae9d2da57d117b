//! Clustering over graphs and distance matrices.
//!
//! # Algorithms
//!
//! | Algorithm | Input | Output |
//! |-----------|-------|--------|
//! | [`maximal_cliques`] | [`Graph`](crate::graph::Graph) | [`CliqueReport`] |
//! | [`GreedyModularity`] | [`Graph`](crate::graph::Graph) | [`ClusterAssignment`] |
//! | [`hierarchical_average`] | [`DistanceMatrix`](crate::matrix::DistanceMatrix) | [`ClusterAssignment`] |
//! | [`KMedoids`] | [`DistanceMatrix`](crate::matrix::DistanceMatrix) | [`MedoidClustering`] |
//! | [`Dbscan`] | [`DistanceMatrix`](crate::matrix::DistanceMatrix) | [`ClusterAssignment`] with noise |
//!
//! Partition outputs are canonical: clusters are ordered by size (largest
//! first), then by their smallest member, and members are sorted. Label `k`
//! is the position of a cluster in that order, so two runs over the same
//! input produce identical labels.

use std::collections::HashMap;

use serde::Serialize;

pub mod clique;
pub mod dbscan;
pub mod hierarchical;
pub mod kmedoids;
pub mod modularity;

pub use clique::{maximal_cliques, CliqueReport};
pub use dbscan::Dbscan;
pub use hierarchical::hierarchical_average;
pub use kmedoids::{KMedoids, MedoidClustering};
pub use modularity::{modularity, GreedyModularity};

/// A partition of identifiers into labelled clusters.
///
/// DBSCAN may leave some identifiers unassigned; they are listed in
/// [`noise`](Self::noise) and have no label. Every other algorithm produces a
/// total partition with empty noise.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ClusterAssignment {
    clusters: Vec<Vec<String>>,
    noise: Vec<String>,
}

impl ClusterAssignment {
    /// Builds a canonical assignment from unordered clusters.
    ///
    /// Empty clusters are dropped.
    #[must_use]
    pub fn from_clusters(clusters: Vec<Vec<String>>) -> Self {
        let mut clusters: Vec<Vec<String>> = clusters
            .into_iter()
            .filter(|c| !c.is_empty())
            .map(|mut c| {
                c.sort();
                c
            })
            .collect();
        clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
        Self {
            clusters,
            noise: Vec::new(),
        }
    }

    /// Attaches identifiers that belong to no cluster.
    #[must_use]
    pub fn with_noise(mut self, mut noise: Vec<String>) -> Self {
        noise.sort();
        self.noise = noise;
        self
    }

    /// Clusters in label order.
    #[must_use]
    pub fn clusters(&self) -> &[Vec<String>] {
        &self.clusters
    }

    /// Unassigned identifiers, sorted.
    #[must_use]
    pub fn noise(&self) -> &[String] {
        &self.noise
    }

    /// Number of clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Returns `true` if there are no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Label of `id`, or `None` for noise and unknown identifiers.
    #[must_use]
    pub fn label_of(&self, id: &str) -> Option<usize> {
        self.clusters
            .iter()
            .position(|c| c.binary_search_by(|m| m.as_str().cmp(id)).is_ok())
    }

    /// `(id, label)` for every clustered identifier, sorted by identifier.
    #[must_use]
    pub fn labels(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = self
            .clusters
            .iter()
            .enumerate()
            .flat_map(|(label, members)| members.iter().map(move |m| (m.as_str(), label)))
            .collect();
        out.sort_unstable();
        out
    }

    /// Map from identifier to label.
    #[must_use]
    pub fn label_map(&self) -> HashMap<&str, usize> {
        self.labels().into_iter().collect()
    }
}
