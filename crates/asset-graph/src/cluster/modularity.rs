//! Greedy modularity communities (Clauset–Newman–Moore) and the modularity
//! score of a partition.
//!
//! For total edge weight `W`, node strength `k_i` and resolution `γ`:
//!
//! ```text
//! Q = Σ_c [ L_c / W − γ (S_c / 2W)² ]
//! ```
//!
//! where `L_c` is the weight inside community `c` and `S_c` the summed
//! strength of its members. Merging communities `i` and `j` joined by weight
//! `w_ij` changes `Q` by `w_ij / W − 2γ a_i a_j` with `a = S / 2W`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::ClusterAssignment;
use crate::error::{Error, Result};
use crate::graph::Graph;

/// Merge gains within this distance are treated as ties.
const GAIN_TOLERANCE: f64 = 1e-12;

/// Greedy agglomerative modularity maximisation.
///
/// Starts from singletons and repeatedly merges the pair of adjacent
/// communities with the largest modularity gain until no merge has a positive
/// gain. Ties go to the pair whose smallest member identifiers sort first.
///
/// # Example
///
/// ```
/// use asset_graph::cluster::GreedyModularity;
/// use asset_graph::graph::Graph;
/// use asset_graph::matrix::MatrixKind;
///
/// let graph = Graph::from_edges(
///     &["A", "B", "C", "D", "E", "F"],
///     MatrixKind::Similarity,
///     [
///         ("A", "B", 1.0), ("B", "C", 1.0), ("A", "C", 1.0),
///         ("D", "E", 1.0), ("E", "F", 1.0), ("D", "F", 1.0),
///         ("C", "D", 1.0),
///     ],
/// )
/// .unwrap();
///
/// let communities = GreedyModularity::new().detect(&graph).unwrap();
/// assert_eq!(communities.cluster_count(), 2);
/// assert_eq!(communities.label_of("A"), communities.label_of("C"));
/// assert_ne!(communities.label_of("C"), communities.label_of("D"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyModularity {
    /// Resolution `γ`; values above 1 favour smaller communities.
    pub resolution: f64,
    /// Use edge weights; otherwise every edge counts as 1.
    pub weighted: bool,
}

impl Default for GreedyModularity {
    fn default() -> Self {
        Self::new()
    }
}

impl GreedyModularity {
    /// Weighted detection at resolution 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolution: 1.0,
            weighted: true,
        }
    }

    /// Sets the resolution.
    #[must_use]
    pub const fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Uses or ignores edge weights.
    #[must_use]
    pub const fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution < 0.0 {
            return Err(Error::invalid_parameter(
                "resolution",
                self.resolution,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Partitions the nodes of `graph` into communities.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyGraph` if the graph has no edges.
    /// - `Error::InvalidParameter` for a bad resolution or a negative or
    ///   non-finite edge weight.
    pub fn detect(&self, graph: &Graph) -> Result<ClusterAssignment> {
        self.validate()?;
        if graph.edge_count() == 0 {
            return Err(Error::EmptyGraph {
                operation: "greedy modularity",
            });
        }

        let weights = WeightedAdjacency::new(graph, self.weighted)?;
        let n = weights.nodes.len();
        let mut members: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();

        if weights.total <= 0.0 {
            tracing::debug!("all edge weights are zero, keeping singletons");
            return Ok(weights.assignment(&members));
        }

        let two_w = 2.0 * weights.total;
        let mut strength: Vec<f64> = weights.strength.iter().map(|k| k / two_w).collect();
        // links[c] maps neighbouring community -> summed edge weight between them.
        let mut links: Vec<BTreeMap<usize, f64>> = weights
            .adjacency
            .iter()
            .map(|list| list.iter().copied().collect())
            .collect();

        let mut merges = 0_usize;
        loop {
            // Community ids are the smallest member rank, so scanning ids in
            // ascending order and keeping the first best resolves ties.
            let mut best: Option<(f64, usize, usize)> = None;
            for (i, neighbours) in links.iter().enumerate() {
                for (&j, &w) in neighbours.range(i + 1..) {
                    let gain = w / weights.total - 2.0 * self.resolution * strength[i] * strength[j];
                    if best.map_or(true, |(g, _, _)| gain > g + GAIN_TOLERANCE) {
                        best = Some((gain, i, j));
                    }
                }
            }

            let Some((gain, keep, absorb)) = best else {
                break;
            };
            if gain <= 0.0 {
                break;
            }

            // Fold `absorb` into `keep`.
            let absorbed_links = std::mem::take(&mut links[absorb]);
            for (other, w) in absorbed_links {
                links[other].remove(&absorb);
                if other != keep {
                    *links[keep].entry(other).or_insert(0.0) += w;
                    *links[other].entry(keep).or_insert(0.0) += w;
                }
            }
            links[keep].remove(&absorb);
            strength[keep] += strength[absorb];
            strength[absorb] = 0.0;

            let moved = members[absorb].take().unwrap_or_default();
            if let Some(target) = members[keep].as_mut() {
                target.extend(moved);
            }
            merges += 1;
            tracing::trace!(keep, absorb, gain, "merged communities");
        }

        tracing::debug!(merges, nodes = n, "greedy modularity complete");
        Ok(weights.assignment(&members))
    }
}

/// Node strengths and adjacency over id-sorted node ranks.
struct WeightedAdjacency<'a> {
    nodes: Vec<&'a str>,
    adjacency: Vec<Vec<(usize, f64)>>,
    strength: Vec<f64>,
    total: f64,
}

impl<'a> WeightedAdjacency<'a> {
    fn new(graph: &'a Graph, weighted: bool) -> Result<Self> {
        let (nodes, mut adjacency) = graph.sorted_adjacency();
        for list in &mut adjacency {
            for (_, w) in list.iter_mut() {
                if !weighted {
                    *w = 1.0;
                } else if !w.is_finite() || *w < 0.0 {
                    return Err(Error::invalid_parameter(
                        "weight",
                        *w,
                        "modularity requires finite non-negative edge weights",
                    ));
                }
            }
        }
        let strength: Vec<f64> = adjacency
            .iter()
            .map(|list| list.iter().map(|&(_, w)| w).sum())
            .collect();
        // Each edge appears in two adjacency lists.
        let total = strength.iter().sum::<f64>() / 2.0;
        Ok(Self {
            nodes,
            adjacency,
            strength,
            total,
        })
    }

    fn assignment(&self, members: &[Option<Vec<usize>>]) -> ClusterAssignment {
        ClusterAssignment::from_clusters(
            members
                .iter()
                .flatten()
                .map(|c| c.iter().map(|&r| self.nodes[r].to_string()).collect())
                .collect(),
        )
    }
}

/// Modularity of a partition of `graph`.
///
/// Graph nodes missing from `assignment` (including DBSCAN noise) count as
/// singleton communities.
///
/// # Errors
///
/// - `Error::EmptyGraph` if the graph has no edges.
/// - `Error::UnknownSeries` if the assignment names a node not in the graph.
/// - `Error::InvalidParameter` for a bad resolution or edge weight.
pub fn modularity(graph: &Graph, assignment: &ClusterAssignment, resolution: f64) -> Result<f64> {
    GreedyModularity::new().resolution(resolution).validate()?;
    if graph.edge_count() == 0 {
        return Err(Error::EmptyGraph {
            operation: "modularity",
        });
    }

    let weights = WeightedAdjacency::new(graph, true)?;
    let rank: HashMap<&str, usize> = weights
        .nodes
        .iter()
        .enumerate()
        .map(|(r, id)| (*id, r))
        .collect();

    let mut community = vec![usize::MAX; weights.nodes.len()];
    for (label, members) in assignment.clusters().iter().enumerate() {
        for id in members {
            let r = rank
                .get(id.as_str())
                .ok_or_else(|| Error::UnknownSeries { id: id.clone() })?;
            community[*r] = label;
        }
    }
    let mut next = assignment.cluster_count();
    for c in &mut community {
        if *c == usize::MAX {
            *c = next;
            next += 1;
        }
    }

    if weights.total <= 0.0 {
        return Ok(0.0);
    }

    let mut internal = vec![0.0; next];
    let mut degree = vec![0.0; next];
    for (i, list) in weights.adjacency.iter().enumerate() {
        degree[community[i]] += weights.strength[i];
        for &(j, w) in list {
            if community[i] == community[j] {
                // Counted from both endpoints.
                internal[community[i]] += w / 2.0;
            }
        }
    }

    let two_w = 2.0 * weights.total;
    Ok(internal
        .iter()
        .zip(&degree)
        .map(|(l, s)| l / weights.total - resolution * (s / two_w).powi(2))
        .sum())
}
