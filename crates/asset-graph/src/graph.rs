//! Weighted undirected graphs selected from a pairwise matrix.
//!
//! [`GraphBuilder`] turns a [`DistanceMatrix`] into a [`Graph`]: every matrix
//! identifier becomes a node, and an edge is kept for each pair accepted by
//! the [`EdgeSelection`] policy. Missing entries and non-finite values never
//! become edges.
//!
//! The graph is stored in a `petgraph` `UnGraph` with a side table from
//! identifier to node index. Queries return identifiers in sorted order so
//! downstream output is reproducible.
//!
//! # Example
//!
//! ```
//! use asset_graph::graph::{EdgeSelection, GraphBuilder};
//! use asset_graph::matrix::{DistanceMatrix, MatrixKind};
//!
//! let matrix = DistanceMatrix::from_pairs(
//!     ["X", "Y", "Z"],
//!     MatrixKind::Similarity,
//!     [("X", "Y", 0.95), ("X", "Z", 0.50), ("Y", "Z", 0.40)],
//! )
//! .unwrap();
//!
//! let graph = GraphBuilder::new(EdgeSelection::Threshold { value: 0.9 })
//!     .build(&matrix)
//!     .unwrap();
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.edge_count(), 1);
//! assert_eq!(graph.degree("Z").unwrap(), 0);
//! ```

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::{DistanceMatrix, MatrixKind};
use crate::utils::{pair_count, round_to_digits};

/// Guards `floor(fraction * pairs)` against representation error.
const FRACTION_EPSILON: f64 = 1e-9;

/// Policy deciding which matrix pairs become edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeSelection {
    /// Keep pairs whose value is `>= value` (similarity) or `<= value` (distance).
    Threshold {
        /// The cut-off.
        value: f64,
    },
    /// Keep the closest `floor(fraction * total_pairs)` pairs.
    TopFraction {
        /// Fraction of all pairs to keep, in `[0, 1]`.
        fraction: f64,
    },
}

impl EdgeSelection {
    /// Checks that the parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for a non-finite threshold or a
    /// fraction outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Threshold { value } if !value.is_finite() => Err(Error::invalid_parameter(
                "threshold",
                value,
                "must be finite",
            )),
            Self::TopFraction { fraction } if !(0.0..=1.0).contains(&fraction) => Err(
                Error::invalid_parameter("fraction", fraction, "must be within [0, 1]"),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for EdgeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Threshold { value } => write!(f, "threshold({value})"),
            Self::TopFraction { fraction } => write!(f, "top_fraction({fraction})"),
        }
    }
}

/// An undirected edge in canonical form (`left < right`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    /// Lexicographically smaller endpoint.
    pub left: String,
    /// Lexicographically larger endpoint.
    pub right: String,
    /// Edge weight.
    pub weight: f64,
}

/// Immutable weighted undirected graph without self-loops or parallel edges.
#[derive(Debug, Clone)]
pub struct Graph {
    graph: UnGraph<String, f64>,
    node_indices: HashMap<String, NodeIndex>,
    kind: MatrixKind,
}

impl Graph {
    fn with_nodes<S: AsRef<str>>(nodes: &[S], kind: MatrixKind) -> Result<Self> {
        let mut graph = UnGraph::with_capacity(nodes.len(), 0);
        let mut node_indices = HashMap::with_capacity(nodes.len());
        for id in nodes {
            let id = id.as_ref();
            if node_indices.contains_key(id) {
                return Err(Error::DuplicateSeries { id: id.to_string() });
            }
            let idx = graph.add_node(id.to_string());
            node_indices.insert(id.to_string(), idx);
        }
        Ok(Self {
            graph,
            node_indices,
            kind,
        })
    }

    fn node_index(&self, id: &str) -> Result<NodeIndex> {
        self.node_indices
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownSeries { id: id.to_string() })
    }

    /// Builds a graph from explicit nodes and weighted edges.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateSeries` for a repeated node.
    /// - `Error::UnknownSeries` for an edge endpoint that is not a node.
    /// - `Error::InvalidParameter` for a self-loop or a repeated edge.
    pub fn from_edges<S, E, A, B>(nodes: &[S], kind: MatrixKind, edges: E) -> Result<Self>
    where
        S: AsRef<str>,
        E: IntoIterator<Item = (A, B, f64)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut graph = Self::with_nodes(nodes, kind)?;
        for (a, b, weight) in edges {
            let (a, b) = (a.as_ref(), b.as_ref());
            let ia = graph.node_index(a)?;
            let ib = graph.node_index(b)?;
            if ia == ib {
                return Err(Error::invalid_parameter("edge", a, "self-loops are not allowed"));
            }
            if graph.graph.find_edge(ia, ib).is_some() {
                return Err(Error::invalid_parameter(
                    "edge",
                    format!("{a}-{b}"),
                    "at most one edge per pair",
                ));
            }
            graph.graph.add_edge(ia, ib, weight);
        }
        Ok(graph)
    }

    /// Whether weights came from a distance or a similarity matrix.
    #[must_use]
    pub const fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if `id` is a node.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Node identifiers, sorted.
    #[must_use]
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.graph.node_weights().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes
    }

    /// Edges in canonical form, sorted by endpoints.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .graph
            .edge_references()
            .map(|e| {
                let a = &self.graph[e.source()];
                let b = &self.graph[e.target()];
                let (left, right) = if a <= b { (a, b) } else { (b, a) };
                Edge {
                    left: left.clone(),
                    right: right.clone(),
                    weight: *e.weight(),
                }
            })
            .collect();
        edges.sort_by(|x, y| (&x.left, &x.right).cmp(&(&y.left, &y.right)));
        edges
    }

    /// Weight of the edge between `a` and `b`, if any.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownSeries` if either identifier is not a node.
    pub fn weight(&self, a: &str, b: &str) -> Result<Option<f64>> {
        let ia = self.node_index(a)?;
        let ib = self.node_index(b)?;
        Ok(self
            .graph
            .find_edge(ia, ib)
            .and_then(|e| self.graph.edge_weight(e))
            .copied())
    }

    /// Neighbors of `id`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownSeries` if `id` is not a node.
    pub fn neighbors(&self, id: &str) -> Result<Vec<&str>> {
        let idx = self.node_index(id)?;
        let mut out: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        Ok(out)
    }

    /// Number of edges incident to `id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownSeries` if `id` is not a node.
    pub fn degree(&self, id: &str) -> Result<usize> {
        let idx = self.node_index(id)?;
        Ok(self.graph.edges(idx).count())
    }

    /// Connected components, each sorted, largest first; ties by first member.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<String>> {
        let mut sets = UnionFind::<usize>::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
        for idx in self.graph.node_indices() {
            groups
                .entry(sets.find(idx.index()))
                .or_default()
                .push(self.graph[idx].clone());
        }

        let mut components: Vec<Vec<String>> = groups
            .into_values()
            .map(|mut members| {
                members.sort();
                members
            })
            .collect();
        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        components
    }

    /// Sorted node identifiers with adjacency lists expressed as positions in
    /// that sorted order. Each list is sorted by neighbor position.
    pub(crate) fn sorted_adjacency(&self) -> (Vec<&str>, Vec<Vec<(usize, f64)>>) {
        let nodes = self.nodes();
        let rank: HashMap<&str, usize> = nodes.iter().enumerate().map(|(r, id)| (*id, r)).collect();
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in self.graph.edge_references() {
            let a = rank[self.graph[edge.source()].as_str()];
            let b = rank[self.graph[edge.target()].as_str()];
            adjacency[a].push((b, *edge.weight()));
            adjacency[b].push((a, *edge.weight()));
        }
        for list in &mut adjacency {
            list.sort_by_key(|&(n, _)| n);
        }
        (nodes, adjacency)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MatrixKind::Distance => "distance",
            MatrixKind::Similarity => "similarity",
        };
        writeln!(
            f,
            "graph ({kind}): {} nodes, {} edges",
            self.node_count(),
            self.edge_count()
        )?;
        writeln!(f, "nodes: {}", self.nodes().join(", "))?;
        for edge in self.edges() {
            writeln!(f, "{} -- {} [{}]", edge.left, edge.right, edge.weight)?;
        }
        Ok(())
    }
}

/// Builds a [`Graph`] from a matrix under an [`EdgeSelection`] policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphBuilder {
    /// Edge selection policy.
    pub selection: EdgeSelection,
    /// Round edge weights to this many decimal digits.
    #[serde(default)]
    pub round_digits: Option<u32>,
}

impl GraphBuilder {
    /// Creates a builder with no weight rounding.
    #[must_use]
    pub const fn new(selection: EdgeSelection) -> Self {
        Self {
            selection,
            round_digits: None,
        }
    }

    /// Rounds edge weights to `digits` decimal digits.
    ///
    /// Selection is decided on the unrounded values.
    #[must_use]
    pub const fn round_digits(mut self, digits: u32) -> Self {
        self.round_digits = Some(digits);
        self
    }

    /// Selects edges from `matrix`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if the selection parameter is out of
    /// range.
    pub fn build(&self, matrix: &DistanceMatrix) -> Result<Graph> {
        self.selection.validate()?;
        let kind = matrix.kind();
        let ids = matrix.ids();

        // Validity filter: only present, finite values are candidates.
        let mut candidates: Vec<(usize, usize, f64)> = matrix
            .pairs()
            .filter_map(|(i, j, v)| v.filter(|x| x.is_finite()).map(|x| (i, j, x)))
            .collect();

        match self.selection {
            EdgeSelection::Threshold { value } => {
                candidates.retain(|&(_, _, v)| kind.passes_threshold(v, value));
            }
            EdgeSelection::TopFraction { fraction } => {
                let canonical = |i: usize, j: usize| {
                    let (a, b) = (&ids[i], &ids[j]);
                    if a <= b {
                        (a, b)
                    } else {
                        (b, a)
                    }
                };
                candidates.sort_by(|x, y| {
                    kind.closer_first(x.2, y.2)
                        .then_with(|| canonical(x.0, x.1).cmp(&canonical(y.0, y.1)))
                });
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let keep = (fraction * pair_count(ids.len()) as f64 + FRACTION_EPSILON).floor() as usize;
                candidates.truncate(keep);
            }
        }

        let mut graph = Graph::with_nodes(ids, kind)?;
        for &(i, j, value) in &candidates {
            let weight = self.round_digits.map_or(value, |d| round_to_digits(value, d));
            let a = graph.node_index(&ids[i])?;
            let b = graph.node_index(&ids[j])?;
            graph.graph.add_edge(a, b, weight);
        }

        tracing::debug!(
            selection = %self.selection,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph built"
        );
        Ok(graph)
    }
}

/// Builds a graph with default (unrounded) weights.
///
/// # Errors
///
/// See [`GraphBuilder::build`].
pub fn build_graph(matrix: &DistanceMatrix, selection: EdgeSelection) -> Result<Graph> {
    GraphBuilder::new(selection).build(matrix)
}
