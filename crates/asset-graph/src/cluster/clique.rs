//! Maximal clique enumeration (Bron–Kerbosch with pivoting).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::graph::Graph;

/// All maximal cliques of a graph.
///
/// Cliques are sorted internally and ordered by size (largest first), then
/// lexicographically, so the first entry is the largest clique with the
/// lexicographically smallest member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliqueReport {
    cliques: Vec<Vec<String>>,
}

impl CliqueReport {
    /// Every maximal clique, in report order.
    #[must_use]
    pub fn cliques(&self) -> &[Vec<String>] {
        &self.cliques
    }

    /// The largest clique.
    #[must_use]
    pub fn largest(&self) -> &[String] {
        self.cliques.first().map_or(&[], Vec::as_slice)
    }

    /// Size of the largest clique.
    #[must_use]
    pub fn largest_size(&self) -> usize {
        self.largest().len()
    }

    /// Number of maximal cliques.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cliques.len()
    }

    /// Returns `true` if no clique was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cliques.is_empty()
    }
}

struct Search<'a> {
    neighbors: &'a [BTreeSet<usize>],
    found: Vec<Vec<usize>>,
}

impl Search<'_> {
    fn expand(&mut self, r: &mut Vec<usize>, mut p: BTreeSet<usize>, mut x: BTreeSet<usize>) {
        if p.is_empty() && x.is_empty() {
            self.found.push(r.clone());
            return;
        }

        // Pivot on the vertex covering most of P.
        let pivot = p
            .union(&x)
            .copied()
            .max_by_key(|&u| (p.intersection(&self.neighbors[u]).count(), std::cmp::Reverse(u)));
        let candidates: Vec<usize> = match pivot {
            Some(u) => p.difference(&self.neighbors[u]).copied().collect(),
            None => p.iter().copied().collect(),
        };

        for v in candidates {
            let nv = &self.neighbors[v];
            let next_p: BTreeSet<usize> = p.intersection(nv).copied().collect();
            let next_x: BTreeSet<usize> = x.intersection(nv).copied().collect();
            r.push(v);
            self.expand(r, next_p, next_x);
            r.pop();
            p.remove(&v);
            x.insert(v);
        }
    }
}

/// Enumerates every maximal clique of `graph`.
///
/// Isolated nodes are reported as single-node cliques.
///
/// # Errors
///
/// Returns `Error::EmptyGraph` if the graph has no edges.
///
/// # Example
///
/// ```
/// use asset_graph::cluster::maximal_cliques;
/// use asset_graph::graph::Graph;
/// use asset_graph::matrix::MatrixKind;
///
/// let graph = Graph::from_edges(
///     &["A", "B", "C", "D"],
///     MatrixKind::Similarity,
///     [("A", "B", 0.9), ("A", "C", 0.9), ("B", "C", 0.9), ("C", "D", 0.9)],
/// )
/// .unwrap();
///
/// let report = maximal_cliques(&graph).unwrap();
/// assert_eq!(report.largest(), ["A", "B", "C"]);
/// ```
pub fn maximal_cliques(graph: &Graph) -> Result<CliqueReport> {
    if graph.edge_count() == 0 {
        return Err(Error::EmptyGraph {
            operation: "maximal clique search",
        });
    }

    let (nodes, adjacency) = graph.sorted_adjacency();
    let neighbors: Vec<BTreeSet<usize>> = adjacency
        .iter()
        .map(|list| list.iter().map(|&(n, _)| n).collect())
        .collect();

    let mut search = Search {
        neighbors: &neighbors,
        found: Vec::new(),
    };
    search.expand(&mut Vec::new(), (0..nodes.len()).collect(), BTreeSet::new());

    // Node ranks follow identifier order, so sorting ranks sorts names.
    let mut ranked = search.found;
    for clique in &mut ranked {
        clique.sort_unstable();
    }
    ranked.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let cliques: Vec<Vec<String>> = ranked
        .into_iter()
        .map(|c| c.into_iter().map(|r| nodes[r].to_string()).collect())
        .collect();

    tracing::debug!(
        cliques = cliques.len(),
        largest = cliques.first().map_or(0, Vec::len),
        "maximal clique search complete"
    );
    Ok(CliqueReport { cliques })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixKind;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        Graph::from_edges(
            nodes,
            MatrixKind::Similarity,
            edges.iter().map(|&(a, b)| (a, b, 1.0)),
        )
        .unwrap()
    }

    fn names(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_empty_graph_fails() {
        let g = graph(&["A", "B"], &[]);
        assert_eq!(
            maximal_cliques(&g).unwrap_err(),
            Error::EmptyGraph {
                operation: "maximal clique search"
            }
        );
    }

    #[test]
    fn test_triangle_plus_tail() {
        let g = graph(
            &["D", "C", "B", "A", "E"],
            &[("A", "B"), ("B", "C"), ("A", "C"), ("C", "D")],
        );
        let report = maximal_cliques(&g).unwrap();
        assert_eq!(
            report.cliques(),
            &[names(&["A", "B", "C"]), names(&["C", "D"]), names(&["E"])]
        );
        assert_eq!(report.largest_size(), 3);
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        let g = graph(
            &["A", "B", "C", "X", "Y", "Z"],
            &[("X", "Y"), ("Y", "Z"), ("X", "Z"), ("A", "B"), ("B", "C"), ("A", "C")],
        );
        let report = maximal_cliques(&g).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.largest(), names(&["A", "B", "C"]).as_slice());
    }

    #[test]
    fn test_complete_graph_is_one_clique() {
        let ids = ["A", "B", "C", "D", "E"];
        let mut edges = Vec::new();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                edges.push((*a, *b));
            }
        }
        let report = maximal_cliques(&graph(&ids, &edges)).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.largest(), names(&ids).as_slice());
    }

    #[test]
    fn test_every_clique_is_maximal() {
        // Square with one diagonal: cliques {A,B,C} and {A,C,D}.
        let g = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A"), ("A", "C")],
        );
        let report = maximal_cliques(&g).unwrap();
        assert_eq!(
            report.cliques(),
            &[names(&["A", "B", "C"]), names(&["A", "C", "D"])]
        );
    }
}
