//! Property-based tests using proptest.
//!
//! These tests verify invariants that must hold for all valid inputs:
//! metric axioms of DTW, bounds of the correlation engines, order
//! independence of the matrix builder and the shape of selected graphs.

use proptest::prelude::*;

use asset_graph::prelude::*;
use asset_graph::utils::pair_count;

// ==================== Test Data Generators ====================

/// Generate a random price series (all positive values)
fn arb_price_series(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, min_len..=max_len)
}

/// Generate two price series of the same length
fn arb_aligned_pair(min_len: usize, max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (min_len..=max_len).prop_flat_map(|len| {
        (
            prop::collection::vec(1.0..1000.0_f64, len),
            prop::collection::vec(1.0..1000.0_f64, len),
        )
    })
}

/// Generate a store of `2..=max_series` equal-length series named S0, S1, ...
fn arb_store(max_series: usize, len: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(1.0..1000.0_f64, len), 2..=max_series)
}

fn to_store(data: &[Vec<f64>]) -> SeriesStore {
    SeriesStore::from_series(
        data.iter()
            .enumerate()
            .map(|(i, values)| Series::new(format!("S{i}"), values.clone()).unwrap()),
    )
    .unwrap()
}

// ==================== DTW Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// DTW is symmetric
    #[test]
    fn prop_dtw_symmetric(a in arb_price_series(1, 40), b in arb_price_series(1, 40)) {
        let opts = DtwOptions::new();
        let ab = dtw_distance(&a, &b, &opts).unwrap();
        let ba = dtw_distance(&b, &a, &opts).unwrap();
        prop_assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0));
    }

    /// DTW is symmetric under a band
    #[test]
    fn prop_dtw_banded_symmetric(
        a in arb_price_series(1, 40),
        b in arb_price_series(1, 40),
        band in 1usize..10,
    ) {
        let opts = DtwOptions::new().with_band_width(band);
        let ab = dtw_distance(&a, &b, &opts).unwrap();
        let ba = dtw_distance(&b, &a, &opts).unwrap();
        prop_assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0));
    }

    /// DTW is non-negative and zero against itself
    #[test]
    fn prop_dtw_non_negative_and_reflexive(a in arb_price_series(1, 40), b in arb_price_series(1, 40)) {
        let opts = DtwOptions::new();
        prop_assert!(dtw_distance(&a, &b, &opts).unwrap() >= 0.0);
        prop_assert_eq!(dtw_distance(&a, &a, &opts).unwrap(), 0.0);
    }

    /// A band can only remove warping paths, never add cheaper ones
    #[test]
    fn prop_band_never_lowers_distance(
        a in arb_price_series(1, 40),
        b in arb_price_series(1, 40),
        band in 1usize..10,
    ) {
        let full = dtw_distance(&a, &b, &DtwOptions::new()).unwrap();
        let banded = dtw_distance(&a, &b, &DtwOptions::new().with_band_width(band)).unwrap();
        prop_assert!(banded + 1e-9 * full.max(1.0) >= full);
    }

    /// The warping path is monotone, contiguous and spans both sequences
    #[test]
    fn prop_path_is_valid(a in arb_price_series(1, 30), b in arb_price_series(1, 30)) {
        let path = dtw_path(&a, &b, &DtwOptions::new()).unwrap();
        prop_assert_eq!(path.steps.first().copied(), Some((0, 0)));
        prop_assert_eq!(path.steps.last().copied(), Some((a.len() - 1, b.len() - 1)));
        for step in path.steps.windows(2) {
            let (i0, j0) = step[0];
            let (i1, j1) = step[1];
            prop_assert!(i1 >= i0 && j1 >= j0);
            prop_assert!(i1 - i0 <= 1 && j1 - j0 <= 1);
            prop_assert!((i1, j1) != (i0, j0));
        }
        let distance = dtw_distance(&a, &b, &DtwOptions::new()).unwrap();
        prop_assert!((path.cost - distance).abs() <= 1e-9 * distance.max(1.0));
    }
}

// ==================== Correlation Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Pearson is symmetric and bounded
    #[test]
    fn prop_pearson_symmetric_and_bounded((a, b) in arb_aligned_pair(3, 60)) {
        let ab = pearson(&a, &b).unwrap();
        let ba = pearson(&b, &a).unwrap();
        if ab.is_nan() {
            prop_assert!(ba.is_nan());
        } else {
            prop_assert!((ab - ba).abs() < 1e-12);
            prop_assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&ab));
        }
    }

    /// A series correlates perfectly with itself
    #[test]
    fn prop_pearson_self_is_one(a in arb_price_series(3, 60)) {
        let r = pearson(&a, &a).unwrap();
        prop_assert!(r.is_nan() || (r - 1.0).abs() < 1e-9);
    }

    /// Spearman is bounded and invariant under monotone transforms
    #[test]
    fn prop_spearman_rank_invariant((a, b) in arb_aligned_pair(3, 60)) {
        let rho = spearman(&a, &b).unwrap();
        let logged: Vec<f64> = a.iter().map(|v| v.ln()).collect();
        let rho_logged = spearman(&logged, &b).unwrap();
        if rho.is_nan() {
            prop_assert!(rho_logged.is_nan());
        } else {
            prop_assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&rho));
            prop_assert!((rho - rho_logged).abs() < 1e-9);
        }
    }
}

// ==================== Matrix Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Matrix entries do not depend on the order series were added
    #[test]
    fn prop_matrix_order_independent(data in arb_store(6, 12)) {
        let forward = to_store(&data);
        let reversed = SeriesStore::from_series(forward.iter().rev().cloned()).unwrap();
        let metric = DtwMetric::new(DtwOptions::new().with_band_width(3));

        let m1 = build_matrix(&forward, &metric).unwrap();
        let m2 = build_matrix(&reversed, &metric).unwrap();
        for a in forward.ids() {
            for b in forward.ids() {
                prop_assert_eq!(m1.get(a, b).unwrap(), m2.get(a, b).unwrap());
            }
        }
    }

    /// Correlation matrices are symmetric with a unit diagonal
    #[test]
    fn prop_correlation_matrix_symmetric(data in arb_store(6, 12)) {
        let s = to_store(&data);
        let m = build_matrix(&s, &CorrelationMetric::new(CorrelationMethod::Spearman)).unwrap();
        for a in s.ids() {
            prop_assert_eq!(m.get(a, a).unwrap(), Some(1.0));
            for b in s.ids() {
                let ab = m.get(a, b).unwrap();
                let ba = m.get(b, a).unwrap();
                prop_assert!(ab == ba || ab.is_some_and(f64::is_nan) && ba.is_some_and(f64::is_nan));
            }
        }
    }
}

// ==================== Graph Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Top-fraction selection keeps floor(fraction * pairs) edges
    #[test]
    fn prop_top_fraction_edge_count(data in arb_store(8, 10), fraction in 0.0..=1.0_f64) {
        let s = to_store(&data);
        let m = build_matrix(&s, &DtwMetric::new(DtwOptions::new())).unwrap();
        let pairs = pair_count(s.len());

        let none = build_graph(&m, EdgeSelection::TopFraction { fraction: 0.0 }).unwrap();
        prop_assert_eq!(none.edge_count(), 0);
        prop_assert_eq!(none.node_count(), s.len());

        let all = build_graph(&m, EdgeSelection::TopFraction { fraction: 1.0 }).unwrap();
        prop_assert_eq!(all.edge_count(), pairs);

        let some = build_graph(&m, EdgeSelection::TopFraction { fraction }).unwrap();
        prop_assert!(some.edge_count() <= pairs);
        prop_assert!(some.edge_count() >= none.edge_count());
    }

    /// Every selected edge passes the threshold
    #[test]
    fn prop_threshold_edges_pass(data in arb_store(8, 10), cut in 0.0..5000.0_f64) {
        let s = to_store(&data);
        let m = build_matrix(&s, &DtwMetric::new(DtwOptions::new())).unwrap();
        let g = build_graph(&m, EdgeSelection::Threshold { value: cut }).unwrap();
        for edge in g.edges() {
            prop_assert!(edge.weight <= cut);
        }
        let expected = m.sorted_pairs().iter().filter(|p| p.value.is_some_and(|v| v <= cut)).count();
        prop_assert_eq!(g.edge_count(), expected);
    }
}

// ==================== Clustering Properties ====================

const NODES: [&str; 6] = ["N0", "N1", "N2", "N3", "N4", "N5"];

/// Generate a weighted edge list over `NODES` in random order; weights are
/// drawn from a few levels so merge gains tie often.
fn arb_shuffled_edges() -> impl Strategy<Value = (Vec<(usize, usize, f64)>, Vec<(usize, usize, f64)>)> {
    let pairs: Vec<(usize, usize)> = (0..NODES.len())
        .flat_map(|i| (i + 1..NODES.len()).map(move |j| (i, j)))
        .collect();
    prop::collection::vec(prop::option::of(prop::sample::select(vec![1.0, 2.0, 3.0])), pairs.len())
        .prop_map(move |weights| {
            pairs
                .iter()
                .zip(weights)
                .filter_map(|(&(i, j), w)| w.map(|w| (i, j, w)))
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|edges| (Just(edges.clone()), Just(edges).prop_shuffle()))
}

fn edge_graph(edges: &[(usize, usize, f64)], flip: bool) -> Graph {
    let named = edges.iter().map(|&(i, j, w)| {
        if flip {
            (NODES[j], NODES[i], w)
        } else {
            (NODES[i], NODES[j], w)
        }
    });
    Graph::from_edges(&NODES, MatrixKind::Similarity, named).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every reported clique is complete in the graph
    #[test]
    fn prop_cliques_are_complete(data in arb_store(8, 10), fraction in 0.2..=1.0_f64) {
        let s = to_store(&data);
        let m = build_matrix(&s, &DtwMetric::new(DtwOptions::new())).unwrap();
        let g = build_graph(&m, EdgeSelection::TopFraction { fraction }).unwrap();
        prop_assume!(g.edge_count() > 0);

        let report = maximal_cliques(&g).unwrap();
        for clique in report.cliques() {
            for (i, a) in clique.iter().enumerate() {
                for b in &clique[i + 1..] {
                    prop_assert!(g.weight(a, b).unwrap().is_some());
                }
            }
        }
        prop_assert_eq!(report.largest().len(), report.largest_size());
    }

    /// Greedy modularity does not depend on edge insertion order or direction
    #[test]
    fn prop_modularity_edge_order_invariant((edges, shuffled) in arb_shuffled_edges()) {
        prop_assume!(!edges.is_empty());
        let canonical = GreedyModularity::new().detect(&edge_graph(&edges, false)).unwrap();
        let reordered = GreedyModularity::new().detect(&edge_graph(&shuffled, true)).unwrap();
        prop_assert_eq!(canonical, reordered);
    }

    /// Partitions cover every node exactly once
    #[test]
    fn prop_partitions_cover_nodes(data in arb_store(8, 10), k in 1usize..=8) {
        let s = to_store(&data);
        let m = build_matrix(&s, &DtwMetric::new(DtwOptions::new())).unwrap();
        let g = build_graph(&m, EdgeSelection::TopFraction { fraction: 0.5 }).unwrap();

        let mut partitions = vec![KMedoids::new(k.min(s.len())).fit(&m).unwrap().assignment];
        partitions.push(hierarchical_average(&m, k.min(s.len())).unwrap());
        if g.edge_count() > 0 {
            partitions.push(GreedyModularity::new().detect(&g).unwrap());
        }

        for assignment in partitions {
            let mut seen: Vec<&str> = assignment
                .clusters()
                .iter()
                .flatten()
                .map(String::as_str)
                .collect();
            seen.sort_unstable();
            let mut ids: Vec<&str> = s.ids().collect();
            ids.sort_unstable();
            prop_assert_eq!(seen, ids);
        }
    }
}
