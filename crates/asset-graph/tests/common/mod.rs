//! Shared test utilities for asset-graph tests.

use asset_graph::series::{Series, SeriesStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Standard epsilon for high-precision comparisons.
#[allow(dead_code)]
pub const EPSILON: f64 = 1e-10;

/// Builds a store from `(id, values)` pairs.
#[allow(dead_code)]
pub fn store(series: &[(&str, &[f64])]) -> SeriesStore {
    SeriesStore::from_series(
        series
            .iter()
            .map(|(id, values)| Series::new(*id, values.to_vec()).unwrap()),
    )
    .unwrap()
}

/// The three-series store used by the DTW scenarios.
#[allow(dead_code)]
pub fn abc_store() -> SeriesStore {
    store(&[
        ("A", &[1.0, 2.0, 3.0, 4.0]),
        ("B", &[1.0, 2.0, 3.0, 4.0]),
        ("C", &[4.0, 3.0, 2.0, 1.0]),
    ])
}

/// Seeded random walk starting at 100.
#[allow(dead_code)]
pub fn walk(seed: u64, len: usize) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut price = 100.0;
    (0..len)
        .map(|_| {
            price += rng.random::<f64>() - 0.5;
            price
        })
        .collect()
}

/// Installs a test-writer tracing subscriber once per test binary.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
