//! Synthetic market data for reproducible benchmarks.
//!
//! Prices compound a shared market factor plus per-asset noise, so assets
//! driven by the same factor move together. Every generator takes a seed;
//! the same seed always produces identical output.
//!
//! # Example Usage
//!
//! ```
//! use asset_graph_experiments::data::{generate_basket_store, generate_random_walk};
//!
//! let prices = generate_random_walk(1000, 42);
//! assert_eq!(prices.len(), 1000);
//!
//! let store = generate_basket_store(2, 4, 250, 42).unwrap();
//! assert_eq!(store.len(), 8);
//! ```

use asset_graph::series::{Series, SeriesStore};
use asset_graph::Result;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Starting price of every generated path.
const START_PRICE: f64 = 100.0;

/// Standard deviation of the per-step market factor.
const FACTOR_VOLATILITY: f64 = 0.02;

/// Standard deviation of the per-asset noise added on top of the factor.
const IDIOSYNCRATIC_VOLATILITY: f64 = 0.005;

/// Prices never fall below this floor.
const PRICE_FLOOR: f64 = 0.01;

/// Draws one standard normal sample with the Box-Muller transform.
fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    // Shift into (0, 1] so the logarithm stays finite.
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Draws `n - 1` factor returns; the first sample of a path has none.
fn market_factor(rng: &mut ChaCha8Rng, n: usize) -> Vec<f64> {
    (1..n)
        .map(|_| FACTOR_VOLATILITY * standard_normal(rng))
        .collect()
}

/// Compounds `factor` plus noise of scale `noise` into a price path of
/// `factor.len() + 1` samples.
fn price_path(rng: &mut ChaCha8Rng, factor: &[f64], noise: f64) -> Vec<f64> {
    let mut price = START_PRICE;
    std::iter::once(price)
        .chain(factor.iter().map(|f| {
            let step = if noise > 0.0 {
                f + noise * standard_normal(rng)
            } else {
                *f
            };
            price = (price * (1.0 + step)).max(PRICE_FLOOR);
            price
        }))
        .collect()
}

// ============================================================================
// Single Asset
// ============================================================================

/// Generates one asset's price path: the market factor alone, no noise.
///
/// # Example
///
/// ```
/// use asset_graph_experiments::data::generate_random_walk;
///
/// let prices1 = generate_random_walk(100, 42);
/// let prices2 = generate_random_walk(100, 42);
/// assert_eq!(prices1, prices2);
///
/// let prices3 = generate_random_walk(100, 123);
/// assert_ne!(prices1, prices3);
/// ```
#[must_use]
pub fn generate_random_walk(n: usize, seed: u64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let factor = market_factor(&mut rng, n);
    price_path(&mut rng, &factor, 0.0)
}

// ============================================================================
// Basket Store
// ============================================================================

/// Generates `baskets * per_basket` series of length `n`.
///
/// Members of one basket share a market factor and add their own
/// idiosyncratic noise, so they correlate strongly within the basket and
/// weakly across baskets. Series are named `B{basket}_{member}`.
///
/// # Errors
///
/// Returns `Error::InvalidInput` when `n` is zero.
///
/// # Example
///
/// ```
/// use asset_graph_experiments::data::generate_basket_store;
///
/// let store = generate_basket_store(2, 3, 100, 7).unwrap();
/// let ids: Vec<&str> = store.ids().collect();
/// assert_eq!(ids, ["B0_0", "B0_1", "B0_2", "B1_0", "B1_1", "B1_2"]);
/// ```
pub fn generate_basket_store(
    baskets: usize,
    per_basket: usize,
    n: usize,
    seed: u64,
) -> Result<SeriesStore> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut store = SeriesStore::with_capacity(baskets * per_basket);

    for basket in 0..baskets {
        let factor = market_factor(&mut rng, n);
        for member in 0..per_basket {
            let values = if n == 0 {
                Vec::new()
            } else {
                price_path(&mut rng, &factor, IDIOSYNCRATIC_VOLATILITY)
            };
            store.insert(Series::new(format!("B{basket}_{member}"), values)?)?;
        }
    }

    Ok(store)
}
