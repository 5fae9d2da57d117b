//! asset-graph-experiments: benchmark data and micro-experiments
//!
//! This crate holds seeded synthetic data generators and the criterion
//! experiments (E01-E02) that size the DTW band and the parallel matrix
//! threshold.
//!
//! # Modules
//!
//! - [`data`] - Seeded price series and correlated basket stores
//!
//! # Example
//!
//! ```
//! use asset_graph_experiments::data::{generate_basket_store, generate_random_walk};
//!
//! let prices = generate_random_walk(500, 42);
//! assert_eq!(prices.len(), 500);
//!
//! let store = generate_basket_store(3, 4, 250, 42).unwrap();
//! assert_eq!(store.len(), 12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod data;
