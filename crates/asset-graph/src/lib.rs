//! asset-graph: similarity graphs and clusters over financial time series
//!
//! This crate computes pairwise similarity between asset price histories,
//! turns the resulting matrix into a weighted relationship graph, and
//! partitions that graph into cliques and clusters of related assets.
//!
//! # Pipeline
//!
//! ```text
//! SeriesStore ──► MatrixBuilder (DTW | Pearson | Spearman) ──► DistanceMatrix
//!                                                                   │
//!                              GraphBuilder (threshold | top fraction)
//!                                                                   ▼
//!      cliques | greedy modularity | average linkage | k-medoids | DBSCAN
//! ```
//!
//! Every stage consumes an immutable artifact and produces a new one.
//!
//! # Features
//!
//! - **DTW**: Sakoe-Chiba banding, early abandoning, warping paths and
//!   separately named normalized distances
//! - **Correlation**: Pearson and Spearman with pairwise-complete samples
//! - **Parallelism**: pair evaluation on Rayon behind the `parallel` feature
//! - **Determinism**: canonical pair order, lexicographic tie-breaks and
//!   canonical cluster labels
//!
//! # Quick Start
//!
//! ```
//! use asset_graph::prelude::*;
//!
//! let store = SeriesStore::from_series([
//!     Series::new("A", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
//!     Series::new("B", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
//!     Series::new("C", vec![4.0, 3.0, 2.0, 1.0]).unwrap(),
//! ])
//! .unwrap();
//!
//! let matrix = build_matrix(&store, &DtwMetric::new(DtwOptions::new())).unwrap();
//! assert_eq!(matrix.get("A", "B").unwrap(), Some(0.0));
//!
//! let graph = build_graph(&matrix, EdgeSelection::TopFraction { fraction: 0.34 }).unwrap();
//! assert_eq!(graph.edge_count(), 1);
//!
//! let cliques = maximal_cliques(&graph).unwrap();
//! assert_eq!(cliques.largest(), ["A", "B"]);
//! ```
//!
//! # Error Handling
//!
//! Every fallible operation returns [`Result<T, Error>`]. Engines fail fast;
//! the matrix builder records failing pairs as missing entries unless it is
//! in strict mode:
//!
//! ```
//! use asset_graph::prelude::*;
//!
//! let empty: Vec<f64> = vec![];
//! assert!(dtw_distance(&empty, &[1.0], &DtwOptions::new()).is_err());
//! assert!(pearson(&[1.0, 2.0], &[1.0, 2.0, 3.0]).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod cluster;
pub mod config;
pub mod correlation;
pub mod distance;
pub mod error;
pub mod export;
pub mod graph;
pub mod matrix;
pub mod pipeline;
pub mod prelude;
pub mod series;
pub mod traits;
pub mod utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use matrix::{build_matrix, DistanceMatrix, MatrixKind};
pub use pipeline::{run_analysis, AnalysisReport};
pub use series::{Series, SeriesStore};
pub use traits::{PairMetric, SeriesElement};
pub use utils::{approx_eq, EPSILON, LOOSE_EPSILON};
