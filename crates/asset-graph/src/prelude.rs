//! Commonly used types and functions for convenient importing.
//!
//! # Usage
//!
//! ```
//! use asset_graph::prelude::*;
//!
//! let a = [1.0_f64, 2.0, 3.0, 4.0];
//! let b = [4.0_f64, 3.0, 2.0, 1.0];
//!
//! let distance = dtw_distance(&a, &b, &DtwOptions::new().with_band_width(1)).unwrap();
//! let r = pearson(&a, &b).unwrap();
//! assert!(distance > 0.0);
//! assert!((r + 1.0).abs() < 1e-12);
//! ```
//!
//! # Contents
//!
//! - Errors: [`Error`], [`Result`]
//! - Traits: [`SeriesElement`], [`PairMetric`]
//! - Data: [`Series`], [`SeriesStore`], [`SampleRow`]
//! - Engines: DTW and correlation functions with their options and metrics
//! - Builders: [`MatrixBuilder`], [`GraphBuilder`] and their outputs
//! - Clustering: every algorithm in [`crate::cluster`]
//! - Pipeline: [`AnalysisConfig`], [`run_analysis`]

// Error types
pub use crate::error::{Error, Result};

// Traits
pub use crate::traits::{PairMetric, SeriesElement};

// Data
pub use crate::series::{SampleRow, Series, SeriesStore};

// Engines
pub use crate::correlation::{
    correlation, pearson, spearman, CorrelationMethod, CorrelationMetric, CorrelationOptions,
};
pub use crate::distance::{
    dtw_distance, dtw_distance_normalized, dtw_path, DtwMetric, DtwNormalization, DtwOptions,
    WarpingPath,
};

// Builders
pub use crate::graph::{build_graph, Edge, EdgeSelection, Graph, GraphBuilder};
pub use crate::matrix::{
    build_matrix, ComputeBudget, DistanceMatrix, MatrixBuilder, MatrixKind, PairValue,
};

// Clustering
pub use crate::cluster::{
    hierarchical_average, maximal_cliques, modularity, CliqueReport, ClusterAssignment, Dbscan,
    GreedyModularity, KMedoids, MedoidClustering,
};

// Pipeline
pub use crate::config::{AnalysisConfig, ClusterMethod, MetricConfig};
pub use crate::pipeline::{run_analysis, AnalysisReport, ClusterOutcome};
