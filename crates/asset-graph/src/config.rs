//! Serde configuration for a complete analysis run.
//!
//! An [`AnalysisConfig`] names the metric, matrix build policy, edge
//! selection and clustering method in one document. It is usually loaded
//! from JSON:
//!
//! ```
//! use asset_graph::config::{AnalysisConfig, ClusterMethod, MetricConfig};
//!
//! let config = AnalysisConfig::from_json_str(r#"{
//!     "metric": { "type": "correlation", "options": { "method": "spearman" }, "absolute": true },
//!     "graph": { "selection": { "type": "threshold", "value": 0.8 }, "round_digits": 2 },
//!     "cluster": { "type": "greedy_modularity" }
//! }"#).unwrap();
//!
//! assert!(matches!(config.metric, MetricConfig::Correlation(_)));
//! assert!(matches!(config.cluster, Some(ClusterMethod::GreedyModularity(_))));
//! assert!(!config.matrix.strict);
//! ```

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::cluster::{Dbscan, GreedyModularity, KMedoids};
use crate::correlation::CorrelationMetric;
use crate::distance::DtwMetric;
use crate::error::{Error, Result};
use crate::graph::GraphBuilder;
use crate::matrix::MatrixBuilder;
use crate::traits::PairMetric;

/// Pair metric selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricConfig {
    /// Dynamic time warping distance.
    Dtw(DtwMetric),
    /// Pearson or Spearman correlation.
    Correlation(CorrelationMetric),
}

impl MetricConfig {
    /// The configured metric as a trait object.
    #[must_use]
    pub fn as_metric(&self) -> &dyn PairMetric {
        match self {
            Self::Dtw(metric) => metric,
            Self::Correlation(metric) => metric,
        }
    }
}

/// Clustering method selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusterMethod {
    /// Enumerate maximal cliques of the graph.
    MaximalCliques,
    /// Greedy modularity communities of the graph.
    GreedyModularity(GreedyModularity),
    /// Average-linkage clustering of the matrix into `k` clusters.
    Hierarchical {
        /// Target cluster count.
        k: usize,
    },
    /// k-medoids over the matrix.
    KMedoids(KMedoids),
    /// DBSCAN over the matrix.
    Dbscan(Dbscan),
}

/// Everything needed to run the pipeline on a series store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Keep only the first `n` series.
    #[serde(default)]
    pub max_series: Option<usize>,
    /// Restrict every series to the timestamps shared by all.
    #[serde(default)]
    pub align: bool,
    /// Min-max scale every series to `[0, 1]` before scoring.
    #[serde(default)]
    pub normalize: bool,
    /// Pair metric.
    pub metric: MetricConfig,
    /// Matrix build policy.
    #[serde(default)]
    pub matrix: MatrixBuilder,
    /// Edge selection and weight rounding.
    pub graph: GraphBuilder,
    /// Optional clustering step.
    #[serde(default)]
    pub cluster: Option<ClusterMethod>,
}

impl AnalysisConfig {
    /// Creates a configuration with default preprocessing and matrix policy
    /// and no clustering step.
    #[must_use]
    pub const fn new(metric: MetricConfig, graph: GraphBuilder) -> Self {
        Self {
            max_series: None,
            align: false,
            normalize: false,
            metric,
            matrix: MatrixBuilder::new(),
            graph,
            cluster: None,
        }
    }

    /// Sets the clustering step.
    #[must_use]
    pub const fn with_cluster(mut self, method: ClusterMethod) -> Self {
        self.cluster = Some(method);
        self
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for malformed JSON and the validation errors of
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document from a reader.
    ///
    /// # Errors
    ///
    /// Same as [`from_json_str`](Self::from_json_str).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if serialisation fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks parameters that do not depend on the data.
    ///
    /// Cluster counts are checked against the series count when the pipeline
    /// runs.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for an out-of-range value.
    pub fn validate(&self) -> Result<()> {
        if self.max_series == Some(0) {
            return Err(Error::invalid_parameter(
                "max_series",
                0,
                "must keep at least one series",
            ));
        }
        if let MetricConfig::Dtw(metric) = &self.metric {
            metric.options.validate()?;
        }
        self.graph.selection.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationMethod;
    use crate::distance::{DtwNormalization, DtwOptions};
    use crate::graph::EdgeSelection;

    #[test]
    fn test_minimal_json() {
        let config = AnalysisConfig::from_json_str(
            r#"{
                "metric": { "type": "dtw" },
                "graph": { "selection": { "type": "top_fraction", "fraction": 0.1 } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.metric, MetricConfig::Dtw(DtwMetric::default()));
        assert_eq!(config.matrix, MatrixBuilder::new());
        assert_eq!(config.cluster, None);
        assert!(!config.align);
    }

    #[test]
    fn test_full_json() {
        let config = AnalysisConfig::from_json_str(
            r#"{
                "max_series": 20,
                "align": true,
                "normalize": true,
                "metric": {
                    "type": "dtw",
                    "options": { "band_width": 5 },
                    "normalization": "path_length"
                },
                "matrix": { "strict": true, "budget": { "max_pairs": 1000 } },
                "graph": { "selection": { "type": "threshold", "value": 3.5 } },
                "cluster": { "type": "hierarchical", "k": 4 }
            }"#,
        )
        .unwrap();
        let expected = DtwMetric::new(DtwOptions::new().with_band_width(5))
            .normalization(DtwNormalization::PathLength);
        assert_eq!(config.metric, MetricConfig::Dtw(expected));
        assert!(config.matrix.strict);
        assert_eq!(config.matrix.budget.max_pairs, Some(1000));
        assert_eq!(config.cluster, Some(ClusterMethod::Hierarchical { k: 4 }));
        assert_eq!(config.max_series, Some(20));
    }

    #[test]
    fn test_round_trip() {
        let config = AnalysisConfig::new(
            MetricConfig::Correlation(CorrelationMetric::new(CorrelationMethod::Pearson)),
            GraphBuilder::new(EdgeSelection::Threshold { value: 0.9 }).round_digits(2),
        )
        .with_cluster(ClusterMethod::KMedoids(KMedoids::new(3)));
        let json = config.to_json_string().unwrap();
        assert_eq!(AnalysisConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AnalysisConfig::from_json_str(
            r#"{
                "metric": { "type": "dtw", "options": { "band_width": 0 } },
                "graph": { "selection": { "type": "threshold", "value": 1.0 } }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { parameter: "band_width", .. }));

        let err = AnalysisConfig::from_json_str(
            r#"{
                "metric": { "type": "dtw" },
                "graph": { "selection": { "type": "top_fraction", "fraction": 2.0 } }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { parameter: "fraction", .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = AnalysisConfig::from_json_str(r#"{ "metric": { "type": "euclid" } }"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_as_metric() {
        let config = MetricConfig::Correlation(CorrelationMetric::new(CorrelationMethod::Spearman));
        assert_eq!(config.as_metric().name(), "spearman");
    }
}
