//! End-to-end analysis: store → matrix → graph → clustering.

use serde::Serialize;

use crate::cluster::{
    hierarchical_average, maximal_cliques, modularity, CliqueReport, ClusterAssignment,
    MedoidClustering,
};
use crate::config::{AnalysisConfig, ClusterMethod};
use crate::error::Result;
use crate::graph::Graph;
use crate::matrix::DistanceMatrix;
use crate::series::SeriesStore;

/// Output of the clustering step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusterOutcome {
    /// Maximal cliques, largest first.
    Cliques(CliqueReport),
    /// A partition from modularity, hierarchical or DBSCAN clustering.
    Partition(ClusterAssignment),
    /// A k-medoids partition with its medoids.
    Medoids(MedoidClustering),
}

impl ClusterOutcome {
    /// The partition, if this outcome is one.
    #[must_use]
    pub const fn assignment(&self) -> Option<&ClusterAssignment> {
        match self {
            Self::Cliques(_) => None,
            Self::Partition(assignment) => Some(assignment),
            Self::Medoids(result) => Some(&result.assignment),
        }
    }
}

/// Artifacts of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Name of the pair metric.
    pub metric: &'static str,
    /// The pairwise matrix.
    pub matrix: DistanceMatrix,
    /// The selected graph.
    pub graph: Graph,
    /// Clustering output, if a method was configured.
    pub clustering: Option<ClusterOutcome>,
    /// Modularity of the partition on the graph, when both are defined.
    pub modularity: Option<f64>,
}

/// Applies truncation, alignment and normalisation.
fn prepare(store: &SeriesStore, config: &AnalysisConfig) -> Result<SeriesStore> {
    let mut prepared = match config.max_series {
        Some(n) => store.truncated(n),
        None => store.clone(),
    };
    if config.align {
        prepared = prepared.inner_join()?;
    }
    if config.normalize {
        prepared = prepared.min_max_normalized();
    }
    Ok(prepared)
}

fn cluster(
    method: &ClusterMethod,
    matrix: &DistanceMatrix,
    graph: &Graph,
) -> Result<ClusterOutcome> {
    Ok(match method {
        ClusterMethod::MaximalCliques => ClusterOutcome::Cliques(maximal_cliques(graph)?),
        ClusterMethod::GreedyModularity(detector) => {
            ClusterOutcome::Partition(detector.detect(graph)?)
        }
        ClusterMethod::Hierarchical { k } => {
            ClusterOutcome::Partition(hierarchical_average(matrix, *k)?)
        }
        ClusterMethod::KMedoids(kmedoids) => ClusterOutcome::Medoids(kmedoids.fit(matrix)?),
        ClusterMethod::Dbscan(dbscan) => ClusterOutcome::Partition(dbscan.fit(matrix)?),
    })
}

/// Runs the configured pipeline over `store`.
///
/// # Errors
///
/// Propagates the first error of any stage: alignment, matrix build (strict
/// mode or budget), graph selection or clustering.
///
/// # Example
///
/// ```
/// use asset_graph::config::{AnalysisConfig, ClusterMethod, MetricConfig};
/// use asset_graph::distance::DtwMetric;
/// use asset_graph::graph::{EdgeSelection, GraphBuilder};
/// use asset_graph::pipeline::run_analysis;
/// use asset_graph::series::{Series, SeriesStore};
///
/// let store = SeriesStore::from_series([
///     Series::new("A", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
///     Series::new("B", vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
///     Series::new("C", vec![4.0, 3.0, 2.0, 1.0]).unwrap(),
/// ])
/// .unwrap();
///
/// let config = AnalysisConfig::new(
///     MetricConfig::Dtw(DtwMetric::default()),
///     GraphBuilder::new(EdgeSelection::Threshold { value: 1.0 }),
/// )
/// .with_cluster(ClusterMethod::Hierarchical { k: 2 });
///
/// let report = run_analysis(&store, &config).unwrap();
/// assert_eq!(report.graph.edge_count(), 1);
/// let clusters = report.clustering.unwrap();
/// assert_eq!(clusters.assignment().unwrap().cluster_count(), 2);
/// ```
pub fn run_analysis(store: &SeriesStore, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    let metric = config.metric.as_metric();
    let span = tracing::info_span!("analysis", metric = metric.name(), series = store.len());
    let _guard = span.enter();

    let prepared = prepare(store, config)?;
    let matrix = config.matrix.build(&prepared, metric)?;
    let graph = config.graph.build(&matrix)?;

    let clustering = config
        .cluster
        .as_ref()
        .map(|method| cluster(method, &matrix, &graph))
        .transpose()?;

    let resolution = match config.cluster {
        Some(ClusterMethod::GreedyModularity(detector)) => detector.resolution,
        _ => 1.0,
    };
    let modularity = match clustering.as_ref().and_then(ClusterOutcome::assignment) {
        Some(assignment) if graph.edge_count() > 0 => {
            match modularity(&graph, assignment, resolution) {
                Ok(q) => Some(q),
                Err(err) => {
                    tracing::debug!(error = %err, "modularity undefined for this graph");
                    None
                }
            }
        }
        _ => None,
    };

    tracing::info!(
        pairs = matrix.sorted_pairs().len(),
        missing = matrix.missing_pairs().len(),
        edges = graph.edge_count(),
        clusters = clustering
            .as_ref()
            .and_then(ClusterOutcome::assignment)
            .map_or(0, ClusterAssignment::cluster_count),
        "analysis complete"
    );

    Ok(AnalysisReport {
        metric: metric.name(),
        matrix,
        graph,
        clustering,
        modularity,
    })
}
