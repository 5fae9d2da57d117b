//! CSV writers for matrices, graphs and clusterings.
//!
//! Every writer takes any `std::io::Write` sink and emits a header row.
//!
//! # Cell formatting
//!
//! - Numbers use Rust's shortest round-trip `Display` form.
//! - A missing matrix entry is an empty cell.
//! - An undefined value (the NaN correlation sentinel) is written as `NaN`,
//!   so it stays distinguishable from a missing entry.
//! - DBSCAN noise is labelled `-1`.
//!
//! # Example
//!
//! ```
//! use asset_graph::export::write_matrix_pairs;
//! use asset_graph::matrix::{DistanceMatrix, MatrixKind};
//!
//! let m = DistanceMatrix::from_pairs(["B", "A"], MatrixKind::Distance, [("A", "B", 2.5)]).unwrap();
//! let mut out = Vec::new();
//! write_matrix_pairs(&mut out, &m).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "Ticker1,Ticker2,Value\nA,B,2.5\n");
//! ```

use std::io::Write;

use csv::Writer;

use crate::cluster::{CliqueReport, ClusterAssignment};
use crate::error::Result;
use crate::graph::Graph;
use crate::matrix::{DistanceMatrix, PairValue};

fn format_value(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.is_nan() => "NaN".to_string(),
        Some(v) => v.to_string(),
    }
}

/// Writes `(id1, id2, value)` records as `Ticker1,Ticker2,Value`.
///
/// # Errors
///
/// Returns `Error::Export` if the sink fails.
pub fn write_pairs<W: Write>(writer: W, pairs: &[PairValue]) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(["Ticker1", "Ticker2", "Value"])?;
    for pair in pairs {
        let value = format_value(pair.value);
        csv.write_record([pair.left.as_str(), pair.right.as_str(), value.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the canonical sorted pair list of a matrix.
///
/// # Errors
///
/// Returns `Error::Export` if the sink fails.
pub fn write_matrix_pairs<W: Write>(writer: W, matrix: &DistanceMatrix) -> Result<()> {
    write_pairs(writer, &matrix.sorted_pairs())
}

/// Writes the square matrix with a `Ticker` header column.
///
/// # Errors
///
/// Returns `Error::Export` if the sink fails.
pub fn write_square<W: Write>(writer: W, matrix: &DistanceMatrix) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    let mut header = Vec::with_capacity(matrix.len() + 1);
    header.push("Ticker");
    header.extend(matrix.ids().iter().map(String::as_str));
    csv.write_record(&header)?;

    for (id, row) in matrix.ids().iter().zip(matrix.to_square()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(id.clone());
        record.extend(row.into_iter().map(format_value));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the edge list as `Ticker1,Ticker2,Weight`.
///
/// # Errors
///
/// Returns `Error::Export` if the sink fails.
pub fn write_edges<W: Write>(writer: W, graph: &Graph) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(["Ticker1", "Ticker2", "Weight"])?;
    for edge in graph.edges() {
        csv.write_record([edge.left, edge.right, edge.weight.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes `Ticker,Cluster` rows sorted by ticker; noise is labelled `-1`.
///
/// # Errors
///
/// Returns `Error::Export` if the sink fails.
pub fn write_assignment<W: Write>(writer: W, assignment: &ClusterAssignment) -> Result<()> {
    let mut rows: Vec<(&str, String)> = assignment
        .labels()
        .into_iter()
        .map(|(id, label)| (id, label.to_string()))
        .chain(assignment.noise().iter().map(|id| (id.as_str(), "-1".to_string())))
        .collect();
    rows.sort();

    let mut csv = Writer::from_writer(writer);
    csv.write_record(["Ticker", "Cluster"])?;
    for (id, label) in rows {
        csv.write_record([id, label.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes one row per maximal clique as `Clique,Size,Members`, members
/// separated by spaces. Row 0 is the largest clique.
///
/// # Errors
///
/// Returns `Error::Export` if the sink fails.
pub fn write_cliques<W: Write>(writer: W, report: &CliqueReport) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(["Clique", "Size", "Members"])?;
    for (index, clique) in report.cliques().iter().enumerate() {
        csv.write_record([
            index.to_string(),
            clique.len().to_string(),
            clique.join(" "),
        ])?;
    }
    csv.flush()?;
    Ok(())
}
