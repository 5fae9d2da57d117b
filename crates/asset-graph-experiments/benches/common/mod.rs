//! Shared benchmark utilities and standard sizes for asset-graph experiments.
//!
//! # Standard Sizes
//!
//! - Series lengths: 250 (one trading year), 1,000 and 2,500
//! - Store sizes: 16, 64 and 128 series

#![allow(dead_code)]

use std::time::Duration;

use criterion::Criterion;

// ============================================================================
// Standard Sizes
// ============================================================================

/// One trading year of daily bars.
pub const LEN_1Y: usize = 250;

/// Four trading years of daily bars.
pub const LEN_4Y: usize = 1_000;

/// Ten trading years of daily bars.
pub const LEN_10Y: usize = 2_500;

/// Series lengths used by the DTW experiments.
pub const SERIES_LENGTHS: [usize; 3] = [LEN_1Y, LEN_4Y, LEN_10Y];

/// Store sizes used by the matrix experiments.
pub const STORE_SIZES: [usize; 3] = [16, 64, 128];

// ============================================================================
// Criterion Configuration
// ============================================================================

/// Default measurement time.
pub const DEFAULT_MEASUREMENT_TIME: Duration = Duration::from_secs(5);

/// Warm-up time before measurements begin.
pub const WARMUP_TIME: Duration = Duration::from_secs(2);

/// Sample size for quadratic workloads.
pub const REDUCED_SAMPLE_SIZE: usize = 20;

/// Seed for reproducible benchmark data.
pub const DEFAULT_SEED: u64 = 42;

/// Group name for E01 DTW band benchmarks.
pub const GROUP_E01_DTW_BAND: &str = "e01_dtw_band";

/// Group name for E02 parallel matrix benchmarks.
pub const GROUP_E02_MATRIX_PARALLEL: &str = "e02_matrix_parallel";

/// Criterion preset for quadratic workloads.
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .measurement_time(DEFAULT_MEASUREMENT_TIME)
        .warm_up_time(WARMUP_TIME)
        .sample_size(REDUCED_SAMPLE_SIZE)
}
