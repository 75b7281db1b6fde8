//! Normalization of intensity matrices.
//!
//! - **Median**: per-sample median scaling (each sample divided by the median
//!   of its observed intensities)

pub mod median;

pub use median::{median_observed, norm_median, MedianNormalized};
