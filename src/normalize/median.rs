//! Per-sample median scaling.
//!
//! Each sample is divided by the median of its observed intensities, which
//! removes differences in overall signal between injections.

use crate::data::IntensityMatrix;
use crate::error::{MetaPowerError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Result of median normalization.
#[derive(Debug, Clone)]
pub struct MedianNormalized {
    /// Normalized intensities; samples, labels and features as in the input.
    pub matrix: IntensityMatrix,
    /// Median of each sample before scaling, in row order.
    pub medians: Vec<f64>,
}

impl MedianNormalized {
    /// Normalized value at (sample, feature), `None` when missing.
    pub fn get(&self, sample: usize, feature: usize) -> Option<f64> {
        self.matrix.get(sample, feature)
    }

    /// Median used for one sample.
    pub fn median_of(&self, sample_id: &str) -> Option<f64> {
        self.matrix
            .samples()
            .iter()
            .position(|s| s.id == sample_id)
            .map(|i| self.medians[i])
    }

    /// Consume into the normalized matrix.
    pub fn into_matrix(self) -> IntensityMatrix {
        self.matrix
    }
}

/// Median of the non-missing values, `None` if every value is missing.
pub fn median_observed(values: &[f64]) -> Option<f64> {
    let mut observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return None;
    }
    observed.sort_by(|a, b| a.total_cmp(b));
    let n = observed.len();
    if n % 2 == 0 {
        Some((observed[n / 2 - 1] + observed[n / 2]) / 2.0)
    } else {
        Some(observed[n / 2])
    }
}

/// Divide every sample by its median intensity.
///
/// Missing values are excluded from the median and stay missing. A sample
/// whose median is zero (or that has no observed values) cannot be scaled
/// and is reported as [`MetaPowerError::ZeroMedian`].
pub fn norm_median(matrix: &IntensityMatrix) -> Result<MedianNormalized> {
    let n_samples = matrix.n_samples();
    let n_features = matrix.n_features();

    let medians: Vec<f64> = (0..n_samples)
        .into_par_iter()
        .map(|i| median_observed(&matrix.row(i)).unwrap_or(f64::NAN))
        .collect();

    for (sample, &median) in matrix.samples().iter().zip(&medians) {
        if !(median.is_finite() && median > 0.0) {
            return Err(MetaPowerError::ZeroMedian {
                sample: sample.id.clone(),
                median,
            });
        }
    }

    let source = matrix.matrix();
    let data = DMatrix::from_fn(n_samples, n_features, |i, j| source[(i, j)] / medians[i]);

    log::debug!(
        "Median-normalized {} samples (medians {:.3e}..{:.3e})",
        n_samples,
        medians.iter().copied().fold(f64::INFINITY, f64::min),
        medians.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    );

    Ok(MedianNormalized {
        matrix: matrix.with_data(data)?,
        medians,
    })
}
