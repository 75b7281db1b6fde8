//! Intensity distribution profiling for sample rows.

use crate::data::IntensityMatrix;
use serde::{Deserialize, Serialize};

/// Distribution of one sample's observed intensities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleDistribution {
    pub sample_id: String,
    pub label: String,
    /// Number of observed (non-missing) intensities.
    pub n_observed: usize,
    /// Number of missing intensities.
    pub n_missing: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl SampleDistribution {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Per-sample intensity distributions of a matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntensityProfile {
    pub n_samples: usize,
    pub n_features: usize,
    /// Fraction of all cells that are missing.
    pub missing_fraction: f64,
    pub samples: Vec<SampleDistribution>,
}

impl IntensityProfile {
    /// Ratio of the largest to the smallest sample median.
    pub fn median_spread(&self) -> f64 {
        let medians = self.samples.iter().map(|s| s.median).filter(|m| !m.is_nan());
        let (lo, hi) = medians.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
            (lo.min(m), hi.max(m))
        });
        if lo > 0.0 && lo.is_finite() {
            hi / lo
        } else {
            f64::INFINITY
        }
    }

    /// Distribution for one sample.
    pub fn get(&self, sample_id: &str) -> Option<&SampleDistribution> {
        self.samples.iter().find(|s| s.sample_id == sample_id)
    }
}

impl std::fmt::Display for IntensityProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Intensity Profile")?;
        writeln!(f, "  Samples:  {}", self.n_samples)?;
        writeln!(f, "  Features: {}", self.n_features)?;
        writeln!(f, "  Missing:  {:.1}%", self.missing_fraction * 100.0)?;
        writeln!(f, "  Median spread (max/min): {:.2}", self.median_spread())?;
        writeln!(
            f,
            "  {:<12} {:<8} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "sample", "label", "min", "q1", "median", "q3", "max"
        )?;
        for s in &self.samples {
            writeln!(
                f,
                "  {:<12} {:<8} {:>10.4e} {:>10.4e} {:>10.4e} {:>10.4e} {:>10.4e}",
                s.sample_id, s.label, s.min, s.q1, s.median, s.q3, s.max
            )?;
        }
        Ok(())
    }
}

/// Linear-interpolation quantile of sorted values (`p` in [0, 1]).
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Profile the intensity distribution of every sample.
pub fn profile_intensity(matrix: &IntensityMatrix) -> IntensityProfile {
    let samples: Vec<SampleDistribution> = matrix
        .records()
        .map(|record| {
            let mut observed: Vec<f64> = record
                .intensities
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            observed.sort_by(|a, b| a.total_cmp(b));
            let n_observed = observed.len();
            let mean = if n_observed > 0 {
                observed.iter().sum::<f64>() / n_observed as f64
            } else {
                f64::NAN
            };

            SampleDistribution {
                n_observed,
                n_missing: record.intensities.len() - n_observed,
                min: observed.first().copied().unwrap_or(f64::NAN),
                q1: quantile_sorted(&observed, 0.25),
                median: quantile_sorted(&observed, 0.5),
                q3: quantile_sorted(&observed, 0.75),
                max: observed.last().copied().unwrap_or(f64::NAN),
                mean,
                sample_id: record.id,
                label: record.label,
            }
        })
        .collect();

    let total = matrix.n_samples() * matrix.n_features();
    IntensityProfile {
        n_samples: matrix.n_samples(),
        n_features: matrix.n_features(),
        missing_fraction: matrix.n_missing() as f64 / total as f64,
        samples,
    }
}
