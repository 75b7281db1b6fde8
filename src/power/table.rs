//! Sample-size tables and power curves over a grid of effect sizes.

use super::ttest::TwoSampleTTest;
use crate::error::{MetaPowerError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Sample size needed for one effect size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSizeRow {
    pub effect_size: f64,
    /// Smallest per-group size reaching the power target.
    pub n_per_group: usize,
    /// Both groups together.
    pub n_total: usize,
    /// Power actually achieved at `n_per_group`.
    pub achieved_power: f64,
}

/// Samples needed per effect size at a fixed power target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSizeTable {
    pub alpha: f64,
    pub power_target: f64,
    pub rows: Vec<SampleSizeRow>,
}

impl SampleSizeTable {
    /// Row for an effect size, if tabulated.
    pub fn get(&self, effect_size: f64) -> Option<&SampleSizeRow> {
        self.rows
            .iter()
            .find(|r| (r.effect_size - effect_size).abs() < 1e-12)
    }
}

impl std::fmt::Display for SampleSizeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Samples needed (power {:.2}, alpha {}, two-sided)",
            self.power_target, self.alpha
        )?;
        writeln!(f, "  {:>11}  {:>9}  {:>7}  {:>7}", "effect size", "per group", "total", "power")?;
        for row in &self.rows {
            writeln!(
                f,
                "  {:>11.3}  {:>9}  {:>7}  {:>7.4}",
                row.effect_size, row.n_per_group, row.n_total, row.achieved_power
            )?;
        }
        Ok(())
    }
}

/// Build the samples-needed table for each effect size.
pub fn sample_size_table(
    test: &TwoSampleTTest,
    effect_sizes: &[f64],
    power_target: f64,
) -> Result<SampleSizeTable> {
    let rows = effect_sizes
        .par_iter()
        .map(|&d| {
            let n = test.required_n(d, power_target)?;
            Ok(SampleSizeRow {
                effect_size: d,
                n_per_group: n,
                n_total: 2 * n,
                achieved_power: test.achieved_power(d, n)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SampleSizeTable {
        alpha: test.alpha(),
        power_target,
        rows,
    })
}

/// One point of a power curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerPoint {
    pub effect_size: f64,
    pub n_per_group: usize,
    pub power: f64,
}

/// Achieved power over an effect size × sample size grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerCurve {
    pub alpha: f64,
    pub effect_sizes: Vec<f64>,
    pub sample_sizes: Vec<usize>,
    /// Points ordered by effect size, then sample size.
    pub points: Vec<PowerPoint>,
}

impl PowerCurve {
    /// Power at a grid point.
    pub fn power_at(&self, effect_size: f64, n_per_group: usize) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.n_per_group == n_per_group && (p.effect_size - effect_size).abs() < 1e-12)
            .map(|p| p.power)
    }

    /// The (n, power) series for one effect size.
    pub fn series(&self, effect_size: f64) -> Vec<(usize, f64)> {
        self.points
            .iter()
            .filter(|p| (p.effect_size - effect_size).abs() < 1e-12)
            .map(|p| (p.n_per_group, p.power))
            .collect()
    }
}

/// Evaluate achieved power on every (effect size, n) pair.
pub fn power_curve(
    test: &TwoSampleTTest,
    effect_sizes: &[f64],
    sample_sizes: &[usize],
) -> Result<PowerCurve> {
    if effect_sizes.is_empty() || sample_sizes.is_empty() {
        return Err(MetaPowerError::InvalidParameter(
            "power curve needs at least one effect size and one sample size".to_string(),
        ));
    }

    let grid: Vec<(f64, usize)> = effect_sizes
        .iter()
        .flat_map(|&d| sample_sizes.iter().map(move |&n| (d, n)))
        .collect();

    let points = grid
        .par_iter()
        .map(|&(d, n)| {
            Ok(PowerPoint {
                effect_size: d,
                n_per_group: n,
                power: test.achieved_power(d, n)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PowerCurve {
        alpha: test.alpha(),
        effect_sizes: effect_sizes.to_vec(),
        sample_sizes: sample_sizes.to_vec(),
        points,
    })
}
