//! Analysis report and its renderings.

mod render;

pub use render::{write_profile_tsv, write_report, write_tsv_dir, OutputFormat};

use crate::data::Contrast;
use crate::effect::EffectSizeSet;
use crate::power::{PowerCurve, SampleSizeTable};
use crate::profile::IntensityProfile;
use serde::{Deserialize, Serialize};

/// Number of samples in one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub label: String,
    pub n: usize,
}

/// Follow-up projection for the observed representative effect size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedProjection {
    /// Mean |d| across features.
    pub effect_size: f64,
    pub power_target: f64,
    /// Samples per group needed to reach the target.
    pub n_per_group: usize,
    /// Power at `n_per_group`.
    pub achieved_power: f64,
    /// Power of the current design (smaller group size), if it has 2+ per group.
    pub current_power: Option<f64>,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub name: String,
    pub contrast: Contrast,
    pub n_samples: usize,
    pub n_features: usize,
    pub group_sizes: Vec<GroupCount>,
    /// Normalization median of each sample, in sample order.
    pub sample_medians: Vec<f64>,
    pub raw_profile: IntensityProfile,
    pub normalized_profile: IntensityProfile,
    pub effects: EffectSizeSet,
    pub observed: Option<ObservedProjection>,
    pub sample_size_table: SampleSizeTable,
    pub power_curve: PowerCurve,
}

impl std::fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Analysis: {}", self.name)?;
        writeln!(f, "{}", "=".repeat(10 + self.name.len()))?;
        writeln!(f)?;
        writeln!(f, "Dimensions:")?;
        writeln!(f, "  Samples:  {}", self.n_samples)?;
        writeln!(f, "  Features: {}", self.n_features)?;
        writeln!(f, "  Contrast: {}", self.contrast)?;
        for group in &self.group_sizes {
            writeln!(f, "    {}: {} samples", group.label, group.n)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.raw_profile)?;
        writeln!(f)?;
        writeln!(f, "Effect sizes (Cohen's d, {}):", self.contrast)?;
        for line in self.effects.summary().to_string().lines() {
            writeln!(f, "  {}", line)?;
        }
        let top: Vec<_> = self.effects.sorted_by_magnitude().into_iter().take(5).collect();
        if !top.is_empty() {
            writeln!(f, "  Largest effects:")?;
            for e in top {
                writeln!(f, "    {}: d={:+.3} ({})", e.feature_id, e.d, e.magnitude.name())?;
            }
        }
        writeln!(f)?;
        if let Some(observed) = &self.observed {
            writeln!(f, "Observed effect size {:.3}:", observed.effect_size)?;
            writeln!(
                f,
                "  {} samples per group for power {:.2} (achieved {:.4})",
                observed.n_per_group, observed.power_target, observed.achieved_power
            )?;
            if let Some(power) = observed.current_power {
                writeln!(f, "  Power of the current design: {:.4}", power)?;
            }
            writeln!(f)?;
        }
        write!(f, "{}", self.sample_size_table)?;
        Ok(())
    }
}
