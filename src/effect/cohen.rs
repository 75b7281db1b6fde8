//! Cohen's d between two sample groups, one value per feature.

use crate::data::{Contrast, IntensityMatrix};
use crate::error::{MetaPowerError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Optional small-sample correction of the standardized difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectCorrection {
    /// Plain Cohen's d.
    #[default]
    None,
    /// Hedges' g: d × (1 − 3 / (4(n₁ + n₂) − 9)).
    Hedges,
}

/// What to do with a feature whose effect size cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientPolicy {
    /// Abort the whole computation.
    Fail,
    /// Log a warning and leave the feature out.
    #[default]
    SkipAndWarn,
}

/// Configuration for [`effect_sizes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSizeConfig {
    #[serde(default)]
    pub correction: EffectCorrection,
    #[serde(default)]
    pub on_insufficient: InsufficientPolicy,
}

/// Conventional magnitude classes for |d|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Magnitude {
    /// |d| < 0.2
    Negligible,
    /// 0.2 ≤ |d| < 0.5
    Small,
    /// 0.5 ≤ |d| < 0.8
    Medium,
    /// |d| ≥ 0.8
    Large,
}

impl Magnitude {
    /// Classify an effect size by its absolute value.
    pub fn from_effect(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            Self::Negligible
        } else if d < 0.5 {
            Self::Small
        } else if d < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Observed values of one group for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Number of non-missing observations.
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator).
    pub sd: f64,
}

impl GroupSummary {
    fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        let sd = if n > 1 { (ss / (n - 1) as f64).sqrt() } else { f64::NAN };
        Self { n, mean, sd }
    }
}

/// Effect size of one feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEffect {
    pub feature_id: String,
    /// Signed standardized difference, case − control.
    pub d: f64,
    pub case: GroupSummary,
    pub control: GroupSummary,
    pub pooled_sd: f64,
    pub magnitude: Magnitude,
}

/// A feature left out of the effect size vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFeature {
    pub feature_id: String,
    pub reason: String,
}

/// Effect sizes for every feature of a matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSizeSet {
    pub contrast: Contrast,
    pub correction: EffectCorrection,
    /// Computed effects in feature order.
    pub effects: Vec<FeatureEffect>,
    /// Features without an effect size.
    pub skipped: Vec<SkippedFeature>,
}

impl EffectSizeSet {
    /// Number of computed effect sizes.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Signed effect sizes in feature order.
    pub fn values(&self) -> Vec<f64> {
        self.effects.iter().map(|e| e.d).collect()
    }

    /// Mean of |d| over computed features: the representative effect size.
    pub fn mean_abs(&self) -> Option<f64> {
        if self.effects.is_empty() {
            return None;
        }
        Some(self.effects.iter().map(|e| e.d.abs()).sum::<f64>() / self.effects.len() as f64)
    }

    /// Effect for a specific feature.
    pub fn get_feature(&self, feature_id: &str) -> Option<&FeatureEffect> {
        self.effects.iter().find(|e| e.feature_id == feature_id)
    }

    /// Effects sorted by decreasing |d|.
    pub fn sorted_by_magnitude(&self) -> Vec<&FeatureEffect> {
        let mut sorted: Vec<_> = self.effects.iter().collect();
        sorted.sort_by(|a, b| b.d.abs().total_cmp(&a.d.abs()));
        sorted
    }

    /// Summary statistics of the effect size vector.
    pub fn summary(&self) -> EffectSizeSummary {
        let mut abs: Vec<f64> = self.effects.iter().map(|e| e.d.abs()).collect();
        abs.sort_by(|a, b| a.total_cmp(b));
        let count = |m: Magnitude| self.effects.iter().filter(|e| e.magnitude == m).count();

        EffectSizeSummary {
            n_features: self.effects.len(),
            n_skipped: self.skipped.len(),
            mean_abs: self.mean_abs().unwrap_or(f64::NAN),
            median_abs: crate::normalize::median_observed(&abs).unwrap_or(f64::NAN),
            max_abs: abs.last().copied().unwrap_or(f64::NAN),
            n_positive: self.effects.iter().filter(|e| e.d > 0.0).count(),
            n_negative: self.effects.iter().filter(|e| e.d < 0.0).count(),
            n_negligible: count(Magnitude::Negligible),
            n_small: count(Magnitude::Small),
            n_medium: count(Magnitude::Medium),
            n_large: count(Magnitude::Large),
        }
    }
}

/// Summary of an effect size vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSizeSummary {
    pub n_features: usize,
    pub n_skipped: usize,
    pub mean_abs: f64,
    pub median_abs: f64,
    pub max_abs: f64,
    pub n_positive: usize,
    pub n_negative: usize,
    pub n_negligible: usize,
    pub n_small: usize,
    pub n_medium: usize,
    pub n_large: usize,
}

impl std::fmt::Display for EffectSizeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Features with effect size: {}", self.n_features)?;
        writeln!(f, "Features skipped:          {}", self.n_skipped)?;
        writeln!(f, "Mean |d|:   {:.3}", self.mean_abs)?;
        writeln!(f, "Median |d|: {:.3}", self.median_abs)?;
        writeln!(f, "Max |d|:    {:.3}", self.max_abs)?;
        writeln!(f, "Direction:  {} up, {} down", self.n_positive, self.n_negative)?;
        writeln!(
            f,
            "Magnitude:  {} negligible, {} small, {} medium, {} large",
            self.n_negligible, self.n_small, self.n_medium, self.n_large
        )?;
        Ok(())
    }
}

/// Pooled SDs at or below this fraction of the larger group mean count as zero.
const RELATIVE_SD_FLOOR: f64 = 1e-12;

fn feature_effect(
    feature_id: &str,
    case: &[f64],
    control: &[f64],
    contrast: &Contrast,
    correction: EffectCorrection,
) -> Result<FeatureEffect> {
    for (group, values) in [(&contrast.case, case), (&contrast.control, control)] {
        if values.len() < 2 {
            return Err(MetaPowerError::InsufficientData {
                feature: feature_id.to_string(),
                group: group.clone(),
                n: values.len(),
            });
        }
    }

    let case_summary = GroupSummary::from_values(case);
    let control_summary = GroupSummary::from_values(control);
    let (n1, n2) = (case_summary.n as f64, control_summary.n as f64);

    let pooled_var = ((n1 - 1.0) * case_summary.sd.powi(2)
        + (n2 - 1.0) * control_summary.sd.powi(2))
        / (n1 + n2 - 2.0);
    let pooled_sd = pooled_var.sqrt();
    // Constant groups leave rounding residue in the SD, so compare against
    // the magnitude of the means rather than against exact zero.
    let scale = case_summary.mean.abs().max(control_summary.mean.abs());
    if !(pooled_sd.is_finite() && pooled_sd > 0.0 && pooled_sd > RELATIVE_SD_FLOOR * scale) {
        return Err(MetaPowerError::ZeroVariance(feature_id.to_string()));
    }

    let mut d = (case_summary.mean - control_summary.mean) / pooled_sd;
    if correction == EffectCorrection::Hedges {
        d *= 1.0 - 3.0 / (4.0 * (n1 + n2) - 9.0);
    }

    Ok(FeatureEffect {
        feature_id: feature_id.to_string(),
        d,
        case: case_summary,
        control: control_summary,
        pooled_sd,
        magnitude: Magnitude::from_effect(d),
    })
}

/// Cohen's d for two groups of observations (`case − control`, pooled SD).
///
/// Missing values (`NaN`) are ignored. Each group needs at least two
/// observations.
pub fn cohens_d(case: &[f64], control: &[f64]) -> Result<f64> {
    let case: Vec<f64> = case.iter().copied().filter(|v| !v.is_nan()).collect();
    let control: Vec<f64> = control.iter().copied().filter(|v| !v.is_nan()).collect();
    feature_effect(
        "values",
        &case,
        &control,
        &Contrast::new("case", "control"),
        EffectCorrection::None,
    )
    .map(|e| e.d)
}

/// Compute an effect size for every feature of `matrix`.
///
/// Features are independent and computed in parallel; the result keeps
/// feature order. Samples outside the two contrast groups are ignored.
pub fn effect_sizes(
    matrix: &IntensityMatrix,
    contrast: &Contrast,
    config: &EffectSizeConfig,
) -> Result<EffectSizeSet> {
    contrast.validate(matrix)?;
    let case_rows = matrix.group_indices(&contrast.case);
    let control_rows = matrix.group_indices(&contrast.control);

    let observed = |rows: &[usize], feature: usize| -> Vec<f64> {
        rows.iter().filter_map(|&i| matrix.get(i, feature)).collect()
    };

    let outcomes: Vec<Result<FeatureEffect>> = (0..matrix.n_features())
        .into_par_iter()
        .map(|j| {
            feature_effect(
                &matrix.feature_ids()[j],
                &observed(&case_rows, j),
                &observed(&control_rows, j),
                contrast,
                config.correction,
            )
        })
        .collect();

    let mut effects = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(effect) => effects.push(effect),
            Err(e) => {
                let skippable = match &e {
                    MetaPowerError::InsufficientData { feature, .. }
                    | MetaPowerError::ZeroVariance(feature) => Some(feature.clone()),
                    _ => None,
                };
                let Some(feature_id) = skippable else {
                    return Err(e);
                };
                if config.on_insufficient == InsufficientPolicy::Fail {
                    return Err(e);
                }
                log::warn!("Skipping feature: {}", e);
                skipped.push(SkippedFeature {
                    feature_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Computed effect sizes for {} features ({} skipped), contrast {}",
        effects.len(),
        skipped.len(),
        contrast
    );

    Ok(EffectSizeSet {
        contrast: contrast.clone(),
        correction: config.correction,
        effects,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SampleRecord;
    use approx::assert_relative_eq;

    fn create_test_matrix() -> IntensityMatrix {
        // f0: clear shift, f1: no difference, f2: one KO observation only,
        // f3: constant in both groups
        let rows = vec![
            ("S1", "KO", vec![2.0, 1.0, 5.0, 1.0]),
            ("S2", "KO", vec![3.0, 2.0, f64::NAN, 1.0]),
            ("S3", "KO", vec![4.0, 3.0, f64::NAN, 1.0]),
            ("S4", "WT", vec![1.0, 1.0, 2.0, 1.0]),
            ("S5", "WT", vec![2.0, 2.0, 3.0, 1.0]),
            ("S6", "WT", vec![3.0, 3.0, 4.0, 1.0]),
        ];
        let records = rows
            .into_iter()
            .map(|(id, label, intensities)| SampleRecord {
                id: id.to_string(),
                label: label.to_string(),
                intensities,
            })
            .collect();
        IntensityMatrix::from_records(
            vec!["f0".into(), "f1".into(), "f2".into(), "f3".into()],
            records,
        )
        .unwrap()
    }

    #[test]
    fn test_cohens_d_known_value() {
        // Means 3 and 2, both SDs 1 => d = 1
        let d = cohens_d(&[2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);

        // Unequal sizes: means 5 and 2, variances 2.5 (n=5) and 1 (n=3)
        // pooled var = (4*2.5 + 2*1) / 6 = 2
        let d = cohens_d(&[3.0, 4.0, 5.0, 6.0, 7.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(d, 3.0 / 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_cohens_d_sign() {
        let up = cohens_d(&[5.0, 6.0, 7.0], &[1.0, 2.0, 3.0]).unwrap();
        let down = cohens_d(&[1.0, 2.0, 3.0], &[5.0, 6.0, 7.0]).unwrap();
        assert!(up > 0.0);
        assert_relative_eq!(up, -down);
    }

    #[test]
    fn test_cohens_d_ignores_missing() {
        let d = cohens_d(&[2.0, f64::NAN, 3.0, 4.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cohens_d_constant_groups() {
        // 0.1 and 0.2 are not exact in binary; the group means differ from
        // the values by an ulp.
        let err = cohens_d(&[0.1, 0.1, 0.1], &[0.2, 0.2, 0.2]).unwrap_err();
        assert!(matches!(err, MetaPowerError::ZeroVariance(_)));

        let err = cohens_d(&[0.0, 0.0], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, MetaPowerError::ZeroVariance(_)));

        // Small but real spread is kept.
        let d = cohens_d(&[0.1, 0.1 + 1e-6, 0.1 + 2e-6], &[0.1 - 1e-6, 0.1, 0.1 + 1e-6]).unwrap();
        assert_relative_eq!(d, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cohens_d_insufficient() {
        let err = cohens_d(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, MetaPowerError::InsufficientData { n: 1, .. }));
    }

    #[test]
    fn test_effect_sizes_skip_and_warn() {
        let m = create_test_matrix();
        let set = effect_sizes(&m, &Contrast::new("KO", "WT"), &EffectSizeConfig::default()).unwrap();

        assert_eq!(set.len(), 2);
        assert_relative_eq!(set.get_feature("f0").unwrap().d, 1.0, epsilon = 1e-12);
        assert_relative_eq!(set.get_feature("f1").unwrap().d, 0.0, epsilon = 1e-12);
        assert_eq!(set.skipped.len(), 2);
        assert_eq!(set.skipped[0].feature_id, "f2");
        assert_eq!(set.skipped[1].feature_id, "f3");
        assert_relative_eq!(set.mean_abs().unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_effect_sizes_fail_policy() {
        let m = create_test_matrix();
        let config = EffectSizeConfig {
            on_insufficient: InsufficientPolicy::Fail,
            ..Default::default()
        };
        let err = effect_sizes(&m, &Contrast::new("KO", "WT"), &config).unwrap_err();
        match err {
            MetaPowerError::InsufficientData { feature, group, n } => {
                assert_eq!(feature, "f2");
                assert_eq!(group, "KO");
                assert_eq!(n, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hedges_correction() {
        let m = create_test_matrix();
        let config = EffectSizeConfig {
            correction: EffectCorrection::Hedges,
            ..Default::default()
        };
        let set = effect_sizes(&m, &Contrast::new("KO", "WT"), &config).unwrap();
        // J = 1 - 3 / (4 * 6 - 9) = 0.8
        assert_relative_eq!(set.get_feature("f0").unwrap().d, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_group_summaries() {
        let m = create_test_matrix();
        let set = effect_sizes(&m, &Contrast::new("WT", "KO"), &EffectSizeConfig::default()).unwrap();
        let f0 = set.get_feature("f0").unwrap();
        assert_eq!(f0.case.n, 3);
        assert_relative_eq!(f0.case.mean, 2.0);
        assert_relative_eq!(f0.control.mean, 3.0);
        assert_relative_eq!(f0.pooled_sd, 1.0);
        assert_relative_eq!(f0.d, -1.0, epsilon = 1e-12);
        assert_eq!(f0.magnitude, Magnitude::Large);
    }

    #[test]
    fn test_magnitude_classes() {
        assert_eq!(Magnitude::from_effect(0.1), Magnitude::Negligible);
        assert_eq!(Magnitude::from_effect(-0.3), Magnitude::Small);
        assert_eq!(Magnitude::from_effect(0.736), Magnitude::Medium);
        assert_eq!(Magnitude::from_effect(-1.2), Magnitude::Large);
    }

    #[test]
    fn test_summary() {
        let m = create_test_matrix();
        let set = effect_sizes(&m, &Contrast::new("KO", "WT"), &EffectSizeConfig::default()).unwrap();
        let summary = set.summary();
        assert_eq!(summary.n_features, 2);
        assert_eq!(summary.n_skipped, 2);
        assert_eq!(summary.n_positive, 1);
        assert_eq!(summary.n_large, 1);
        assert_eq!(summary.n_negligible, 1);
        assert_relative_eq!(summary.max_abs, 1.0, epsilon = 1e-12);
        assert_eq!(set.sorted_by_magnitude()[0].feature_id, "f0");
    }
}
