//! Pipeline runner: load, reshape, normalize, estimate effects, project power.

use super::config::{AnalysisConfig, Delimiter, SampleRange};
use crate::data::{reshape, Contrast, IntensityMatrix, LabelLocation, RawTable};
use crate::effect::{effect_sizes, EffectCorrection, InsufficientPolicy};
use crate::error::{MetaPowerError, Result};
use crate::normalize::norm_median;
use crate::power::{power_curve, sample_size_table, TwoSampleTTest};
use crate::profile::profile_intensity;
use crate::report::{AnalysisReport, GroupCount, ObservedProjection};
use std::path::Path;

/// Builder for configuring and running an analysis.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    /// Create a pipeline with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a config.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Set the analysis name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Read group labels from the row named `name`.
    pub fn label_row(mut self, name: &str) -> Self {
        self.config.input.reshape.label = LabelLocation::Row(name.to_string());
        self
    }

    /// Read group labels from the column named `name`.
    pub fn label_column(mut self, name: &str) -> Self {
        self.config.input.reshape.label = LabelLocation::Column(name.to_string());
        self
    }

    /// Compare `case` against `control`.
    pub fn contrast(mut self, case: &str, control: &str) -> Self {
        self.config.contrast.case = Some(case.to_string());
        self.config.contrast.control = Some(control.to_string());
        self
    }

    /// Set only the case group; the control is inferred unless also set.
    pub fn case(mut self, case: &str) -> Self {
        self.config.contrast.case = Some(case.to_string());
        self
    }

    /// Set only the control group.
    pub fn control(mut self, control: &str) -> Self {
        self.config.contrast.control = Some(control.to_string());
        self
    }

    /// Apply a small-sample correction to the effect sizes.
    pub fn correction(mut self, correction: EffectCorrection) -> Self {
        self.config.effect.correction = correction;
        self
    }

    /// Choose what happens to features without a computable effect size.
    pub fn on_insufficient(mut self, policy: InsufficientPolicy) -> Self {
        self.config.effect.on_insufficient = policy;
        self
    }

    /// Significance level of the projected test.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.power.alpha = alpha;
        self
    }

    /// Desired power of the follow-up study.
    pub fn power_target(mut self, power: f64) -> Self {
        self.config.power.power_target = power;
        self
    }

    /// Effect sizes to tabulate.
    pub fn effect_sizes(mut self, effect_sizes: &[f64]) -> Self {
        self.config.power.effect_sizes = effect_sizes.to_vec();
        self
    }

    /// Per-group sample sizes for the power curve.
    pub fn sample_sizes(mut self, min: usize, max: usize, step: usize) -> Self {
        self.config.power.sample_sizes = SampleRange { min, max, step };
        self
    }

    /// Run on a table file; the delimiter comes from the config or the extension.
    pub fn run_path<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisReport> {
        let path = path.as_ref();
        let delimiter = self
            .config
            .input
            .delimiter
            .unwrap_or_else(|| Delimiter::from_path(path));
        let table = RawTable::from_path(path, delimiter.as_byte())?;
        self.run_table(&table)
    }

    /// Run on a loaded table.
    pub fn run_table(&self, table: &RawTable) -> Result<AnalysisReport> {
        let matrix = reshape(table, &self.config.input.reshape)?;
        self.run_matrix(&matrix)
    }

    /// Run on an already reshaped matrix.
    pub fn run_matrix(&self, matrix: &IntensityMatrix) -> Result<AnalysisReport> {
        let config = &self.config;
        config.validate()?;
        log::info!("Running analysis '{}'", config.name);

        let contrast = Contrast::resolve(
            matrix,
            config.contrast.case.as_deref(),
            config.contrast.control.as_deref(),
        )?;
        let (n_case, n_control) = group_sizes_of(matrix, &contrast);
        let group_sizes = vec![
            GroupCount {
                label: contrast.case.clone(),
                n: n_case,
            },
            GroupCount {
                label: contrast.control.clone(),
                n: n_control,
            },
        ];

        let raw_profile = profile_intensity(matrix);
        let normalized = norm_median(matrix)?;
        let normalized_profile = profile_intensity(&normalized.matrix);

        let effects = effect_sizes(&normalized.matrix, &contrast, &config.effect)?;
        let representative = effects.mean_abs().ok_or_else(|| {
            MetaPowerError::EmptyData("no feature has a computable effect size".to_string())
        })?;
        log::info!(
            "Representative effect size (mean |d|): {:.4} over {} features",
            representative,
            effects.len()
        );

        let test = TwoSampleTTest::new(config.power.alpha)?;
        let mut tabulated = config.power.effect_sizes.clone();
        if config.power.include_observed
            && representative > 0.0
            && !tabulated.iter().any(|d| (d - representative).abs() < 1e-12)
        {
            tabulated.push(representative);
        }
        tabulated.sort_by(|a, b| a.total_cmp(b));

        let sample_sizes = sample_size_table(&test, &tabulated, config.power.power_target)?;
        let curve = power_curve(&test, &tabulated, &config.power.sample_sizes.values())?;

        let observed = if representative > 0.0 {
            let n = test.required_n(representative, config.power.power_target)?;
            Some(ObservedProjection {
                effect_size: representative,
                power_target: config.power.power_target,
                n_per_group: n,
                achieved_power: test.achieved_power(representative, n)?,
                current_power: current_power(&test, representative, n_case.min(n_control))?,
            })
        } else {
            None
        };

        Ok(AnalysisReport {
            name: config.name.clone(),
            contrast,
            n_samples: matrix.n_samples(),
            n_features: matrix.n_features(),
            group_sizes,
            sample_medians: normalized.medians.clone(),
            raw_profile,
            normalized_profile,
            effects,
            observed,
            sample_size_table: sample_sizes,
            power_curve: curve,
        })
    }
}

fn group_sizes_of(matrix: &IntensityMatrix, contrast: &Contrast) -> (usize, usize) {
    (
        matrix.group_indices(&contrast.case).len(),
        matrix.group_indices(&contrast.control).len(),
    )
}

/// Power of the current design, using the smaller group as the per-group size.
fn current_power(test: &TwoSampleTTest, effect_size: f64, n: usize) -> Result<Option<f64>> {
    if n < 2 {
        return Ok(None);
    }
    test.achieved_power(effect_size, n).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SampleRecord;
    use approx::assert_relative_eq;

    fn create_test_matrix() -> IntensityMatrix {
        // Feature f0 is shifted by one pooled SD after normalization; the
        // remaining features pin every sample median to 10.
        let rows = vec![
            ("KO1", "KO", [12.0, 10.0, 10.0, 10.0, 1.0]),
            ("KO2", "KO", [13.0, 10.0, 10.0, 10.0, 1.0]),
            ("KO3", "KO", [14.0, 10.0, 10.0, 10.0, 1.0]),
            ("WT1", "WT", [11.0, 10.0, 10.0, 10.0, 2.0]),
            ("WT2", "WT", [12.0, 10.0, 10.0, 10.0, 2.0]),
            ("WT3", "WT", [13.0, 10.0, 10.0, 10.0, 2.0]),
        ];
        let records = rows
            .into_iter()
            .map(|(id, label, values)| SampleRecord {
                id: id.to_string(),
                label: label.to_string(),
                intensities: values.to_vec(),
            })
            .collect();
        IntensityMatrix::from_records((0..5).map(|j| format!("f{}", j)).collect(), records)
            .unwrap()
    }

    #[test]
    fn test_run_matrix() {
        let report = Pipeline::new()
            .name("unit")
            .contrast("KO", "WT")
            .effect_sizes(&[0.5, 1.0])
            .sample_sizes(2, 20, 1)
            .run_matrix(&create_test_matrix())
            .unwrap();

        assert_eq!(report.name, "unit");
        assert_eq!(report.n_samples, 6);
        assert_eq!(report.group_sizes[0].n, 3);
        assert_eq!(report.sample_medians, vec![10.0; 6]);

        // f1..f3 are constant and skipped; f4 is constant within groups.
        assert_eq!(report.effects.len(), 1);
        assert_relative_eq!(report.effects.get_feature("f0").unwrap().d, 1.0, epsilon = 1e-12);

        let observed = report.observed.as_ref().unwrap();
        assert_relative_eq!(observed.effect_size, 1.0, epsilon = 1e-12);
        assert_eq!(observed.n_per_group, 17);
        assert!(observed.current_power.unwrap() < 0.8);

        // Observed |d| equals a tabulated value, so it is not added twice.
        assert_eq!(report.sample_size_table.rows.len(), 2);
        assert_eq!(report.power_curve.points.len(), 2 * 19);
    }

    #[test]
    fn test_observed_effect_is_tabulated() {
        let report = Pipeline::new()
            .contrast("KO", "WT")
            .effect_sizes(&[0.2, 0.5])
            .run_matrix(&create_test_matrix())
            .unwrap();
        let effects: Vec<f64> = report
            .sample_size_table
            .rows
            .iter()
            .map(|r| r.effect_size)
            .collect();
        assert_eq!(effects.len(), 3);
        assert_relative_eq!(effects[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_computable_effects() {
        let pipeline = Pipeline::new()
            .contrast("KO", "WT")
            .on_insufficient(InsufficientPolicy::SkipAndWarn);
        let records = (0..4)
            .map(|i| SampleRecord {
                id: format!("S{}", i),
                label: if i < 2 { "KO" } else { "WT" }.to_string(),
                intensities: vec![5.0, 5.0],
            })
            .collect();
        let matrix =
            IntensityMatrix::from_records(vec!["a".into(), "b".into()], records).unwrap();
        let err = pipeline.run_matrix(&matrix).unwrap_err();
        assert!(matches!(err, MetaPowerError::EmptyData(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Pipeline::new()
            .alpha(2.0)
            .run_matrix(&create_test_matrix())
            .unwrap_err();
        assert!(matches!(err, MetaPowerError::InvalidParameter(_)));
    }
}
