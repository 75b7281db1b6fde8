//! Analysis configuration, loadable from YAML.

use crate::data::ReshapeOptions;
use crate::effect::EffectSizeConfig;
use crate::error::{MetaPowerError, Result};
use crate::power::DEFAULT_ALPHA;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field separator of the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }

    /// Guess from a file extension (`.tsv` / `.txt` are tab-separated).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt") => {
                Delimiter::Tab
            }
            _ => Delimiter::Comma,
        }
    }
}

/// How to read the input table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field separator; guessed from the file extension when absent.
    #[serde(default)]
    pub delimiter: Option<Delimiter>,
    #[serde(flatten)]
    pub reshape: ReshapeOptions,
}

/// Which groups to compare. Missing sides are inferred from the labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContrastConfig {
    #[serde(default)]
    pub case: Option<String>,
    #[serde(default)]
    pub control: Option<String>,
}

/// Inclusive range of per-group sample sizes for the power curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRange {
    pub min: usize,
    pub max: usize,
    #[serde(default = "default_step")]
    pub step: usize,
}

fn default_step() -> usize {
    1
}

impl Default for SampleRange {
    fn default() -> Self {
        Self {
            min: 2,
            max: 60,
            step: 1,
        }
    }
}

impl SampleRange {
    /// Expand into the list of sample sizes.
    pub fn values(&self) -> Vec<usize> {
        (self.min..=self.max).step_by(self.step.max(1)).collect()
    }
}

/// Power projection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Two-sided significance level.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Desired power of the follow-up study.
    #[serde(default = "default_power_target")]
    pub power_target: f64,
    /// Effect sizes tabulated in the samples-needed table and power curve.
    #[serde(default = "default_effect_sizes")]
    pub effect_sizes: Vec<f64>,
    /// Also tabulate the observed mean |d|.
    #[serde(default = "default_true")]
    pub include_observed: bool,
    /// Per-group sample sizes of the power curve.
    #[serde(default)]
    pub sample_sizes: SampleRange,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_power_target() -> f64 {
    0.8
}

fn default_effect_sizes() -> Vec<f64> {
    vec![0.2, 0.5, 0.8, 1.0, 1.2]
}

fn default_true() -> bool {
    true
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            power_target: default_power_target(),
            effect_sizes: default_effect_sizes(),
            include_observed: true,
            sample_sizes: SampleRange::default(),
        }
    }
}

/// Full configuration of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Name of the analysis.
    #[serde(default = "default_name")]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub contrast: ContrastConfig,
    #[serde(default)]
    pub effect: EffectSizeConfig,
    #[serde(default)]
    pub power: PowerConfig,
}

fn default_name() -> String {
    "unnamed".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            input: InputConfig::default(),
            contrast: ContrastConfig::default(),
            effect: EffectSizeConfig::default(),
            power: PowerConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(MetaPowerError::from)
    }

    /// Example configuration for a knock-out vs wild-type comparison.
    pub fn example() -> Self {
        Self {
            name: "ko-vs-wt".to_string(),
            description: Some(
                "Median-normalized Cohen's d and follow-up sample sizes".to_string(),
            ),
            contrast: ContrastConfig {
                case: Some("KO".to_string()),
                control: Some("WT".to_string()),
            },
            ..Default::default()
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let power = &self.power;
        if !(power.alpha > 0.0 && power.alpha < 1.0) {
            return Err(MetaPowerError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                power.alpha
            )));
        }
        if !(power.power_target > power.alpha && power.power_target < 1.0) {
            return Err(MetaPowerError::InvalidParameter(format!(
                "power target must be in ({}, 1), got {}",
                power.alpha, power.power_target
            )));
        }
        if let Some(d) = power.effect_sizes.iter().find(|d| !d.is_finite() || **d == 0.0) {
            return Err(MetaPowerError::InvalidParameter(format!(
                "tabulated effect sizes must be finite and non-zero, got {}",
                d
            )));
        }
        let range = &power.sample_sizes;
        if range.min < 2 || range.max < range.min || range.step == 0 {
            return Err(MetaPowerError::InvalidParameter(format!(
                "sample size range must satisfy 2 <= min <= max and step > 0, got {}..={} step {}",
                range.min, range.max, range.step
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LabelLocation;
    use crate::effect::{EffectCorrection, InsufficientPolicy};

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = AnalysisConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.power.alpha, 0.05);
        assert_eq!(config.power.sample_sizes.values().len(), 59);
        assert_eq!(config.input.reshape.label, LabelLocation::Row("Label".to_string()));
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
name: liver
input:
  delimiter: tab
  label:
    column: genotype
contrast:
  case: KO
effect:
  correction: hedges
  on_insufficient: fail
power:
  alpha: 0.01
  power_target: 0.9
  effect_sizes: [0.5, 1.5]
  include_observed: false
  sample_sizes:
    min: 4
    max: 20
    step: 4
"#;
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "liver");
        assert_eq!(config.input.delimiter, Some(Delimiter::Tab));
        assert_eq!(
            config.input.reshape.label,
            LabelLocation::Column("genotype".to_string())
        );
        assert_eq!(config.contrast.case.as_deref(), Some("KO"));
        assert_eq!(config.contrast.control, None);
        assert_eq!(config.effect.correction, EffectCorrection::Hedges);
        assert_eq!(config.effect.on_insufficient, InsufficientPolicy::Fail);
        assert_eq!(config.power.sample_sizes.values(), vec![4, 8, 12, 16, 20]);
        assert!(!config.power.include_observed);
    }

    #[test]
    fn test_example_roundtrip() {
        let example = AnalysisConfig::example();
        let yaml = example.to_yaml().unwrap();
        let parsed = AnalysisConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, example);
    }

    #[test]
    fn test_default_config_roundtrip() {
        let yaml = AnalysisConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("row: Label"));
        let parsed = AnalysisConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, AnalysisConfig::default());

        let mut by_column = AnalysisConfig::example();
        by_column.input.reshape = ReshapeOptions::label_column("genotype");
        by_column.input.delimiter = Some(Delimiter::Tab);
        let parsed = AnalysisConfig::from_yaml(&by_column.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, by_column);
    }

    #[test]
    fn test_validation() {
        assert!(AnalysisConfig::from_yaml("power:\n  alpha: 1.5\n").is_err());
        assert!(AnalysisConfig::from_yaml("power:\n  power_target: 0.01\n").is_err());
        assert!(AnalysisConfig::from_yaml("power:\n  effect_sizes: [0.0]\n").is_err());
        assert!(AnalysisConfig::from_yaml("power:\n  sample_sizes: {min: 1, max: 10}\n").is_err());
    }

    #[test]
    fn test_delimiter_from_path() {
        assert_eq!(Delimiter::from_path("data.tsv"), Delimiter::Tab);
        assert_eq!(Delimiter::from_path("data.CSV"), Delimiter::Comma);
        assert_eq!(Delimiter::from_path("data"), Delimiter::Comma);
    }
}
