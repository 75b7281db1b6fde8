//! Reshaping a loaded table into per-sample intensity records.
//!
//! The loaded table is features × samples with one extra row carrying the
//! group label of each sample. Reshaping transposes it to samples × features,
//! lifts the labels out into the sample records and converts every remaining
//! cell to a number.

use crate::data::intensity::{IntensityMatrix, Sample};
use crate::data::table::RawTable;
use crate::error::{MetaPowerError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Where the group labels live in the loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLocation {
    /// A row with this identifier; the table is features × samples.
    Row(String),
    /// A column with this header; the table is already samples × features.
    Column(String),
}

impl Default for LabelLocation {
    fn default() -> Self {
        LabelLocation::Row("Label".to_string())
    }
}

/// Options for [`reshape`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshapeOptions {
    /// Location of the group labels, written as `{row: <name>}` or
    /// `{column: <name>}`.
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub label: LabelLocation,
}

impl ReshapeOptions {
    /// Labels stored in the row named `name`.
    pub fn label_row(name: &str) -> Self {
        Self {
            label: LabelLocation::Row(name.to_string()),
        }
    }

    /// Labels stored in the column named `name`.
    pub fn label_column(name: &str) -> Self {
        Self {
            label: LabelLocation::Column(name.to_string()),
        }
    }
}

/// Cell values treated as missing intensities.
pub fn is_missing_token(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty()
        || ["na", "nan", "n/a", "null"]
            .iter()
            .any(|t| raw.eq_ignore_ascii_case(t))
}

/// Reshape a loaded table into a samples × features intensity matrix.
pub fn reshape(table: &RawTable, options: &ReshapeOptions) -> Result<IntensityMatrix> {
    match &options.label {
        LabelLocation::Row(name) => {
            if table.find_row(name).is_none() {
                return Err(MetaPowerError::MissingLabel(format!(
                    "no row named '{}' in the input table",
                    name
                )));
            }
            samples_by_features(&table.transpose(), name)
        }
        LabelLocation::Column(name) => samples_by_features(table, name),
    }
}

/// Convert a samples × features table whose column `label_name` holds labels.
fn samples_by_features(table: &RawTable, label_name: &str) -> Result<IntensityMatrix> {
    let label_col = table.find_column(label_name).ok_or_else(|| {
        MetaPowerError::MissingLabel(format!("no column named '{}' in the input table", label_name))
    })?;

    let feature_cols: Vec<usize> = (1..table.n_cols()).filter(|&c| c != label_col).collect();
    if feature_cols.is_empty() {
        return Err(MetaPowerError::EmptyData(
            "table has a label but no feature columns".to_string(),
        ));
    }
    let feature_ids: Vec<String> = feature_cols
        .iter()
        .map(|&c| table.header()[c].clone())
        .collect();

    let n_samples = table.n_rows();
    let mut data = DMatrix::from_element(n_samples, feature_cols.len(), f64::NAN);
    let mut samples = Vec::with_capacity(n_samples);

    for (i, row) in table.rows().iter().enumerate() {
        let sample_id = row[0].clone();
        let label = row[label_col].trim();
        if label.is_empty() {
            return Err(MetaPowerError::MissingLabel(format!(
                "sample '{}' has no group label",
                sample_id
            )));
        }

        for (j, &c) in feature_cols.iter().enumerate() {
            data[(i, j)] = parse_intensity(&row[c], &sample_id, &feature_ids[j])?;
        }

        samples.push(Sample {
            id: sample_id,
            label: label.to_string(),
        });
    }

    let matrix = IntensityMatrix::new(data, samples, feature_ids)?;
    log::info!(
        "Reshaped to {} samples x {} features ({} missing cells)",
        matrix.n_samples(),
        matrix.n_features(),
        matrix.n_missing()
    );
    Ok(matrix)
}

fn parse_intensity(raw: &str, sample: &str, feature: &str) -> Result<f64> {
    if is_missing_token(raw) {
        return Ok(f64::NAN);
    }
    let value: f64 = raw
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| MetaPowerError::TypeConversion {
            value: raw.to_string(),
            sample: sample.to_string(),
            feature: feature.to_string(),
        })?;
    if value < 0.0 {
        return Err(MetaPowerError::InvalidIntensity {
            value,
            sample: sample.to_string(),
            feature: feature.to_string(),
        });
    }
    Ok(value)
}
