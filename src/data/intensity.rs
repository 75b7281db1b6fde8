//! Samples × features intensity matrix with per-sample group labels.

use crate::error::{MetaPowerError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identity of one sample: its identifier and group label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample identifier.
    pub id: String,
    /// Group label (e.g. knock-out / wild-type).
    pub label: String,
}

/// One sample with its intensities, in feature order.
///
/// Missing intensities are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub id: String,
    pub label: String,
    pub intensities: Vec<f64>,
}

/// Dense intensity matrix, rows are samples and columns are features.
///
/// Row `i` of the matrix always belongs to `samples[i]`; the two are only
/// ever built or replaced together.
#[derive(Debug, Clone)]
pub struct IntensityMatrix {
    data: DMatrix<f64>,
    samples: Vec<Sample>,
    feature_ids: Vec<String>,
}

impl IntensityMatrix {
    /// Create a matrix from dense data and identifiers.
    pub fn new(data: DMatrix<f64>, samples: Vec<Sample>, feature_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != samples.len() {
            return Err(MetaPowerError::DimensionMismatch {
                expected: nrows,
                actual: samples.len(),
            });
        }
        if ncols != feature_ids.len() {
            return Err(MetaPowerError::DimensionMismatch {
                expected: ncols,
                actual: feature_ids.len(),
            });
        }
        if nrows == 0 || ncols == 0 {
            return Err(MetaPowerError::EmptyData(
                "intensity matrix needs at least one sample and one feature".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(samples.len());
        for sample in &samples {
            if !seen.insert(sample.id.as_str()) {
                return Err(MetaPowerError::DuplicateSample(sample.id.clone()));
            }
        }

        Ok(Self {
            data,
            samples,
            feature_ids,
        })
    }

    /// Build a matrix from per-sample records.
    pub fn from_records(feature_ids: Vec<String>, records: Vec<SampleRecord>) -> Result<Self> {
        let n_features = feature_ids.len();
        let n_samples = records.len();
        let mut data = DMatrix::from_element(n_samples, n_features, f64::NAN);
        let mut samples = Vec::with_capacity(n_samples);

        for (i, record) in records.into_iter().enumerate() {
            if record.intensities.len() != n_features {
                return Err(MetaPowerError::DimensionMismatch {
                    expected: n_features,
                    actual: record.intensities.len(),
                });
            }
            for (j, &value) in record.intensities.iter().enumerate() {
                data[(i, j)] = value;
            }
            samples.push(Sample {
                id: record.id,
                label: record.label,
            });
        }

        Self::new(data, samples, feature_ids)
    }

    /// Replace the values, keeping samples and features.
    pub fn with_data(&self, data: DMatrix<f64>) -> Result<Self> {
        if data.shape() != self.data.shape() {
            return Err(MetaPowerError::DimensionMismatch {
                expected: self.data.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            samples: self.samples.clone(),
            feature_ids: self.feature_ids.clone(),
        })
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// Samples in row order.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Feature identifiers in column order.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers in row order.
    pub fn sample_ids(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.id.as_str()).collect()
    }

    /// Group labels in row order.
    pub fn labels(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.label.as_str()).collect()
    }

    /// Sorted distinct group labels.
    pub fn levels(&self) -> Vec<String> {
        let mut levels: Vec<String> = self
            .samples
            .iter()
            .map(|s| s.label.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        levels.sort();
        levels
    }

    /// Row indices of samples carrying `label`.
    pub fn group_indices(&self, label: &str) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.label == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Raw value at (sample, feature); `NaN` when missing.
    #[inline]
    pub fn value(&self, sample: usize, feature: usize) -> f64 {
        self.data[(sample, feature)]
    }

    /// Observed value at (sample, feature), `None` when missing.
    #[inline]
    pub fn get(&self, sample: usize, feature: usize) -> Option<f64> {
        let v = self.data[(sample, feature)];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Intensities of one sample.
    pub fn row(&self, sample: usize) -> Vec<f64> {
        self.data.row(sample).iter().copied().collect()
    }

    /// Intensities of one feature across samples.
    pub fn column(&self, feature: usize) -> Vec<f64> {
        self.data.column(feature).iter().copied().collect()
    }

    /// Number of missing cells.
    pub fn n_missing(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Underlying dense matrix (samples × features).
    #[inline]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Dense copy in the loaded orientation (features × samples).
    pub fn to_features_by_samples(&self) -> DMatrix<f64> {
        self.data.transpose()
    }

    /// Per-sample records in row order.
    pub fn records(&self) -> impl Iterator<Item = SampleRecord> + '_ {
        self.samples.iter().enumerate().map(move |(i, s)| SampleRecord {
            id: s.id.clone(),
            label: s.label.clone(),
            intensities: self.row(i),
        })
    }

    /// Keep only the samples at `indices`, in the given order.
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        let mut samples = Vec::with_capacity(indices.len());
        for &i in indices {
            let sample = self.samples.get(i).ok_or_else(|| {
                MetaPowerError::InvalidParameter(format!("sample index {} out of bounds", i))
            })?;
            samples.push(sample.clone());
        }
        let data = self.data.select_rows(indices);
        Self::new(data, samples, self.feature_ids.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, label: &str, intensities: Vec<f64>) -> SampleRecord {
        SampleRecord {
            id: id.to_string(),
            label: label.to_string(),
            intensities,
        }
    }

    fn create_test_matrix() -> IntensityMatrix {
        IntensityMatrix::from_records(
            vec!["f1".to_string(), "f2".to_string(), "f3".to_string()],
            vec![
                record("S1", "KO", vec![1.0, 2.0, 3.0]),
                record("S2", "WT", vec![4.0, f64::NAN, 6.0]),
                record("S3", "KO", vec![7.0, 8.0, 9.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let m = create_test_matrix();
        assert_eq!(m.n_samples(), 3);
        assert_eq!(m.n_features(), 3);
        assert_eq!(m.sample_ids(), vec!["S1", "S2", "S3"]);
        assert_eq!(m.labels(), vec!["KO", "WT", "KO"]);
    }

    #[test]
    fn test_missing_values() {
        let m = create_test_matrix();
        assert_eq!(m.get(1, 1), None);
        assert_eq!(m.get(1, 2), Some(6.0));
        assert_eq!(m.n_missing(), 1);
    }

    #[test]
    fn test_levels_and_groups() {
        let m = create_test_matrix();
        assert_eq!(m.levels(), vec!["KO", "WT"]);
        assert_eq!(m.group_indices("KO"), vec![0, 2]);
        assert_eq!(m.group_indices("WT"), vec![1]);
        assert!(m.group_indices("HET").is_empty());
    }

    #[test]
    fn test_records_keep_labels_with_rows() {
        let m = create_test_matrix();
        let records: Vec<SampleRecord> = m.records().collect();
        assert_eq!(records[2].id, "S3");
        assert_eq!(records[2].label, "KO");
        assert_eq!(records[2].intensities, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_subset_samples_moves_labels_with_rows() {
        let m = create_test_matrix();
        let sub = m.subset_samples(&[2, 1]).unwrap();
        assert_eq!(sub.sample_ids(), vec!["S3", "S2"]);
        assert_eq!(sub.labels(), vec!["KO", "WT"]);
        assert_eq!(sub.row(0), vec![7.0, 8.0, 9.0]);
        assert!(m.subset_samples(&[5]).is_err());
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        let m = create_test_matrix();
        let loaded_orientation = m.to_features_by_samples();
        assert_eq!(loaded_orientation.shape(), (3, 3));
        assert_eq!(loaded_orientation[(2, 0)], 3.0);

        let back = loaded_orientation.transpose();
        for i in 0..m.n_samples() {
            for j in 0..m.n_features() {
                let (a, b) = (back[(i, j)], m.value(i, j));
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
    }

    #[test]
    fn test_duplicate_sample_rejected() {
        let err = IntensityMatrix::from_records(
            vec!["f1".to_string()],
            vec![record("S1", "KO", vec![1.0]), record("S1", "WT", vec![2.0])],
        )
        .unwrap_err();
        assert!(matches!(err, MetaPowerError::DuplicateSample(id) if id == "S1"));
    }

    #[test]
    fn test_ragged_record_rejected() {
        let err = IntensityMatrix::from_records(
            vec!["f1".to_string(), "f2".to_string()],
            vec![record("S1", "KO", vec![1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, MetaPowerError::DimensionMismatch { .. }));
    }
}
