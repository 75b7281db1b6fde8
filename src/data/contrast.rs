//! Two-group contrast between sample labels.

use crate::data::IntensityMatrix;
use crate::error::{MetaPowerError, Result};
use serde::{Deserialize, Serialize};

/// The two groups compared by an effect size.
///
/// Effect sizes are signed as `case − control`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contrast {
    /// Group in the numerator (e.g. knock-out).
    pub case: String,
    /// Reference group (e.g. wild-type).
    pub control: String,
}

impl Contrast {
    pub fn new(case: &str, control: &str) -> Self {
        Self {
            case: case.to_string(),
            control: control.to_string(),
        }
    }

    /// Derive a contrast from a matrix with exactly two label levels.
    ///
    /// The alphabetically first level is the control.
    pub fn from_levels(matrix: &IntensityMatrix) -> Result<Self> {
        let levels = matrix.levels();
        if levels.len() != 2 {
            return Err(MetaPowerError::InvalidParameter(format!(
                "expected exactly two group labels, found {}: {:?}",
                levels.len(),
                levels
            )));
        }
        Ok(Self::new(&levels[1], &levels[0]))
    }

    /// Resolve a contrast from optional case/control names.
    ///
    /// When only one side is given, the other is the remaining level; this
    /// needs exactly two labels in the matrix.
    pub fn resolve(
        matrix: &IntensityMatrix,
        case: Option<&str>,
        control: Option<&str>,
    ) -> Result<Self> {
        let contrast = match (case, control) {
            (Some(case), Some(control)) => Self::new(case, control),
            (None, None) => Self::from_levels(matrix)?,
            (Some(given), None) | (None, Some(given)) => {
                let levels = matrix.levels();
                if levels.len() != 2 {
                    return Err(MetaPowerError::InvalidParameter(format!(
                        "cannot infer the other group of '{}' from {} labels: {:?}",
                        given,
                        levels.len(),
                        levels
                    )));
                }
                let other = levels
                    .into_iter()
                    .find(|l| l != given)
                    .ok_or_else(|| {
                        MetaPowerError::MissingLabel(format!(
                            "no group label other than '{}'",
                            given
                        ))
                    })?;
                if case.is_some() {
                    Self::new(given, &other)
                } else {
                    Self::new(&other, given)
                }
            }
        };
        contrast.validate(matrix)?;
        Ok(contrast)
    }

    /// Check that both groups exist in the matrix and differ.
    pub fn validate(&self, matrix: &IntensityMatrix) -> Result<()> {
        if self.case == self.control {
            return Err(MetaPowerError::InvalidParameter(format!(
                "case and control are both '{}'",
                self.case
            )));
        }
        for group in [&self.case, &self.control] {
            if matrix.group_indices(group).is_empty() {
                return Err(MetaPowerError::MissingLabel(format!(
                    "no samples labelled '{}' (available: {:?})",
                    group,
                    matrix.levels()
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Contrast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vs {}", self.case, self.control)
    }
}
