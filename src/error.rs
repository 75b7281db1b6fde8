//! Error types for the metapower library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum MetaPowerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cannot convert '{value}' to a number (sample '{sample}', feature '{feature}')")]
    TypeConversion {
        value: String,
        sample: String,
        feature: String,
    },

    #[error("Invalid intensity {value} (sample '{sample}', feature '{feature}'): intensities must be non-negative")]
    InvalidIntensity {
        value: f64,
        sample: String,
        feature: String,
    },

    #[error("Duplicate sample identifier '{0}'")]
    DuplicateSample(String),

    #[error("Label not found: {0}")]
    MissingLabel(String),

    #[error("Insufficient data for feature '{feature}': group '{group}' has {n} observations, need at least 2")]
    InsufficientData {
        feature: String,
        group: String,
        n: usize,
    },

    #[error("Zero pooled standard deviation for feature '{0}': effect size is undefined")]
    ZeroVariance(String),

    #[error("Sample '{sample}' has median intensity {median}, cannot normalize")]
    ZeroMedian { sample: String, median: f64 },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MetaPowerError>;
