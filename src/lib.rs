//! Metabolomics Effect Size and Power Projection Library
//!
//! This library turns an LC-MS feature intensity table from a two-group pilot
//! study into per-feature standardized effect sizes and projects how many
//! samples per group a follow-up study needs.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Raw tables, reshaping into sample rows, intensity matrices, contrasts
//! - **normalize**: Per-sample median normalization
//! - **effect**: Cohen's d (optionally Hedges-corrected) per feature
//! - **power**: Two-sample t-test power and sample-size projection
//! - **profile**: Intensity distribution profiling
//! - **report**: Text, TSV and JSON reports
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use metapower::prelude::*;
//!
//! // Features as rows, samples as columns, group labels in the "Label" row
//! let report = Pipeline::new()
//!     .label_row("Label")
//!     .contrast("KO", "WT")
//!     .power_target(0.8)
//!     .run_path("intensities.csv")
//!     .unwrap();
//!
//! println!("{}", report);
//!
//! // Or ask the power model directly
//! let n = required_n(0.736, 0.8).unwrap();
//! assert_eq!(n, 30);
//! ```

pub mod data;
pub mod effect;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod power;
pub mod profile;
pub mod report;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        reshape, Contrast, FeatureId, IntensityMatrix, LabelLocation, RawTable, ReshapeOptions,
        Sample, SampleRecord,
    };
    pub use crate::effect::{
        cohens_d, effect_sizes, EffectCorrection, EffectSizeConfig, EffectSizeSet,
        FeatureEffect, InsufficientPolicy, Magnitude,
    };
    pub use crate::error::{MetaPowerError, Result};
    pub use crate::normalize::{norm_median, MedianNormalized};
    pub use crate::pipeline::{AnalysisConfig, Pipeline};
    pub use crate::power::{
        achieved_power, power_curve, required_n, sample_size_table, PowerCurve, SampleSizeTable,
        TwoSampleTTest,
    };
    pub use crate::profile::{profile_intensity, IntensityProfile};
    pub use crate::report::{write_report, AnalysisReport, OutputFormat};
}
