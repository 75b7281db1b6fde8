//! Standardized effect sizes between two sample groups.

pub mod cohen;

pub use cohen::{
    cohens_d, effect_sizes, EffectCorrection, EffectSizeConfig, EffectSizeSet, EffectSizeSummary,
    FeatureEffect, GroupSummary, InsufficientPolicy, Magnitude, SkippedFeature,
};
