//! Data profiling primitives for understanding intensity distributions.

mod intensity;

pub use intensity::{profile_intensity, IntensityProfile, SampleDistribution};
