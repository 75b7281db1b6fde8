//! Power and sample-size projection for a two-sample comparison of means.
//!
//! - **noncentral_t**: CDF of the noncentral t distribution
//! - **ttest**: power model of the two-sided two-sample t-test
//! - **table**: samples-needed tables and power curves

pub mod noncentral_t;
pub mod table;
pub mod ttest;

pub use noncentral_t::{noncentral_t_cdf, normal_cdf};
pub use table::{power_curve, sample_size_table, PowerCurve, PowerPoint, SampleSizeRow, SampleSizeTable};
pub use ttest::{achieved_power, required_n, TwoSampleTTest, DEFAULT_ALPHA, DEFAULT_MAX_N};
