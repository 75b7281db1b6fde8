//! Pipeline composition and execution for the power analysis.

mod config;
mod runner;

pub use config::{
    AnalysisConfig, ContrastConfig, Delimiter, InputConfig, PowerConfig, SampleRange,
};
pub use runner::Pipeline;
