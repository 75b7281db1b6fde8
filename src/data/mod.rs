//! Data structures for metabolomics intensity tables.

mod contrast;
mod feature_id;
mod intensity;
mod reshape;
mod table;

pub use contrast::Contrast;
pub use feature_id::FeatureId;
pub use intensity::{IntensityMatrix, Sample, SampleRecord};
pub use reshape::{is_missing_token, reshape, LabelLocation, ReshapeOptions};
pub use table::RawTable;
