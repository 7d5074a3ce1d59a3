//! Feature domain - Model input schema and feature engineering

mod builder;
mod schema;

pub use builder::{FeatureBuilder, FeatureVector};
pub use schema::{Feature, FeatureSchema};
