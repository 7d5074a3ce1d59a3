//! Model infrastructure - Artifact formats and loaders

mod linear;
mod loader;

pub use linear::{LinearModelArtifact, LinearRegressor, TargetTransform};
pub use loader::FileModelSource;
