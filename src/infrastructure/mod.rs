//! Infrastructure layer - Store, model and observability implementations

pub mod audit;
pub mod cache;
pub mod logging;
pub mod model;
pub mod observability;
pub mod services;
