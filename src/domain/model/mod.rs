//! Model domain - Regression model contract and invocation

mod invoker;
mod regressor;

pub use invoker::ModelInvoker;
pub use regressor::{ModelHandle, ModelSource, Regressor};

#[cfg(test)]
pub use regressor::fixtures;
