//! API request, response and error types

pub mod error;
pub mod json;
pub mod prediction;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use prediction::{
    PredictResponse, RecentPredictionsResponse, RecentQuery, DEFAULT_RECENT_LIMIT,
    MAX_RECENT_LIMIT,
};
