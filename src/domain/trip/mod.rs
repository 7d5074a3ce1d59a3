//! Trip domain - Validated prediction requests

mod entity;
mod validation;

pub use entity::{TripRequest, TripRequestBuilder, TripRequestFields, ANONYMOUS_USER};
pub use validation::{
    parse_pickup_datetime, validate_latitude, validate_longitude, validate_passenger_count,
    validate_trip_distance, TripValidationError, MAX_LATITUDE, MAX_LONGITUDE,
};
