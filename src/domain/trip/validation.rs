//! Trip field validation utilities

use std::fmt;

use chrono::{DateTime, NaiveDateTime};

use crate::domain::DomainError;

/// Largest valid absolute latitude in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Largest valid absolute longitude in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Accepted naive timestamp layouts, tried after RFC 3339
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Trip validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum TripValidationError {
    /// A numeric field is NaN or infinite
    NonFiniteValue { field: &'static str },
    /// Latitude outside -90..=90
    LatitudeOutOfRange { field: &'static str, value: f64 },
    /// Longitude outside -180..=180
    LongitudeOutOfRange { field: &'static str, value: f64 },
    /// Passenger count is zero, negative or too large
    InvalidPassengerCount { value: i64 },
    /// Trip distance is negative
    NegativeDistance { value: f64 },
    /// Pickup timestamp could not be parsed
    InvalidTimestamp { value: String },
}

impl TripValidationError {
    /// Name of the offending request field
    pub fn field(&self) -> &'static str {
        match self {
            Self::NonFiniteValue { field }
            | Self::LatitudeOutOfRange { field, .. }
            | Self::LongitudeOutOfRange { field, .. } => field,
            Self::InvalidPassengerCount { .. } => "passenger_count",
            Self::NegativeDistance { .. } => "trip_distance",
            Self::InvalidTimestamp { .. } => "pickup_datetime",
        }
    }
}

impl fmt::Display for TripValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteValue { field } => write!(f, "{} must be a finite number", field),
            Self::LatitudeOutOfRange { field, value } => write!(
                f,
                "Invalid {} {}: must be between {} and {}",
                field, value, -MAX_LATITUDE, MAX_LATITUDE
            ),
            Self::LongitudeOutOfRange { field, value } => write!(
                f,
                "Invalid {} {}: must be between {} and {}",
                field, value, -MAX_LONGITUDE, MAX_LONGITUDE
            ),
            Self::InvalidPassengerCount { value } => {
                write!(f, "Invalid passenger_count {}: must be a positive integer", value)
            }
            Self::NegativeDistance { value } => {
                write!(f, "Invalid trip_distance {}: must not be negative", value)
            }
            Self::InvalidTimestamp { value } => write!(
                f,
                "Invalid pickup_datetime '{}': expected RFC 3339 or YYYY-MM-DDTHH:MM:SS",
                value
            ),
        }
    }
}

impl std::error::Error for TripValidationError {}

impl From<TripValidationError> for DomainError {
    fn from(err: TripValidationError) -> Self {
        DomainError::invalid_input(err.to_string())
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<f64, TripValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TripValidationError::NonFiniteValue { field })
    }
}

/// Validates a latitude in degrees
pub fn validate_latitude(field: &'static str, value: f64) -> Result<f64, TripValidationError> {
    let value = ensure_finite(field, value)?;

    if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&value) {
        return Err(TripValidationError::LatitudeOutOfRange { field, value });
    }

    Ok(value)
}

/// Validates a longitude in degrees
pub fn validate_longitude(field: &'static str, value: f64) -> Result<f64, TripValidationError> {
    let value = ensure_finite(field, value)?;

    if !(-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&value) {
        return Err(TripValidationError::LongitudeOutOfRange { field, value });
    }

    Ok(value)
}

/// Validates the passenger count, which must be a positive integer
pub fn validate_passenger_count(value: i64) -> Result<u32, TripValidationError> {
    if value < 1 {
        return Err(TripValidationError::InvalidPassengerCount { value });
    }

    u32::try_from(value).map_err(|_| TripValidationError::InvalidPassengerCount { value })
}

/// Validates the trip distance, which must be finite and non-negative
pub fn validate_trip_distance(value: f64) -> Result<f64, TripValidationError> {
    let value = ensure_finite("trip_distance", value)?;

    if value < 0.0 {
        return Err(TripValidationError::NegativeDistance { value });
    }

    // -0.0 and 0.0 are the same distance
    Ok(if value == 0.0 { 0.0 } else { value })
}

/// Parses a pickup timestamp.
///
/// RFC 3339 values are converted to UTC wall-clock time; naive values are taken
/// as-is, which is how the training data stores them.
pub fn parse_pickup_datetime(value: &str) -> Result<NaiveDateTime, TripValidationError> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_utc());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TripValidationError::InvalidTimestamp {
            value: value.to_string(),
        })
}
