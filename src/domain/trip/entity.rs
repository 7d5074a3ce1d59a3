//! Trip request entity

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::validation::{
    parse_pickup_datetime, validate_latitude, validate_longitude, validate_passenger_count,
    validate_trip_distance, TripValidationError,
};

/// Caller identifier recorded when the request does not carry one
pub const ANONYMOUS_USER: &str = "anonymous";

/// Unvalidated trip fields as received on the wire.
///
/// Accepts both the long (`pickup_latitude`) and short (`pickup_lat`) field
/// spellings used by existing clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRequestFields {
    #[serde(alias = "pickup_lat")]
    pub pickup_latitude: f64,
    #[serde(alias = "pickup_lon")]
    pub pickup_longitude: f64,
    #[serde(alias = "dropoff_lat")]
    pub dropoff_latitude: f64,
    #[serde(alias = "dropoff_lon")]
    pub dropoff_longitude: f64,
    pub passenger_count: i64,
    pub trip_distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A validated trip prediction request.
///
/// Only constructible through validation, so every instance holds coordinates
/// within range, a positive passenger count and a non-negative distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TripRequestFields")]
pub struct TripRequest {
    pickup_latitude: f64,
    pickup_longitude: f64,
    dropoff_latitude: f64,
    dropoff_longitude: f64,
    passenger_count: u32,
    trip_distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pickup_datetime: Option<NaiveDateTime>,
    user_id: String,
}

impl TripRequest {
    pub fn builder() -> TripRequestBuilder {
        TripRequestBuilder::new()
    }

    pub fn pickup_latitude(&self) -> f64 {
        self.pickup_latitude
    }

    pub fn pickup_longitude(&self) -> f64 {
        self.pickup_longitude
    }

    pub fn dropoff_latitude(&self) -> f64 {
        self.dropoff_latitude
    }

    pub fn dropoff_longitude(&self) -> f64 {
        self.dropoff_longitude
    }

    pub fn passenger_count(&self) -> u32 {
        self.passenger_count
    }

    pub fn trip_distance(&self) -> f64 {
        self.trip_distance
    }

    pub fn pickup_datetime(&self) -> Option<NaiveDateTime> {
        self.pickup_datetime
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl TryFrom<TripRequestFields> for TripRequest {
    type Error = TripValidationError;

    fn try_from(fields: TripRequestFields) -> Result<Self, Self::Error> {
        let pickup_datetime = fields
            .pickup_datetime
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(parse_pickup_datetime)
            .transpose()?;

        let user_id = fields
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());

        Ok(Self {
            pickup_latitude: validate_latitude("pickup_latitude", fields.pickup_latitude)?,
            pickup_longitude: validate_longitude("pickup_longitude", fields.pickup_longitude)?,
            dropoff_latitude: validate_latitude("dropoff_latitude", fields.dropoff_latitude)?,
            dropoff_longitude: validate_longitude("dropoff_longitude", fields.dropoff_longitude)?,
            passenger_count: validate_passenger_count(fields.passenger_count)?,
            trip_distance: validate_trip_distance(fields.trip_distance)?,
            pickup_datetime,
            user_id,
        })
    }
}

/// Builder for TripRequest
#[derive(Debug, Default)]
pub struct TripRequestBuilder {
    fields: TripRequestFields,
}

impl TripRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pickup(mut self, latitude: f64, longitude: f64) -> Self {
        self.fields.pickup_latitude = latitude;
        self.fields.pickup_longitude = longitude;
        self
    }

    pub fn dropoff(mut self, latitude: f64, longitude: f64) -> Self {
        self.fields.dropoff_latitude = latitude;
        self.fields.dropoff_longitude = longitude;
        self
    }

    pub fn passenger_count(mut self, count: i64) -> Self {
        self.fields.passenger_count = count;
        self
    }

    pub fn trip_distance(mut self, distance: f64) -> Self {
        self.fields.trip_distance = distance;
        self
    }

    pub fn pickup_datetime(mut self, datetime: impl Into<String>) -> Self {
        self.fields.pickup_datetime = Some(datetime.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.fields.user_id = Some(user_id.into());
        self
    }

    pub fn build(self) -> Result<TripRequest, TripValidationError> {
        TripRequest::try_from(self.fields)
    }
}
