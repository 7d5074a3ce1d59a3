//! Conversion of trip requests into model feature vectors

use chrono::{Datelike, Timelike};

use crate::domain::trip::TripRequest;
use crate::domain::DomainError;

use super::schema::{Feature, FeatureSchema};

/// Fixed-order numeric model input
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds feature vectors in the order fixed by a schema.
///
/// Pure and stateless apart from the schema, so a single instance is shared
/// by all requests.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    schema: FeatureSchema,
}

impl FeatureBuilder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Length of every vector this builder produces
    pub fn dimension(&self) -> usize {
        self.schema.len()
    }

    /// Featurizes a request.
    ///
    /// Fails with `InvalidInput` when the schema needs the pickup timestamp and
    /// the request has none.
    pub fn featurize(&self, request: &TripRequest) -> Result<FeatureVector, DomainError> {
        let values = self
            .schema
            .features()
            .iter()
            .map(|feature| feature_value(*feature, request))
            .collect::<Result<Vec<f64>, DomainError>>()?;

        Ok(FeatureVector::new(values))
    }
}

fn feature_value(feature: Feature, request: &TripRequest) -> Result<f64, DomainError> {
    let value = match feature {
        Feature::PickupLatitude => request.pickup_latitude(),
        Feature::PickupLongitude => request.pickup_longitude(),
        Feature::DropoffLatitude => request.dropoff_latitude(),
        Feature::DropoffLongitude => request.dropoff_longitude(),
        Feature::PassengerCount => f64::from(request.passenger_count()),
        Feature::TripDistance => request.trip_distance(),
        Feature::PickupHour => f64::from(require_pickup_time(feature, request)?.hour()),
        Feature::PickupDayOfWeek => f64::from(
            require_pickup_time(feature, request)?
                .weekday()
                .num_days_from_monday(),
        ),
    };

    Ok(value)
}

fn require_pickup_time(
    feature: Feature,
    request: &TripRequest,
) -> Result<chrono::NaiveDateTime, DomainError> {
    request.pickup_datetime().ok_or_else(|| {
        DomainError::invalid_input(format!(
            "pickup_datetime is required to compute feature '{}'",
            feature
        ))
    })
}
