//! Feature definitions and ordered feature schemas

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::DomainError;

/// A single model input derived from a trip request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    PickupLatitude,
    PickupLongitude,
    DropoffLatitude,
    DropoffLongitude,
    PassengerCount,
    TripDistance,
    /// Hour of day of the pickup, 0-23
    PickupHour,
    /// Day of week of the pickup, Monday = 0
    PickupDayOfWeek,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::PickupLatitude,
        Feature::PickupLongitude,
        Feature::DropoffLatitude,
        Feature::DropoffLongitude,
        Feature::PassengerCount,
        Feature::TripDistance,
        Feature::PickupHour,
        Feature::PickupDayOfWeek,
    ];

    /// Column name used by the training pipeline
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::PickupLatitude => "pickup_latitude",
            Feature::PickupLongitude => "pickup_longitude",
            Feature::DropoffLatitude => "dropoff_latitude",
            Feature::DropoffLongitude => "dropoff_longitude",
            Feature::PassengerCount => "passenger_count",
            Feature::TripDistance => "trip_distance",
            Feature::PickupHour => "pickup_hour",
            Feature::PickupDayOfWeek => "pickup_dayofweek",
        }
    }

    /// Whether the feature needs the pickup timestamp
    pub fn is_time_derived(&self) -> bool {
        matches!(self, Feature::PickupHour | Feature::PickupDayOfWeek)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Feature {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pickup_latitude" | "pickup_lat" => Ok(Feature::PickupLatitude),
            "pickup_longitude" | "pickup_lon" => Ok(Feature::PickupLongitude),
            "dropoff_latitude" | "dropoff_lat" => Ok(Feature::DropoffLatitude),
            "dropoff_longitude" | "dropoff_lon" => Ok(Feature::DropoffLongitude),
            "passenger_count" => Ok(Feature::PassengerCount),
            "trip_distance" => Ok(Feature::TripDistance),
            "pickup_hour" => Ok(Feature::PickupHour),
            "pickup_dayofweek" | "pickup_day_of_week" => Ok(Feature::PickupDayOfWeek),
            other => Err(DomainError::configuration(format!(
                "Unknown feature '{}'. Valid features: {}",
                other,
                Feature::ALL
                    .iter()
                    .map(Feature::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Ordered list of features a model was trained on.
///
/// The order is part of the model contract: element `i` of every feature
/// vector is the value of `features[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    features: Vec<Feature>,
}

impl FeatureSchema {
    /// Creates a schema, rejecting empty or duplicated feature lists
    pub fn new(features: Vec<Feature>) -> Result<Self, DomainError> {
        if features.is_empty() {
            return Err(DomainError::configuration(
                "Feature schema must contain at least one feature",
            ));
        }

        let mut seen = HashSet::new();

        for feature in &features {
            if !seen.insert(*feature) {
                return Err(DomainError::configuration(format!(
                    "Feature '{}' appears more than once in the schema",
                    feature
                )));
            }
        }

        Ok(Self { features })
    }

    /// Parses a schema from training column names
    pub fn from_names<I, S>(names: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let features = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<Feature>, _>>()?;

        Self::new(features)
    }

    /// Input order of the deployed fare/ETA model
    pub fn serving_default() -> Self {
        Self {
            features: vec![
                Feature::PickupLatitude,
                Feature::PickupLongitude,
                Feature::DropoffLatitude,
                Feature::DropoffLongitude,
                Feature::PassengerCount,
                Feature::TripDistance,
            ],
        }
    }

    /// Input order of the log trip duration regression
    pub fn trip_duration() -> Self {
        Self {
            features: vec![
                Feature::PassengerCount,
                Feature::PickupLongitude,
                Feature::PickupLatitude,
                Feature::DropoffLongitude,
                Feature::DropoffLatitude,
                Feature::PickupHour,
                Feature::PickupDayOfWeek,
            ],
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(Feature::as_str).collect()
    }

    /// Whether any feature needs the pickup timestamp
    pub fn uses_pickup_time(&self) -> bool {
        self.features.iter().any(Feature::is_time_derived)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::serving_default()
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}
