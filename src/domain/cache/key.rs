//! Cache key generation
//!
//! Keys are SHA-256 digests of a canonical text form of the cache-relevant
//! request fields. Canonicalization sorts object keys, drops nulls (so an
//! absent field and an explicit `null` hash the same) and renders every number
//! as a fixed-precision decimal, which makes the digest independent of field
//! order, number spelling and process.

use std::fmt;

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use sha2::{Digest, Sha256};

use crate::domain::trip::TripRequest;

/// Decimal places kept when rendering numbers (about 0.1 m for coordinates)
pub const FLOAT_DECIMALS: usize = 6;

/// Length of a rendered key in hex characters
pub const CACHE_KEY_LEN: usize = 64;

/// Digest identifying a set of cache-relevant request fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes an already canonical string
    pub fn from_canonical(canonical: &str) -> Self {
        Self(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Renders a float with fixed precision, folding negative zero into zero
pub fn canonical_float(value: f64) -> String {
    let rendered = format!("{:.*}", FLOAT_DECIMALS, value);

    if rendered.starts_with('-') && rendered[1..].chars().all(|c| c == '0' || c == '.') {
        rendered[1..].to_string()
    } else {
        rendered
    }
}

fn canonical_number(number: &Number) -> String {
    match number.as_f64() {
        Some(value) => canonical_float(value),
        None => number.to_string(),
    }
}

/// Returns the canonical text form of a JSON value
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&canonical_number(number)),
        Value::String(_) => out.push_str(&value.to_string()),
        Value::Array(items) => {
            out.push('[');

            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }

            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| !v.is_null()).collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');

            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }

            out.push('}');
        }
    }
}

/// Hashes any JSON mapping of cache-relevant fields
pub fn hash_value(value: &Value) -> CacheKey {
    CacheKey::from_canonical(&canonical_json(value))
}

/// Produces cache keys for trip requests.
///
/// Only location, passenger and distance fields take part; the caller id and
/// raw pickup timestamp never do. Models that read the pickup time get the
/// derived hour and weekday added so their entries stay distinct.
#[derive(Debug, Clone, Default)]
pub struct RequestHasher {
    include_pickup_time: bool,
}

impl RequestHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds pickup hour and weekday to the key
    pub fn with_pickup_time(mut self) -> Self {
        self.include_pickup_time = true;
        self
    }

    /// The fields that identify a request for caching
    pub fn cache_fields(&self, request: &TripRequest) -> Value {
        let mut fields = json!({
            "pickup_latitude": request.pickup_latitude(),
            "pickup_longitude": request.pickup_longitude(),
            "dropoff_latitude": request.dropoff_latitude(),
            "dropoff_longitude": request.dropoff_longitude(),
            "passenger_count": request.passenger_count(),
            "trip_distance": request.trip_distance(),
        });

        if self.include_pickup_time {
            if let (Some(pickup), Value::Object(map)) = (request.pickup_datetime(), &mut fields) {
                map.insert("pickup_hour".to_string(), json!(pickup.hour()));
                map.insert(
                    "pickup_dayofweek".to_string(),
                    json!(pickup.weekday().num_days_from_monday()),
                );
            }
        }

        fields
    }

    pub fn hash(&self, request: &TripRequest) -> CacheKey {
        hash_value(&self.cache_fields(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midtown_trip() -> TripRequest {
        TripRequest::builder()
            .pickup(40.7589, -73.9851)
            .dropoff(40.7614, -73.9776)
            .passenger_count(1)
            .trip_distance(1.2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_hash_is_fixed_length_hex() {
        let key = RequestHasher::new().hash(&midtown_trip());

        assert_eq!(key.as_str().len(), CACHE_KEY_LEN);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_request_consistent() {
        let req = json!({"a": 1, "list": [1, 2, 3], "nested": {"b": "c"}});

        assert_eq!(hash_value(&req), hash_value(&req));
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let first: Value = serde_json::from_str(
            r#"{"pickup_latitude": 40.75, "passenger_count": 1, "nested": {"x": 1, "y": 2}}"#,
        )
        .unwrap();
        let second: Value = serde_json::from_str(
            r#"{"nested": {"y": 2, "x": 1}, "passenger_count": 1, "pickup_latitude": 40.75}"#,
        )
        .unwrap();

        assert_eq!(canonical_json(&first), canonical_json(&second));
        assert_eq!(hash_value(&first), hash_value(&second));
    }

    #[test]
    fn test_number_spellings_canonicalize_equally() {
        let a: Value = serde_json::from_str(r#"{"d": 1.0, "n": 1}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"d": 1.00, "n": 1.0}"#).unwrap();

        assert_eq!(canonical_json(&a), r#"{"d":1.000000,"n":1.000000}"#);
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn test_negative_zero_folds() {
        assert_eq!(canonical_float(-0.0), "0.000000");
        assert_eq!(canonical_float(-0.0000001), "0.000000");
        assert_eq!(canonical_float(-73.9851), "-73.985100");
    }

    #[test]
    fn test_null_equals_absent() {
        let with_null = json!({"a": 1, "b": null});
        let without = json!({"a": 1});

        assert_eq!(hash_value(&with_null), hash_value(&without));
    }

    #[test]
    fn test_array_order_matters() {
        assert_ne!(hash_value(&json!([1, 2])), hash_value(&json!([2, 1])));
    }

    #[test]
    fn test_relevant_field_change_changes_key() {
        let hasher = RequestHasher::new();
        let base = midtown_trip();
        let more_passengers = TripRequest::builder()
            .pickup(40.7589, -73.9851)
            .dropoff(40.7614, -73.9776)
            .passenger_count(2)
            .trip_distance(1.2)
            .build()
            .unwrap();

        assert_ne!(hasher.hash(&base), hasher.hash(&more_passengers));
    }

    #[test]
    fn test_user_and_timestamp_excluded() {
        let hasher = RequestHasher::new();
        let tagged = TripRequest::builder()
            .pickup(40.7589, -73.9851)
            .dropoff(40.7614, -73.9776)
            .passenger_count(1)
            .trip_distance(1.2)
            .user_id("rider-7")
            .pickup_datetime("2023-01-05T08:23:00")
            .build()
            .unwrap();

        assert_eq!(hasher.hash(&midtown_trip()), hasher.hash(&tagged));
    }

    #[test]
    fn test_pickup_time_hasher_buckets_by_hour() {
        let hasher = RequestHasher::new().with_pickup_time();
        let at = |ts: &str| {
            TripRequest::builder()
                .pickup(40.7589, -73.9851)
                .dropoff(40.7614, -73.9776)
                .passenger_count(1)
                .trip_distance(1.2)
                .pickup_datetime(ts)
                .build()
                .unwrap()
        };

        assert_eq!(
            hasher.hash(&at("2023-01-05T08:05:00")),
            hasher.hash(&at("2023-01-05T08:55:00"))
        );
        assert_ne!(
            hasher.hash(&at("2023-01-05T08:05:00")),
            hasher.hash(&at("2023-01-05T09:05:00"))
        );
    }
}
