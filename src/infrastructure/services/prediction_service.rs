//! Cache-aside prediction orchestration

use std::fmt::Debug;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument, warn, Span};

use crate::domain::audit::AuditRecord;
use crate::domain::cache::{CacheKey, CacheLookup, CachedPrediction, RequestHasher};
use crate::domain::features::FeatureBuilder;
use crate::domain::model::ModelInvoker;
use crate::domain::trip::TripRequest;
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_prediction, record_prediction_failure, record_store_error,
};

use super::audit_service::AuditService;
use super::prediction_cache_service::PredictionCacheService;

/// Result of one served prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub prediction: f64,
    pub cached: bool,
    pub cache_key: CacheKey,
    pub model_version: String,
    pub served_at: DateTime<Utc>,
}

/// Reachability of one fail-open dependency
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyStatus {
    pub backend: &'static str,
    pub error: Option<String>,
}

impl DependencyStatus {
    fn from_result(backend: &'static str, result: Result<(), DomainError>) -> Self {
        Self {
            backend,
            error: result.err().map(|e| e.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Readiness snapshot of the prediction pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyReport {
    pub model_loaded: bool,
    pub model_version: Option<String>,
    pub cache: DependencyStatus,
    pub audit: DependencyStatus,
}

/// Trait for prediction service (for dynamic dispatch in AppState)
#[async_trait]
pub trait PredictionServiceTrait: Send + Sync + Debug {
    fn model_loaded(&self) -> bool;

    fn model_version(&self) -> Option<String>;

    /// Serves one prediction through the cache-aside pipeline
    async fn predict(&self, request: TripRequest) -> Result<PredictionOutcome, DomainError>;

    /// Most recent audit records, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, DomainError>;

    /// Pings the cache and audit stores
    async fn check_dependencies(&self) -> DependencyReport;
}

/// Composes hashing, cache lookup, featurization, model invocation and
/// persistence for each request.
///
/// Holds only read-only state and store handles, so one instance serves all
/// requests concurrently. Concurrent misses for the same key may each invoke
/// the model and write the cache; both writes carry the same value.
#[derive(Debug, Clone)]
pub struct PredictionService {
    hasher: RequestHasher,
    features: FeatureBuilder,
    invoker: ModelInvoker,
    cache: PredictionCacheService,
    audit: AuditService,
}

impl PredictionService {
    /// Builds the service; the hasher follows the feature schema so models
    /// reading the pickup time get time-aware keys.
    pub fn new(
        features: FeatureBuilder,
        invoker: ModelInvoker,
        cache: PredictionCacheService,
        audit: AuditService,
    ) -> Self {
        let hasher = if features.schema().uses_pickup_time() {
            RequestHasher::new().with_pickup_time()
        } else {
            RequestHasher::new()
        };

        Self {
            hasher,
            features,
            invoker,
            cache,
            audit,
        }
    }

    pub fn features(&self) -> &FeatureBuilder {
        &self.features
    }

    pub fn invoker(&self) -> &ModelInvoker {
        &self.invoker
    }

    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id(), cache_key, cache)
    )]
    pub async fn predict(&self, request: TripRequest) -> Result<PredictionOutcome, DomainError> {
        let started = Instant::now();
        let result = self.serve(request).await;

        match &result {
            Ok(outcome) => {
                record_prediction(outcome.cached, &outcome.model_version, started.elapsed());
            }
            Err(e) => {
                record_prediction_failure(e.kind());

                match e {
                    DomainError::InvalidInput { .. } => debug!(error = %e, "Rejected prediction request"),
                    DomainError::ModelUnavailable { .. } => warn!(error = %e, "Prediction refused"),
                    _ => error!(error = %e, "Prediction failed"),
                }
            }
        }

        result
    }

    async fn serve(&self, request: TripRequest) -> Result<PredictionOutcome, DomainError> {
        let model_version = self
            .invoker
            .version()
            .ok_or_else(|| DomainError::model_unavailable("No model is loaded"))?
            .to_string();

        let key = self.hasher.hash(&request);
        Span::current().record("cache_key", key.as_str());

        let lookup = self.cache.lookup(&model_version, &key).await;
        Span::current().record("cache", lookup.as_str());

        match lookup {
            CacheLookup::Found(cached) => {
                let outcome = PredictionOutcome {
                    prediction: cached.prediction,
                    cached: true,
                    cache_key: key,
                    model_version,
                    served_at: Utc::now(),
                };

                self.append_audit(request, &outcome).await;
                return Ok(outcome);
            }
            CacheLookup::Miss => {}
            CacheLookup::Unavailable(e) => {
                warn!(
                    store = self.cache.backend(),
                    cache_key = %key,
                    error = %e,
                    "Cache lookup failed, treating as miss"
                );
                record_store_error("cache", "lookup");
            }
        }

        let features = self.features.featurize(&request)?;
        let prediction = self.invoker.predict(&features)?;

        let outcome = PredictionOutcome {
            prediction,
            cached: false,
            cache_key: key,
            model_version,
            served_at: Utc::now(),
        };

        let entry = CachedPrediction::new(prediction, outcome.model_version.clone());
        let (cache_result, ()) = tokio::join!(
            self.cache.store(&outcome.cache_key, &entry),
            self.append_audit(request, &outcome),
        );

        if let Err(e) = cache_result {
            warn!(
                store = self.cache.backend(),
                cache_key = %outcome.cache_key,
                error = %e,
                "Cache write failed"
            );
            record_store_error("cache", "write");
        }

        Ok(outcome)
    }

    async fn append_audit(&self, request: TripRequest, outcome: &PredictionOutcome) {
        let record = AuditRecord::new(
            request,
            outcome.prediction,
            outcome.cached,
            outcome.cache_key.clone(),
            outcome.model_version.clone(),
            outcome.served_at,
        );

        if let Err(e) = self.audit.record(&record).await {
            warn!(
                store = self.audit.backend(),
                record_id = %record.id,
                cache_key = %outcome.cache_key,
                error = %e,
                "Audit append failed"
            );
            record_store_error("audit", "append");
        }
    }
}

#[async_trait]
impl PredictionServiceTrait for PredictionService {
    fn model_loaded(&self) -> bool {
        self.invoker.is_loaded()
    }

    fn model_version(&self) -> Option<String> {
        self.invoker.version().map(str::to_string)
    }

    async fn predict(&self, request: TripRequest) -> Result<PredictionOutcome, DomainError> {
        PredictionService::predict(self, request).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, DomainError> {
        self.audit.recent(limit).await
    }

    async fn check_dependencies(&self) -> DependencyReport {
        let (cache, audit) = tokio::join!(self.cache.ping(), self.audit.ping());

        DependencyReport {
            model_loaded: self.invoker.is_loaded(),
            model_version: self.model_version(),
            cache: DependencyStatus::from_result(self.cache.backend(), cache),
            audit: DependencyStatus::from_result(self.audit.backend(), audit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::{AuditLog, MockAuditLog};
    use crate::domain::cache::MockCacheStore;
    use crate::domain::features::FeatureSchema;
    use crate::domain::model::fixtures::SumRegressor;
    use crate::infrastructure::audit::InMemoryAuditLog;
    use std::sync::Arc;

    struct Harness {
        service: PredictionService,
        store: Arc<MockCacheStore>,
        audit: Arc<InMemoryAuditLog>,
        model: Arc<SumRegressor>,
    }

    fn harness_with_schema(schema: FeatureSchema) -> Harness {
        let store = Arc::new(MockCacheStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let model = Arc::new(SumRegressor::new(schema.len()).with_version("taxi_model:test"));

        let service = PredictionService::new(
            FeatureBuilder::new(schema),
            ModelInvoker::new(model.clone()),
            PredictionCacheService::new(store.clone()),
            AuditService::new(audit.clone()),
        );

        Harness {
            service,
            store,
            audit,
            model,
        }
    }

    fn harness() -> Harness {
        harness_with_schema(FeatureSchema::serving_default())
    }

    fn midtown_trip() -> TripRequest {
        TripRequest::builder()
            .pickup(40.7589, -73.9851)
            .dropoff(40.7614, -73.9776)
            .passenger_count(1)
            .trip_distance(1.2)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_cold_then_warm_request() {
        let h = harness();

        let first = h.service.predict(midtown_trip()).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.model_version, "taxi_model:test");

        let second = h.service.predict(midtown_trip()).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.prediction, first.prediction);
        assert_eq!(second.cache_key, first.cache_key);

        assert_eq!(h.model.calls(), 1);
        assert_eq!(h.store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_hits_are_audited() {
        let h = harness();

        h.service.predict(midtown_trip()).await.unwrap();
        h.service.predict(midtown_trip()).await.unwrap();

        let records = h.audit.recent(10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].cache_hit);
        assert!(!records[1].cache_hit);
        assert_eq!(records[0].prediction, records[1].prediction);
    }

    #[tokio::test]
    async fn test_caller_id_and_timestamp_do_not_affect_key() {
        let h = harness();

        let anonymous = h.service.predict(midtown_trip()).await.unwrap();

        let other = TripRequest::builder()
            .pickup(40.7589, -73.9851)
            .dropoff(40.7614, -73.9776)
            .passenger_count(1)
            .trip_distance(1.2)
            .user_id("rider-42")
            .pickup_datetime("2024-03-01T17:45:00Z")
            .build()
            .unwrap();
        let result = h.service.predict(other).await.unwrap();

        assert!(result.cached);
        assert_eq!(result.cache_key, anonymous.cache_key);
        assert_eq!(result.prediction, anonymous.prediction);

        let records = h.audit.recent(1).await.unwrap();
        assert_eq!(records[0].user_id(), "rider-42");
    }

    #[tokio::test]
    async fn test_model_not_loaded() {
        let store = Arc::new(MockCacheStore::new());
        let service = PredictionService::new(
            FeatureBuilder::default(),
            ModelInvoker::unloaded(),
            PredictionCacheService::new(store.clone()),
            AuditService::new(Arc::new(InMemoryAuditLog::new())),
        );

        let err = service.predict(midtown_trip()).await.unwrap_err();

        assert!(matches!(err, DomainError::ModelUnavailable { .. }));
        assert!(!service.model_loaded());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_unavailable_fails_open() {
        let h = harness();
        h.store.set_error(Some("connection refused".to_string()));

        let first = h.service.predict(midtown_trip()).await.unwrap();
        let second = h.service.predict(midtown_trip()).await.unwrap();

        assert!(!first.cached);
        assert!(!second.cached);
        assert_eq!(first.prediction, second.prediction);
        assert_eq!(h.model.calls(), 2);
        assert_eq!(h.audit.len().await, 2);
    }

    #[tokio::test]
    async fn test_cache_recovers_after_outage() {
        let h = harness();
        h.store.set_error(Some("timeout".to_string()));
        h.service.predict(midtown_trip()).await.unwrap();

        h.store.set_error(None);
        let cold = h.service.predict(midtown_trip()).await.unwrap();
        let warm = h.service.predict(midtown_trip()).await.unwrap();

        assert!(!cold.cached);
        assert!(warm.cached);
    }

    #[tokio::test]
    async fn test_audit_failure_is_not_fatal() {
        let mut audit = MockAuditLog::new();
        audit.expect_backend().return_const("mock");
        audit
            .expect_append()
            .times(1)
            .returning(|_| Err(DomainError::store_unavailable("mock", "disk full")));

        let store = Arc::new(MockCacheStore::new());
        let service = PredictionService::new(
            FeatureBuilder::default(),
            ModelInvoker::new(Arc::new(SumRegressor::new(6))),
            PredictionCacheService::new(store.clone()),
            AuditService::new(Arc::new(audit)),
        );

        let outcome = service.predict(midtown_trip()).await.unwrap();

        assert!(!outcome.cached);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_cold_requests_converge() {
        let h = harness();
        let service = Arc::new(h.service.clone());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.predict(midtown_trip()).await })
            })
            .collect();

        let mut predictions = Vec::new();
        for handle in handles {
            predictions.push(handle.await.unwrap().unwrap().prediction);
        }

        assert!(predictions.windows(2).all(|w| w[0] == w[1]));

        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.len(), 1);

        let stored: CachedPrediction =
            serde_json::from_str(snapshot.values().next().unwrap()).unwrap();
        assert_eq!(stored.prediction, predictions[0]);
        assert!(h.model.calls() >= 1);
    }

    #[tokio::test]
    async fn test_time_schema_requires_pickup_datetime() {
        let h = harness_with_schema(FeatureSchema::trip_duration());

        let err = h.service.predict(midtown_trip()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput { .. }));
        assert_eq!(h.model.calls(), 0);
    }

    #[tokio::test]
    async fn test_time_schema_keys_differ_by_hour() {
        let h = harness_with_schema(FeatureSchema::trip_duration());

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

        let morning = h.service.predict(at("2023-01-05T08:23:00")).await.unwrap();
        let evening = h.service.predict(at("2023-01-05T18:23:00")).await.unwrap();

        assert_ne!(morning.cache_key, evening.cache_key);
        assert!(!evening.cached);
    }

    #[tokio::test]
    async fn test_model_version_change_misses() {
        let store = Arc::new(MockCacheStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());

        let build = |version: &str| {
            PredictionService::new(
                FeatureBuilder::default(),
                ModelInvoker::new(Arc::new(SumRegressor::new(6).with_version(version))),
                PredictionCacheService::new(store.clone()),
                AuditService::new(audit.clone()),
            )
        };

        build("v1").predict(midtown_trip()).await.unwrap();
        let after_deploy = build("v2").predict(midtown_trip()).await.unwrap();

        assert!(!after_deploy.cached);
        assert_eq!(after_deploy.model_version, "v2");
    }

    #[tokio::test]
    async fn test_check_dependencies_reports_store_failures() {
        let h = harness();
        h.store.set_error(Some("down".to_string()));

        let report = h.service.check_dependencies().await;

        assert!(report.model_loaded);
        assert_eq!(report.model_version.as_deref(), Some("taxi_model:test"));
        assert!(!report.cache.is_ok());
        assert!(report.audit.is_ok());
        assert_eq!(report.audit.backend, "in_memory");
    }
}
