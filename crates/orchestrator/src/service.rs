//! Command and event dispatch for the orchestrator.

use std::sync::Arc;

use cache::CacheStore;
use composition::{ComposerConfig, ReadComposer};
use domain::{
    BlogListQuery, ChangeKind, CreateDoctorCommand, DecodedEvent, DoctorEventPayload,
    DoctorListQuery, DomainEvent, IdQuery, OrchestratorPattern,
};
use invalidation::{InvalidationProcessor, InvalidationReport};
use rpc::RemoteClient;
use saga::{DoctorCreated, DoctorCreationSaga, SagaConfig, SagaCoordinator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Body of `orchestrator.cache.invalidate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateCacheRequest {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateCacheResponse {
    pub removed: usize,
}

/// Reachability of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyHealth {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "up",
                error: None,
            },
            Err(e) => Self {
                status: "down",
                error: Some(e.to_string()),
            },
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Answer to `orchestrator.health.status` and `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// `ok` when every dependency is up, `degraded` otherwise.
    pub status: &'static str,
    pub cache: DependencyHealth,
    pub transport: DependencyHealth,
}

/// Wires the composition engine, the sagas and the invalidation processor
/// behind the orchestrator's command patterns.
pub struct Orchestrator {
    client: RemoteClient,
    cache: Arc<dyn CacheStore>,
    composer: ReadComposer,
    doctor_creation: DoctorCreationSaga,
    invalidation: InvalidationProcessor,
}

impl Orchestrator {
    pub fn new(
        client: RemoteClient,
        cache: Arc<dyn CacheStore>,
        composer_config: ComposerConfig,
        saga_config: SagaConfig,
    ) -> Self {
        Self {
            composer: ReadComposer::with_config(client.clone(), cache.clone(), composer_config),
            doctor_creation: DoctorCreationSaga::new(
                client.clone(),
                SagaCoordinator::new(saga_config),
            ),
            invalidation: InvalidationProcessor::with_default_handlers(cache.clone()),
            client,
            cache,
        }
    }

    /// Runs one incoming command and returns its JSON reply.
    #[tracing::instrument(skip(self, payload), fields(pattern = %pattern))]
    pub async fn dispatch(
        &self,
        pattern: OrchestratorPattern,
        payload: Value,
    ) -> Result<Value, ApiError> {
        metrics::counter!("orchestrator_commands_total", "pattern" => pattern.as_str())
            .increment(1);

        match pattern {
            OrchestratorPattern::DoctorCreate => {
                let command: CreateDoctorCommand = decode(pattern, payload)?;
                encode(&self.create_doctor(command).await?)
            }
            OrchestratorPattern::DoctorGetComposite => {
                let IdQuery { id } = decode(pattern, payload)?;
                encode(&self.composer.doctor_composite(&id).await?)
            }
            OrchestratorPattern::DoctorListComposite => {
                let query: DoctorListQuery = decode(pattern, payload)?;
                encode(&self.composer.doctor_list_composite(query).await?)
            }
            OrchestratorPattern::BlogListComposite => {
                let query: BlogListQuery = decode(pattern, payload)?;
                encode(&self.composer.blog_list_composite(query).await?)
            }
            OrchestratorPattern::CacheInvalidate => {
                let request: InvalidateCacheRequest = decode(pattern, payload)?;
                encode(&self.invalidate_cache(request).await?)
            }
            OrchestratorPattern::HealthPing => Ok(Value::from("pong")),
            OrchestratorPattern::HealthStatus => encode(&self.health().await),
        }
    }

    /// Creates a doctor through the saga, then announces it.
    ///
    /// The `doctor.created` event is emitted to other services and applied
    /// to the local cache. Neither step can fail the command once the saga
    /// has completed.
    pub async fn create_doctor(&self, command: CreateDoctorCommand) -> Result<DoctorCreated, ApiError> {
        let created = self.doctor_creation.execute(command).await?;

        let payload = DoctorEventPayload {
            id: Some(created.profile_id.clone()),
            staff_account_id: Some(created.account_id.clone()),
        };
        let event = DecodedEvent::now(DomainEvent::Doctor(ChangeKind::Created, payload.clone()));
        if let Err(e) = self.client.emit(event.event.name().as_str(), &payload).await {
            tracing::warn!(error = %e, "failed to emit doctor.created");
        }
        self.invalidation.process(&event).await;

        Ok(created)
    }

    /// Applies an incoming entity-change event to the cache.
    pub async fn handle_event(&self, name: &str, raw: Value) -> Result<InvalidationReport, ApiError> {
        Ok(self.invalidation.process_raw(name, raw).await?)
    }

    /// Removes the listed keys and every key matching the listed patterns.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_cache(
        &self,
        request: InvalidateCacheRequest,
    ) -> Result<InvalidateCacheResponse, ApiError> {
        let mut removed = 0;
        for key in &request.keys {
            removed += usize::from(self.cache.invalidate(key).await?);
        }
        for pattern in &request.patterns {
            removed += self.cache.invalidate_pattern(pattern).await?;
        }
        tracing::info!(removed, "manual cache invalidation");
        Ok(InvalidateCacheResponse { removed })
    }

    /// Probes the cache and the transport.
    pub async fn health(&self) -> HealthStatus {
        let (cache, transport) = tokio::join!(self.cache.ping(), self.client.ping());
        let cache = DependencyHealth::from_result(cache);
        let transport = DependencyHealth::from_result(transport);
        let status = if cache.is_up() && transport.is_up() {
            "ok"
        } else {
            "degraded"
        };
        HealthStatus {
            status,
            cache,
            transport,
        }
    }
}

/// Decodes a command payload. A missing body reads as `{}`.
fn decode<T: DeserializeOwned>(pattern: OrchestratorPattern, payload: Value) -> Result<T, ApiError> {
    let payload = if payload.is_null() {
        Value::Object(Default::default())
    } else {
        payload
    };
    serde_json::from_value(payload)
        .map_err(|e| ApiError::BadRequest(format!("Invalid payload for '{pattern}': {e}")))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}
