//! Saga step contracts.
//!
//! A saga is an ordered list of [`Step`]s built before execution starts.
//! Each forward action returns the [`Compensation`] that undoes it, built
//! only from what the forward call produced, so a compensation can never
//! depend on a later step.

use async_trait::async_trait;
use rpc::{RemoteClient, RemoteError};
use serde::Serialize;
use serde_json::Value;

/// Outcome of a forward action: the undo action for it, if any.
pub type StepResult = Result<Option<Box<dyn Compensation>>, RemoteError>;

/// One forward action of a saga over a shared context `C`.
///
/// The context carries results between steps (e.g. the account id a later
/// step needs).
#[async_trait]
pub trait Step<C: Send>: Send + Sync {
    /// Stable step name reported in metadata and errors.
    fn name(&self) -> &'static str;

    /// Runs the forward action.
    async fn forward(&self, ctx: &mut C) -> StepResult;
}

/// Undo action captured when a forward step succeeds.
#[async_trait]
pub trait Compensation: Send + Sync {
    async fn compensate(&self) -> Result<(), RemoteError>;
}

/// Compensation that replays one remote call with a payload captured at
/// forward time (e.g. `accounts.staff.delete` with the new account id).
pub struct CallCompensation {
    client: RemoteClient,
    pattern: String,
    payload: Value,
}

impl CallCompensation {
    pub fn new<P: Serialize + ?Sized>(
        client: RemoteClient,
        pattern: impl AsRef<str>,
        payload: &P,
    ) -> Result<Self, RemoteError> {
        let pattern = pattern.as_ref().to_string();
        let payload = serde_json::to_value(payload).map_err(|e| RemoteError::InvalidPayload {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            pattern,
            payload,
        })
    }

    /// Boxes the compensation as a step result.
    pub fn boxed(self) -> Option<Box<dyn Compensation>> {
        Some(Box::new(self))
    }
}

#[async_trait]
impl Compensation for CallCompensation {
    async fn compensate(&self) -> Result<(), RemoteError> {
        // replies are ignored; only failure matters
        self.client
            .call::<_, Value>(&self.pattern, &self.payload)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rpc::InMemoryTransport;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_call_compensation_replays_captured_payload() {
        let transport = InMemoryTransport::new();
        transport.register("accounts.staff.delete", |_| Ok(Value::Null));
        let client = RemoteClient::new(Arc::new(transport.clone()));

        let compensation =
            CallCompensation::new(client, "accounts.staff.delete", &json!({ "id": "s1" })).unwrap();
        compensation.compensate().await.unwrap();

        assert_eq!(
            transport.calls_to("accounts.staff.delete"),
            vec![json!({ "id": "s1" })]
        );
    }

    #[tokio::test]
    async fn test_call_compensation_surfaces_rejection() {
        let transport = InMemoryTransport::new();
        transport.register("accounts.staff.delete", |_| {
            Err(RemoteError::not_found("accounts.staff.delete", "gone"))
        });
        let client = RemoteClient::new(Arc::new(transport));

        let compensation =
            CallCompensation::new(client, "accounts.staff.delete", &json!({ "id": "s1" })).unwrap();
        let err = compensation.compensate().await.unwrap_err();

        assert!(err.is_not_found());
    }
}
