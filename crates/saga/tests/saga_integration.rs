//! Integration tests for the doctor creation saga.

use std::sync::Arc;
use std::time::Duration;

use domain::{
    CreateDoctorAccountInput, CreateDoctorCommand, CreateDoctorProfileInput, ServicePattern,
};
use rpc::{InMemoryTransport, RemoteClient, RemoteError};
use saga::{DoctorCreationSaga, SagaConfig, SagaCoordinator, SagaState};
use serde_json::{Value, json};

struct TestHarness {
    saga: DoctorCreationSaga,
    transport: InMemoryTransport,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(SagaConfig::default())
    }

    fn with_config(config: SagaConfig) -> Self {
        let transport = InMemoryTransport::new();
        transport.register(ServicePattern::StaffCreate, |payload| {
            Ok(json!({
                "id": "s-1",
                "email": payload["email"],
                "fullName": payload["fullName"],
                "role": payload["role"]
            }))
        });
        transport.register(ServicePattern::StaffDelete, |_| Ok(Value::Null));
        transport.register(ServicePattern::DoctorProfileCreate, |payload| {
            Ok(json!({
                "id": "d-1",
                "staffAccountId": payload["staffAccountId"],
                "degree": payload["degree"],
                "specialtyIds": payload["specialtyIds"],
                "isActive": true
            }))
        });
        transport.register(ServicePattern::DoctorProfileDelete, |_| Ok(Value::Null));

        let client = RemoteClient::new(Arc::new(transport.clone()));
        let saga = DoctorCreationSaga::new(client, SagaCoordinator::new(config));
        Self { saga, transport }
    }

    fn fail_profile_creation(&self) {
        self.transport
            .register(ServicePattern::DoctorProfileCreate, |_| {
                Err(RemoteError::rejected(
                    "provider.doctor.create",
                    409,
                    "Doctor profile already exists",
                ))
            });
    }
}

fn command(idempotency_key: Option<&str>) -> CreateDoctorCommand {
    CreateDoctorCommand {
        idempotency_key: idempotency_key.map(str::to_string),
        account: CreateDoctorAccountInput {
            email: "house@clinic.test".into(),
            password: "s3cret".into(),
            full_name: "Gregory House".into(),
            phone: None,
        },
        profile: CreateDoctorProfileInput {
            degree: Some("MD".into()),
            specialty_ids: vec!["diagnostics".into()],
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_happy_path_creates_account_then_profile() {
    let h = TestHarness::new();

    let created = h.saga.execute(command(None)).await.unwrap();

    assert_eq!(created.account_id, "s-1");
    assert_eq!(created.profile_id, "d-1");
    assert_eq!(created.profile.staff_account_id, "s-1");
    assert_eq!(created.saga.state, SagaState::Completed);
    assert_eq!(
        created.saga.executed_steps,
        vec!["createAccount", "createProfile"]
    );
    assert!(created.saga.compensated_steps.is_empty());

    // Steps ran strictly in order
    let order: Vec<String> = h.transport.calls().into_iter().map(|c| c.pattern).collect();
    assert_eq!(order, vec!["accounts.staff.create", "provider.doctor.create"]);

    // The account is created with the doctor role
    assert_eq!(
        h.transport.calls_to(ServicePattern::StaffCreate)[0]["role"],
        "DOCTOR"
    );
}

#[tokio::test]
async fn test_profile_failure_deletes_account_once() {
    let h = TestHarness::new();
    h.fail_profile_creation();

    let err = h.saga.execute(command(None)).await.unwrap_err();

    assert_eq!(err.step, "createProfile");
    assert_eq!(err.executed_steps, vec!["createAccount"]);
    assert_eq!(err.compensated_steps, vec!["createAccount"]);
    assert!(err.failed_compensations.is_empty());
    assert_eq!(err.status_code(), 409);
    assert!(matches!(
        err.cause,
        RemoteError::Rejected { status_code: 409, .. }
    ));

    assert_eq!(
        h.transport.calls_to(ServicePattern::StaffDelete),
        vec![json!({ "id": "s-1" })]
    );
    assert_eq!(h.transport.call_count(ServicePattern::DoctorProfileDelete), 0);
}

#[tokio::test]
async fn test_account_failure_needs_no_compensation() {
    let h = TestHarness::new();
    h.transport.register(ServicePattern::StaffCreate, |_| {
        Err(RemoteError::rejected("accounts.staff.create", 409, "Email taken"))
    });

    let err = h.saga.execute(command(None)).await.unwrap_err();

    assert_eq!(err.step, "createAccount");
    assert!(err.executed_steps.is_empty());
    assert!(err.compensated_steps.is_empty());
    assert_eq!(h.transport.call_count(ServicePattern::StaffDelete), 0);
    assert_eq!(h.transport.call_count(ServicePattern::DoctorProfileCreate), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_compensation_is_reported_not_raised() {
    let h = TestHarness::new();
    h.fail_profile_creation();
    h.transport.register(ServicePattern::StaffDelete, |_| {
        Err(RemoteError::unavailable("accounts.staff.delete", "accounts down"))
    });

    let err = h.saga.execute(command(None)).await.unwrap_err();

    // The original failure stays the primary signal
    assert_eq!(err.step, "createProfile");
    assert_eq!(err.status_code(), 409);
    assert!(err.compensated_steps.is_empty());
    assert_eq!(err.failed_compensations, vec!["createAccount"]);
    assert_eq!(h.transport.call_count(ServicePattern::StaffDelete), 3);
}

#[tokio::test]
async fn test_idempotency_key_is_forwarded_and_reported() {
    let h = TestHarness::new();

    let created = h.saga.execute(command(Some("idem-42"))).await.unwrap();

    assert_eq!(created.saga.idempotency_key.as_deref(), Some("idem-42"));
    assert_eq!(
        h.transport.calls_to(ServicePattern::StaffCreate)[0]["idempotencyKey"],
        "idem-42"
    );
    assert_eq!(
        h.transport.calls_to(ServicePattern::DoctorProfileCreate)[0]["idempotencyKey"],
        "idem-42"
    );
}

#[tokio::test(start_paused = true)]
async fn test_deadline_expiry_compensates_completed_steps() {
    let h = TestHarness::with_config(SagaConfig {
        deadline: Some(Duration::from_secs(2)),
        ..Default::default()
    });
    h.transport
        .set_delay(ServicePattern::DoctorProfileCreate, Duration::from_secs(5));

    let err = h.saga.execute(command(None)).await.unwrap_err();

    assert_eq!(err.step, "createProfile");
    assert!(err.is_timeout());
    assert_eq!(err.status_code(), 504);
    assert_eq!(err.compensated_steps, vec!["createAccount"]);
    assert_eq!(h.transport.call_count(ServicePattern::StaffDelete), 1);
}

#[tokio::test]
async fn test_result_wire_shape() {
    let h = TestHarness::new();

    let created = h.saga.execute(command(None)).await.unwrap();
    let json = serde_json::to_value(&created).unwrap();

    assert_eq!(json["accountId"], "s-1");
    assert_eq!(json["profileId"], "d-1");
    assert_eq!(json["saga"]["executedSteps"], json!(["createAccount", "createProfile"]));
    assert_eq!(json["saga"]["compensatedSteps"], json!([]));
    assert!(json["saga"]["durationMs"].is_u64());
    assert!(json["saga"]["sagaId"].is_string());
}
