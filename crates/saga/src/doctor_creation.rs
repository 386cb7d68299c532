//! Doctor creation saga: staff account, then doctor profile.
//!
//! ```text
//! createAccount  accounts.staff.create   ⟲ accounts.staff.delete
//! createProfile  provider.doctor.create  ⟲ provider.doctor.delete
//! ```

use async_trait::async_trait;
use domain::{
    CreateDoctorCommand, CreateDoctorProfile, CreateStaffAccount, DoctorProfile, IdQuery,
    ServicePattern, StaffAccount,
};
use rpc::{RemoteClient, RemoteError};
use serde::{Deserialize, Serialize};

use crate::aggregate::SagaMetadata;
use crate::coordinator::SagaCoordinator;
use crate::error::{Result, SagaOrchestrationError};
use crate::step::{CallCompensation, Step, StepResult};

pub const SAGA_TYPE: &str = "DoctorCreation";
pub const STEP_CREATE_ACCOUNT: &str = "createAccount";
pub const STEP_CREATE_PROFILE: &str = "createProfile";

/// Role assigned to accounts created for doctors.
pub const DOCTOR_ROLE: &str = "DOCTOR";

/// Composite result of `orchestrator.doctor.create`. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorCreated {
    pub account_id: String,
    pub profile_id: String,
    pub account: StaffAccount,
    pub profile: DoctorProfile,
    pub saga: SagaMetadata,
}

/// State threaded through the doctor creation steps.
#[derive(Debug)]
pub struct DoctorCreationContext {
    command: CreateDoctorCommand,
    account: Option<StaffAccount>,
    profile: Option<DoctorProfile>,
}

impl DoctorCreationContext {
    fn new(command: CreateDoctorCommand) -> Self {
        Self {
            command,
            account: None,
            profile: None,
        }
    }
}

struct CreateAccount {
    client: RemoteClient,
}

#[async_trait]
impl Step<DoctorCreationContext> for CreateAccount {
    fn name(&self) -> &'static str {
        STEP_CREATE_ACCOUNT
    }

    async fn forward(&self, ctx: &mut DoctorCreationContext) -> StepResult {
        let input = &ctx.command.account;
        let request = CreateStaffAccount {
            email: input.email.clone(),
            password: input.password.clone(),
            full_name: input.full_name.clone(),
            phone: input.phone.clone(),
            role: DOCTOR_ROLE.to_string(),
            idempotency_key: ctx.command.idempotency_key.clone(),
        };
        let account: StaffAccount = self.client.call(ServicePattern::StaffCreate, &request).await?;
        tracing::debug!(account_id = %account.id, "staff account created");

        let undo = CallCompensation::new(
            self.client.clone(),
            ServicePattern::StaffDelete,
            &IdQuery::new(account.id.clone()),
        )?;
        ctx.account = Some(account);
        Ok(undo.boxed())
    }
}

struct CreateProfile {
    client: RemoteClient,
}

#[async_trait]
impl Step<DoctorCreationContext> for CreateProfile {
    fn name(&self) -> &'static str {
        STEP_CREATE_PROFILE
    }

    async fn forward(&self, ctx: &mut DoctorCreationContext) -> StepResult {
        let staff_account_id = ctx
            .account
            .as_ref()
            .map(|a| a.id.clone())
            .ok_or_else(|| RemoteError::InvalidPayload {
                pattern: ServicePattern::DoctorProfileCreate.to_string(),
                reason: "no staff account to attach the profile to".to_string(),
            })?;
        let request = CreateDoctorProfile {
            staff_account_id,
            details: ctx.command.profile.clone(),
            idempotency_key: ctx.command.idempotency_key.clone(),
        };
        let profile: DoctorProfile = self
            .client
            .call(ServicePattern::DoctorProfileCreate, &request)
            .await?;
        tracing::debug!(profile_id = %profile.id, "doctor profile created");

        let undo = CallCompensation::new(
            self.client.clone(),
            ServicePattern::DoctorProfileDelete,
            &IdQuery::new(profile.id.clone()),
        )?;
        ctx.profile = Some(profile);
        Ok(undo.boxed())
    }
}

/// Creates a doctor across the accounts and provider services.
#[derive(Clone)]
pub struct DoctorCreationSaga {
    client: RemoteClient,
    coordinator: SagaCoordinator,
}

impl DoctorCreationSaga {
    pub fn new(client: RemoteClient, coordinator: SagaCoordinator) -> Self {
        Self {
            client,
            coordinator,
        }
    }

    fn steps(&self) -> Vec<Box<dyn Step<DoctorCreationContext>>> {
        vec![
            Box::new(CreateAccount {
                client: self.client.clone(),
            }),
            Box::new(CreateProfile {
                client: self.client.clone(),
            }),
        ]
    }

    /// Runs the saga for `command`.
    #[tracing::instrument(skip(self, command), fields(email = %command.account.email))]
    pub async fn execute(&self, command: CreateDoctorCommand) -> Result<DoctorCreated> {
        let idempotency_key = command.idempotency_key.clone();
        let outcome = self
            .coordinator
            .execute(
                SAGA_TYPE,
                &self.steps(),
                DoctorCreationContext::new(command),
                idempotency_key,
            )
            .await?;

        let DoctorCreationContext {
            account, profile, ..
        } = outcome.context;
        match (account, profile) {
            (Some(account), Some(profile)) => Ok(DoctorCreated {
                account_id: account.id.clone(),
                profile_id: profile.id.clone(),
                account,
                profile,
                saga: outcome.metadata,
            }),
            _ => {
                let meta = outcome.metadata;
                Err(SagaOrchestrationError {
                    saga_id: meta.saga_id,
                    saga_type: meta.saga_type,
                    step: STEP_CREATE_PROFILE.to_string(),
                    executed_steps: meta.executed_steps,
                    compensated_steps: Vec::new(),
                    failed_compensations: Vec::new(),
                    duration_ms: meta.duration_ms,
                    cause: RemoteError::InvalidPayload {
                        pattern: SAGA_TYPE.to_string(),
                        reason: "saga completed without its entities".to_string(),
                    },
                })
            }
        }
    }
}
