use common::PageQuery;
use serde::{Deserialize, Serialize};

use super::accounts::StaffAccount;
use super::fragment_value;

/// A doctor profile owned by the provider service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub id: String,
    pub staff_account_id: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub specialty_ids: Vec<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// A medical specialty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialty {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A doctor profile joined with its staff account and specialty names.
///
/// `account` is `None` when the account lookup was skipped or degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorComposite {
    #[serde(flatten)]
    pub profile: DoctorProfile,
    pub account: Option<StaffAccount>,
    pub specialties: Vec<Specialty>,
}

/// Filters accepted by `orchestrator.doctor.listComposite`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl DoctorListQuery {
    /// Stable cache-key fragment covering every identifying parameter.
    pub fn cache_fragment(&self) -> String {
        format!(
            "page={}:limit={}:search={}:specialty={}:active={}",
            self.page.page,
            self.page.limit,
            fragment_value(self.search.as_deref()),
            fragment_value(self.specialty_id.as_deref()),
            self.is_active.map(|b| b.to_string()).unwrap_or_default(),
        )
    }
}

/// Account half of `orchestrator.doctor.create`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorAccountInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl std::fmt::Debug for CreateDoctorAccountInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateDoctorAccountInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Profile half of `orchestrator.doctor.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorProfileInput {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub specialty_ids: Vec<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Payload of `orchestrator.doctor.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorCommand {
    #[serde(default)]
    pub idempotency_key: Option<String>,
    pub account: CreateDoctorAccountInput,
    #[serde(default)]
    pub profile: CreateDoctorProfileInput,
}

/// Payload of `provider.doctor.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorProfile {
    pub staff_account_id: String,
    #[serde(flatten)]
    pub details: CreateDoctorProfileInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}
