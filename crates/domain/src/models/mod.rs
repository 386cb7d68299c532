//! Entity DTOs exchanged with the accounts, provider and content services.

mod accounts;
mod blogs;
mod doctors;

pub use accounts::{CreateStaffAccount, StaffAccount};
pub use blogs::{BlogComposite, BlogListQuery, BlogPost};
pub use doctors::{
    CreateDoctorAccountInput, CreateDoctorCommand, CreateDoctorProfile, CreateDoctorProfileInput,
    DoctorComposite, DoctorListQuery, DoctorProfile, Specialty,
};

use serde::{Deserialize, Serialize};

/// Lookup of a single entity by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

impl IdQuery {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Batch lookup of entities by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdsQuery {
    pub ids: Vec<String>,
}

impl IdsQuery {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }
}

/// Encodes an optional filter for a cache-key fragment.
///
/// Absent filters stay empty; present ones are written as JSON strings, so a
/// `:` or `=` inside a value can never be read as a separator.
fn fragment_value(value: Option<&str>) -> String {
    value
        .map(|v| serde_json::Value::from(v).to_string())
        .unwrap_or_default()
}

/// A page of entities as returned by an upstream list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamPage<T> {
    pub data: Vec<T>,
    pub total: u64,
}
