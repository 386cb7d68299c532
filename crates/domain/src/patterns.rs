//! Message patterns routed over the broker.
//!
//! The enums are closed so dispatch is checked at compile time; `as_str`
//! returns the dotted wire identifier other services send and listen on.

use std::str::FromStr;

use crate::error::DomainError;

/// Commands served by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestratorPattern {
    DoctorCreate,
    DoctorGetComposite,
    DoctorListComposite,
    BlogListComposite,
    CacheInvalidate,
    HealthPing,
    HealthStatus,
}

impl OrchestratorPattern {
    pub const ALL: [OrchestratorPattern; 7] = [
        OrchestratorPattern::DoctorCreate,
        OrchestratorPattern::DoctorGetComposite,
        OrchestratorPattern::DoctorListComposite,
        OrchestratorPattern::BlogListComposite,
        OrchestratorPattern::CacheInvalidate,
        OrchestratorPattern::HealthPing,
        OrchestratorPattern::HealthStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorPattern::DoctorCreate => "orchestrator.doctor.create",
            OrchestratorPattern::DoctorGetComposite => "orchestrator.doctor.getComposite",
            OrchestratorPattern::DoctorListComposite => "orchestrator.doctor.listComposite",
            OrchestratorPattern::BlogListComposite => "orchestrator.blog.listComposite",
            OrchestratorPattern::CacheInvalidate => "orchestrator.cache.invalidate",
            OrchestratorPattern::HealthPing => "orchestrator.health.ping",
            OrchestratorPattern::HealthStatus => "orchestrator.health.status",
        }
    }
}

impl FromStr for OrchestratorPattern {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::UnknownPattern(s.to_string()))
    }
}

impl std::fmt::Display for OrchestratorPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands the orchestrator sends to upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServicePattern {
    StaffCreate,
    StaffDelete,
    StaffFindOne,
    StaffFindByIds,
    DoctorProfileCreate,
    DoctorProfileDelete,
    DoctorProfileFindOne,
    DoctorProfileList,
    SpecialtyFindByIds,
    BlogList,
}

impl ServicePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServicePattern::StaffCreate => "accounts.staff.create",
            ServicePattern::StaffDelete => "accounts.staff.delete",
            ServicePattern::StaffFindOne => "accounts.staff.findOne",
            ServicePattern::StaffFindByIds => "accounts.staff.findByIds",
            ServicePattern::DoctorProfileCreate => "provider.doctor.create",
            ServicePattern::DoctorProfileDelete => "provider.doctor.delete",
            ServicePattern::DoctorProfileFindOne => "provider.doctor.findOne",
            ServicePattern::DoctorProfileList => "provider.doctor.list",
            ServicePattern::SpecialtyFindByIds => "provider.specialty.findByIds",
            ServicePattern::BlogList => "content.blog.list",
        }
    }
}

impl AsRef<str> for ServicePattern {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ServicePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
