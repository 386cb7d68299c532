//! Domain vocabulary for the orchestrator.
//!
//! This crate holds everything that crosses the broker boundary in typed form:
//! - [`OrchestratorPattern`] and [`ServicePattern`] for command routing
//! - [`EventName`] and [`DomainEvent`] for entity-change events, with
//!   envelope-tolerant decoding
//! - DTOs for staff accounts, doctor profiles, specialties and blog posts

pub mod error;
pub mod events;
pub mod models;
pub mod patterns;

pub use error::DomainError;
pub use events::{
    AppointmentEventPayload, AssetEventPayload, AssetsBulkDeletedPayload, BlogEventPayload,
    ChangeKind, DecodedEvent, DoctorEventPayload, DomainEvent, EventName, StaffEventPayload,
    unwrap_envelope,
};
pub use models::{
    BlogComposite, BlogListQuery, BlogPost, CreateDoctorAccountInput, CreateDoctorCommand,
    CreateDoctorProfile, CreateDoctorProfileInput, CreateStaffAccount, DoctorComposite,
    DoctorListQuery, DoctorProfile, IdQuery, IdsQuery, Specialty, StaffAccount, UpstreamPage,
};
pub use patterns::{OrchestratorPattern, ServicePattern};
