//! Appointment events.

use cache::keys;
use domain::DomainEvent;

use crate::handler::{EventHandler, InvalidationTarget, change_targets, entity_target};

/// Entity type of the doctor side of an appointment.
pub const DOCTOR_ENTITY: &str = "DOCTOR";
/// Entity type of the patient side of an appointment.
pub const PATIENT_ENTITY: &str = "PATIENT";

/// Invalidates appointment items and lists plus the per-doctor and
/// per-patient appointment listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentCacheHandler;

impl EventHandler for AppointmentCacheHandler {
    fn name(&self) -> &'static str {
        "AppointmentCacheHandler"
    }

    fn targets(&self, event: &DomainEvent) -> Vec<InvalidationTarget> {
        let DomainEvent::Appointment(kind, payload) = event else {
            return Vec::new();
        };
        let mut targets = change_targets(keys::APPOINTMENTS, *kind, payload.id.as_deref());
        targets.extend(entity_target(
            keys::APPOINTMENTS,
            Some(DOCTOR_ENTITY),
            payload.doctor_id.as_deref(),
        ));
        targets.extend(entity_target(
            keys::APPOINTMENTS,
            Some(PATIENT_ENTITY),
            payload.patient_id.as_deref(),
        ));
        targets
    }
}
