//! Entity-change events consumed by the orchestrator.
//!
//! Publishers send either the raw payload or a `{timestamp, data}` envelope.
//! [`DecodedEvent::decode`] accepts both and yields a typed [`DomainEvent`].

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// Wire names of every event the orchestrator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    AssetCreated,
    AssetUpdated,
    AssetDeleted,
    AssetsBulkDeleted,
    DoctorCreated,
    DoctorUpdated,
    DoctorDeleted,
    StaffCreated,
    StaffUpdated,
    StaffDeleted,
    AppointmentCreated,
    AppointmentUpdated,
    AppointmentDeleted,
    BlogCreated,
    BlogUpdated,
    BlogDeleted,
}

impl EventName {
    pub const ALL: [EventName; 16] = [
        EventName::AssetCreated,
        EventName::AssetUpdated,
        EventName::AssetDeleted,
        EventName::AssetsBulkDeleted,
        EventName::DoctorCreated,
        EventName::DoctorUpdated,
        EventName::DoctorDeleted,
        EventName::StaffCreated,
        EventName::StaffUpdated,
        EventName::StaffDeleted,
        EventName::AppointmentCreated,
        EventName::AppointmentUpdated,
        EventName::AppointmentDeleted,
        EventName::BlogCreated,
        EventName::BlogUpdated,
        EventName::BlogDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::AssetCreated => "asset.created",
            EventName::AssetUpdated => "asset.updated",
            EventName::AssetDeleted => "asset.deleted",
            EventName::AssetsBulkDeleted => "assets.bulk.deleted",
            EventName::DoctorCreated => "doctor.created",
            EventName::DoctorUpdated => "doctor.updated",
            EventName::DoctorDeleted => "doctor.deleted",
            EventName::StaffCreated => "staff.created",
            EventName::StaffUpdated => "staff.updated",
            EventName::StaffDeleted => "staff.deleted",
            EventName::AppointmentCreated => "appointment.created",
            EventName::AppointmentUpdated => "appointment.updated",
            EventName::AppointmentDeleted => "appointment.deleted",
            EventName::BlogCreated => "blog.created",
            EventName::BlogUpdated => "blog.updated",
            EventName::BlogDeleted => "blog.deleted",
        }
    }

    /// The kind of mutation this event reports.
    pub fn change_kind(&self) -> ChangeKind {
        match self {
            EventName::AssetCreated
            | EventName::DoctorCreated
            | EventName::StaffCreated
            | EventName::AppointmentCreated
            | EventName::BlogCreated => ChangeKind::Created,
            EventName::AssetUpdated
            | EventName::DoctorUpdated
            | EventName::StaffUpdated
            | EventName::AppointmentUpdated
            | EventName::BlogUpdated => ChangeKind::Updated,
            EventName::AssetDeleted
            | EventName::DoctorDeleted
            | EventName::StaffDeleted
            | EventName::AppointmentDeleted
            | EventName::BlogDeleted => ChangeKind::Deleted,
            EventName::AssetsBulkDeleted => ChangeKind::BulkDeleted,
        }
    }
}

impl FromStr for EventName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| DomainError::UnknownEvent(s.to_string()))
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutation kind carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    BulkDeleted,
}

/// Payload of `asset.created`, `asset.updated` and `asset.deleted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEventPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Payload of `assets.bulk.deleted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsBulkDeletedPayload {
    #[serde(default)]
    pub asset_ids: Vec<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Payload of the `doctor.*` events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorEventPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub staff_account_id: Option<String>,
}

/// Payload of the `staff.*` events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffEventPayload {
    #[serde(default)]
    pub id: Option<String>,
}

/// Payload of the `appointment.*` events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentEventPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
}

/// Payload of the `blog.*` events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogEventPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
}

/// A typed entity-change event, one variant per entity family.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    Asset(ChangeKind, AssetEventPayload),
    AssetsBulkDeleted(AssetsBulkDeletedPayload),
    Doctor(ChangeKind, DoctorEventPayload),
    Staff(ChangeKind, StaffEventPayload),
    Appointment(ChangeKind, AppointmentEventPayload),
    Blog(ChangeKind, BlogEventPayload),
}

impl DomainEvent {
    /// Returns the wire name this event is published under.
    pub fn name(&self) -> EventName {
        use ChangeKind::*;
        match self {
            DomainEvent::Asset(Created, _) => EventName::AssetCreated,
            DomainEvent::Asset(Updated, _) => EventName::AssetUpdated,
            DomainEvent::Asset(Deleted | BulkDeleted, _) => EventName::AssetDeleted,
            DomainEvent::AssetsBulkDeleted(_) => EventName::AssetsBulkDeleted,
            DomainEvent::Doctor(Created, _) => EventName::DoctorCreated,
            DomainEvent::Doctor(Updated, _) => EventName::DoctorUpdated,
            DomainEvent::Doctor(Deleted | BulkDeleted, _) => EventName::DoctorDeleted,
            DomainEvent::Staff(Created, _) => EventName::StaffCreated,
            DomainEvent::Staff(Updated, _) => EventName::StaffUpdated,
            DomainEvent::Staff(Deleted | BulkDeleted, _) => EventName::StaffDeleted,
            DomainEvent::Appointment(Created, _) => EventName::AppointmentCreated,
            DomainEvent::Appointment(Updated, _) => EventName::AppointmentUpdated,
            DomainEvent::Appointment(Deleted | BulkDeleted, _) => EventName::AppointmentDeleted,
            DomainEvent::Blog(Created, _) => EventName::BlogCreated,
            DomainEvent::Blog(Updated, _) => EventName::BlogUpdated,
            DomainEvent::Blog(Deleted | BulkDeleted, _) => EventName::BlogDeleted,
        }
    }

    /// Serializes the payload in its raw (unenveloped) wire shape.
    pub fn payload_json(&self) -> Value {
        let payload = match self {
            DomainEvent::Asset(_, p) => serde_json::to_value(p),
            DomainEvent::AssetsBulkDeleted(p) => serde_json::to_value(p),
            DomainEvent::Doctor(_, p) => serde_json::to_value(p),
            DomainEvent::Staff(_, p) => serde_json::to_value(p),
            DomainEvent::Appointment(_, p) => serde_json::to_value(p),
            DomainEvent::Blog(_, p) => serde_json::to_value(p),
        };
        // plain structs of strings always serialize
        payload.unwrap_or(Value::Null)
    }
}

/// An event decoded from the wire, with its occurrence time.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl DecodedEvent {
    /// Decodes an event by wire name, accepting enveloped or raw payloads.
    pub fn decode(name: &str, raw: Value) -> Result<Self, DomainError> {
        let name: EventName = name.parse()?;
        let (timestamp, data) = unwrap_envelope(raw);
        let kind = name.change_kind();
        let event = match name {
            EventName::AssetCreated | EventName::AssetUpdated | EventName::AssetDeleted => {
                DomainEvent::Asset(kind, parse_payload(name, data)?)
            }
            EventName::AssetsBulkDeleted => {
                DomainEvent::AssetsBulkDeleted(parse_payload(name, data)?)
            }
            EventName::DoctorCreated | EventName::DoctorUpdated | EventName::DoctorDeleted => {
                DomainEvent::Doctor(kind, parse_payload(name, data)?)
            }
            EventName::StaffCreated | EventName::StaffUpdated | EventName::StaffDeleted => {
                DomainEvent::Staff(kind, parse_payload(name, data)?)
            }
            EventName::AppointmentCreated
            | EventName::AppointmentUpdated
            | EventName::AppointmentDeleted => {
                DomainEvent::Appointment(kind, parse_payload(name, data)?)
            }
            EventName::BlogCreated | EventName::BlogUpdated | EventName::BlogDeleted => {
                DomainEvent::Blog(kind, parse_payload(name, data)?)
            }
        };
        Ok(Self {
            occurred_at: timestamp.unwrap_or_else(Utc::now),
            event,
        })
    }

    /// Wraps an event produced in-process, stamped with the current time.
    pub fn now(event: DomainEvent) -> Self {
        Self {
            occurred_at: Utc::now(),
            event,
        }
    }

    /// Renders the event as a `{timestamp, data}` envelope.
    pub fn to_envelope(&self) -> Value {
        serde_json::json!({
            "timestamp": self.occurred_at.to_rfc3339(),
            "data": self.event.payload_json(),
        })
    }
}

fn parse_payload<T: DeserializeOwned>(name: EventName, data: Value) -> Result<T, DomainError> {
    // a bare `null` body is treated as an empty payload
    let data = if data.is_null() {
        Value::Object(Default::default())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|source| DomainError::InvalidPayload {
        event: name.as_str(),
        source,
    })
}

/// Splits a `{timestamp, data}` envelope into its parts.
///
/// Values that are not enveloped are returned unchanged with no timestamp.
/// An object counts as an envelope only when it carries both keys and
/// `data` is an object.
pub fn unwrap_envelope(raw: Value) -> (Option<DateTime<Utc>>, Value) {
    match raw {
        Value::Object(mut map)
            if map.contains_key("timestamp") && map.get("data").is_some_and(Value::is_object) =>
        {
            let timestamp = map.get("timestamp").and_then(parse_timestamp);
            let data = map.remove("data").unwrap_or(Value::Null);
            (timestamp, data)
        }
        other => (None, other),
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}
