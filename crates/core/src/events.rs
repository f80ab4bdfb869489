//! Audit events emitted after save cycles.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::preferences::ChangeRecord;

/// Event name for a completed preference save.
pub const PREFERENCES_UPDATED_EVENT: &str = "notification_preferences_updated";

/// Change-audit event summarizing exactly which (topic, channel) cells
/// flipped state during one save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_id: String,
    pub name: String,
    pub occurred_at: String,
    pub changes: Vec<ChangeRecord>,
}

impl AuditEvent {
    pub fn preferences_updated(changes: Vec<ChangeRecord>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            name: PREFERENCES_UPDATED_EVENT.to_string(),
            occurred_at: Utc::now().to_rfc3339(),
            changes,
        }
    }
}

/// Sink for audit events.
///
/// Delivery is fire-and-forget: implementations must never block or fail
/// the save cycle that emitted the event.
pub trait AuditEventSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Sink that drops all events. Default when no delivery target is wired.
pub struct NoOpAuditEventSink;

impl AuditEventSink for NoOpAuditEventSink {
    fn emit(&self, _event: AuditEvent) {}
}
