//! Audit log domain model.
//!
//! Entries are immutable and append-only: nothing in the API surface
//! updates or deletes them, and the storage schema refuses both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    View,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Update => "Update",
            AuditAction::Delete => "Delete",
            AuditAction::View => "View",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub cabinet_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    /// Entity kind, e.g. `patient` or `invoice`.
    pub entity_type: String,
    pub entity_id: String,
    /// Snapshot of the entity before the mutation, when one existed.
    pub old_state: Option<serde_json::Value>,
    /// Snapshot of the entity after the mutation, when one remains.
    pub new_state: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Outbox payload: everything but the server-assigned id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    pub cabinet_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub old_state: Option<serde_json::Value>,
    pub new_state: Option<serde_json::Value>,
    pub ip_address: Option<String>,
}
