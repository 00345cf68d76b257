//! Visit domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cabinet::CabinetRef;

/// Visit status. Allowed transitions are fixed in
/// [`crate::statemachine::VISIT_TRANSITIONS`]; `Cancelled -> Scheduled`
/// is the reschedule path and `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisitStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "Scheduled",
            VisitStatus::Confirmed => "Confirmed",
            VisitStatus::Completed => "Completed",
            VisitStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub cabinet_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: VisitStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New visits always start out `Scheduled`; the status is not accepted
/// from the caller at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVisit {
    pub cabinet: Option<CabinetRef>,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateVisit {
    pub cabinet: Option<CabinetRef>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    /// Status changes are validated against the visit transition table.
    pub status: Option<VisitStatus>,
    /// Ignored: `created_by` is write-once and silently stripped on update.
    pub created_by: Option<Uuid>,
}
