//! Shared lifecycle stages for entity writes.
//!
//! Every mutation flows through the same ordered pipeline:
//! `before` stages (validation, field stripping, transition checks),
//! then the persist call, then `after` stages (audit snapshots). The
//! stages here are the pieces each service composes instead of carrying
//! its own copy of the logic.

use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::invoice::UpdateInvoice;
use cliniq_core::models::patient::{Patient, PatientStatus, UpdatePatient};
use cliniq_core::models::payment::UpdatePayment;
use cliniq_core::models::treatment_plan::UpdateTreatmentPlan;
use cliniq_core::models::visit::UpdateVisit;
use cliniq_core::statemachine::StateMachine;
use serde::Serialize;
use uuid::Uuid;

/// Update payloads that carry a (write-once) `created_by` field.
pub trait StripCreatedBy {
    fn strip_created_by(&mut self) -> Option<Uuid>;
}

impl StripCreatedBy for UpdatePatient {
    fn strip_created_by(&mut self) -> Option<Uuid> {
        self.created_by.take()
    }
}

impl StripCreatedBy for UpdateTreatmentPlan {
    fn strip_created_by(&mut self) -> Option<Uuid> {
        self.created_by.take()
    }
}

impl StripCreatedBy for UpdateVisit {
    fn strip_created_by(&mut self) -> Option<Uuid> {
        self.created_by.take()
    }
}

impl StripCreatedBy for UpdateInvoice {
    fn strip_created_by(&mut self) -> Option<Uuid> {
        self.created_by.take()
    }
}

impl StripCreatedBy for UpdatePayment {
    fn strip_created_by(&mut self) -> Option<Uuid> {
        self.created_by.take()
    }
}

/// Drop a client-supplied `created_by` from an update payload.
///
/// The field is write-once and server-populated; a supplied value is
/// ignored rather than rejected so one stray field does not fail an
/// otherwise valid update. The drop is logged at debug level.
pub fn sanitize_update<U: StripCreatedBy>(entity: &str, input: &mut U) {
    if let Some(ignored) = input.strip_created_by() {
        tracing::debug!(
            entity,
            ignored = %ignored,
            "stripped client-supplied created_by from update"
        );
    }
}

/// Validate a requested status change against a transition table.
///
/// `label` renders a status for the error message; the stored status is
/// left untouched when the edge is not in the table.
pub fn ensure_transition<S: Copy + Eq>(
    machine: &StateMachine<S>,
    entity: &str,
    current: S,
    next: S,
    label: fn(S) -> &'static str,
) -> CliniqResult<()> {
    if machine.is_valid_transition(current, next) {
        Ok(())
    } else {
        Err(CliniqError::InvalidTransition {
            entity: entity.into(),
            from: label(current).into(),
            to: label(next).into(),
        })
    }
}

/// Serialize an entity state for an audit snapshot.
///
/// Snapshot failures must never fail the write they describe; they are
/// logged and the snapshot is simply omitted.
pub fn snapshot<T: Serialize>(entity: &T) -> Option<serde_json::Value> {
    match serde_json::to_value(entity) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize entity state for audit");
            None
        }
    }
}

/// Reject empty or whitespace-only required text fields.
pub fn require_non_empty(field: &str, value: &str) -> CliniqResult<()> {
    if value.trim().is_empty() {
        Err(CliniqError::Validation {
            message: format!("{field} must not be empty"),
        })
    } else {
        Ok(())
    }
}

/// Block new records that reference an archived patient.
///
/// Archived patients keep their history readable; `blocked` names the
/// record kind being refused (for the conflict message).
pub fn ensure_patient_active(patient: &Patient, blocked: &str) -> CliniqResult<()> {
    if patient.status == PatientStatus::Archived {
        Err(CliniqError::Conflict {
            message: format!("patient is archived, new {blocked} are blocked"),
        })
    } else {
        Ok(())
    }
}
