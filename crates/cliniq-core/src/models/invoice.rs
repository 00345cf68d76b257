//! Invoice domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cabinet::CabinetRef;

/// Invoice status. Money-bearing, so the walk is forward-only: allowed
/// edges are fixed in [`crate::statemachine::INVOICE_TRANSITIONS`];
/// `Paid` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Issued => "Issued",
            InvoiceStatus::PartiallyPaid => "PartiallyPaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub cabinet_id: Uuid,
    pub patient_id: Uuid,
    pub treatment_plan_id: Option<Uuid>,
    /// Cabinet-local sequential number (`F-0001`, `F-0002`, ...),
    /// generated server-side and unique per cabinet.
    pub number: String,
    pub total: f64,
    pub status: InvoiceStatus,
    /// Set once on the `Draft -> Issued` transition.
    pub issued_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New invoices always start out `Draft` with a generated number; neither
/// is accepted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub cabinet: Option<CabinetRef>,
    pub patient_id: Uuid,
    pub treatment_plan_id: Option<Uuid>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateInvoice {
    pub cabinet: Option<CabinetRef>,
    /// Status changes are validated against the invoice transition table.
    pub status: Option<InvoiceStatus>,
    /// Mutable as stored data; billing practice treats it as frozen once
    /// issued, but that is not enforced at this level.
    pub total: Option<f64>,
    /// Ignored: `created_by` is write-once and silently stripped on update.
    pub created_by: Option<Uuid>,
}
