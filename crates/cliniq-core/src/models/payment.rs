//! Payment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cabinet::CabinetRef;

/// Tolerance applied to monetary comparisons, absorbing floating-point
/// rounding in stored totals.
pub const AMOUNT_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Insurance,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Transfer => "Transfer",
            PaymentMethod::Insurance => "Insurance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub cabinet_id: Uuid,
    pub invoice_id: Uuid,
    /// Optional; when present it must match the invoice's patient.
    pub patient_id: Option<Uuid>,
    pub amount: f64,
    pub method: PaymentMethod,
    pub received_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    pub cabinet: Option<CabinetRef>,
    pub invoice_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub amount: f64,
    pub method: PaymentMethod,
    /// Defaults to now when absent.
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePayment {
    pub cabinet: Option<CabinetRef>,
    pub amount: Option<f64>,
    pub method: Option<PaymentMethod>,
    pub received_at: Option<DateTime<Utc>>,
    /// Ignored: `created_by` is write-once and silently stripped on update.
    pub created_by: Option<Uuid>,
}
