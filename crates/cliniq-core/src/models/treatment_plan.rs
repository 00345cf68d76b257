//! Treatment plan domain model.
//!
//! A plan is an ordered list of treatment line items for one patient.
//! `total_price` is a derived aggregate: it is recomputed from the line
//! items on every write and is never independently authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cabinet::CabinetRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreatmentStatus {
    Planned,
    Completed,
    Cancelled,
}

impl TreatmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentStatus::Planned => "Planned",
            TreatmentStatus::Completed => "Completed",
            TreatmentStatus::Cancelled => "Cancelled",
        }
    }
}

/// One line item on a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    /// Procedure type (e.g. `extraction`, `filling`, `crown`).
    pub procedure: String,
    /// Tooth identifier in ISO 3950 notation (e.g. `36`), when applicable.
    pub tooth: Option<String>,
    pub price: f64,
    pub status: TreatmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub id: Uuid,
    pub cabinet_id: Uuid,
    pub patient_id: Uuid,
    pub title: String,
    pub treatments: Vec<Treatment>,
    /// Derived: sum of line-item prices, recomputed on every write.
    pub total_price: f64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TreatmentPlan {
    /// Recompute the derived total from the line items.
    pub fn compute_total(treatments: &[Treatment]) -> f64 {
        treatments.iter().map(|t| t.price).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTreatmentPlan {
    pub cabinet: Option<CabinetRef>,
    pub patient_id: Uuid,
    pub title: String,
    pub treatments: Vec<Treatment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTreatmentPlan {
    pub cabinet: Option<CabinetRef>,
    pub title: Option<String>,
    /// Full replacement of the line-item list; the stored total is
    /// recomputed from it.
    pub treatments: Option<Vec<Treatment>>,
    /// Ignored: `created_by` is write-once and silently stripped on update.
    pub created_by: Option<Uuid>,
}
