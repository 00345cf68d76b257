//! Cabinet domain model.
//!
//! A cabinet is one clinic: the tenant isolation boundary. Every
//! tenant-scoped entity (patients, plans, visits, invoices, payments,
//! audit entries) carries exactly one owning cabinet reference, set at
//! creation and immutable thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cabinet {
    pub id: Uuid,
    /// Clinic name shown on invoices and schedules.
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new cabinet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCabinet {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Fields that can be updated on an existing cabinet.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCabinet {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Client-supplied cabinet reference.
///
/// Request payloads historically carried the cabinet either as a bare id
/// or as an `{ "id": ... }` object; both shapes deserialize here and are
/// normalized to one canonical id at the boundary, before any guard or
/// lifecycle logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CabinetRef {
    Id(Uuid),
    Object { id: Uuid },
}

impl CabinetRef {
    pub fn id(&self) -> Uuid {
        match self {
            CabinetRef::Id(id) => *id,
            CabinetRef::Object { id } => *id,
        }
    }
}

impl From<Uuid> for CabinetRef {
    fn from(id: Uuid) -> Self {
        CabinetRef::Id(id)
    }
}
