//! Authenticated actor context.
//!
//! CLINIQ consumes an already-authenticated identity: the role and home
//! cabinet are resolved once at authentication time and carried for the
//! life of the session/token. Nothing in this layer re-derives them from
//! mutable state on a per-request basis.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CliniqError, CliniqResult};

/// Fixed role enumeration.
///
/// `SuperAdmin` bypasses both role allow-lists and tenant filtering; all
/// other roles are confined to their home cabinet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    CabinetAdmin,
    Clinician,
    Receptionist,
    Accountant,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::CabinetAdmin => "CabinetAdmin",
            Role::Clinician => "Clinician",
            Role::Receptionist => "Receptionist",
            Role::Accountant => "Accountant",
            Role::Employee => "Employee",
        }
    }
}

/// The authenticated actor attached to an in-flight operation.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub role: Role,
    /// Home cabinet. `None` only for actors authenticated outside any
    /// cabinet (super-admins, bootstrap); everyone else is denied by
    /// default when this is missing.
    pub cabinet_id: Option<Uuid>,
    /// Client IP recorded into audit entries.
    pub ip_address: Option<String>,
}

impl ActorContext {
    pub fn new(actor_id: Uuid, role: Role, cabinet_id: Option<Uuid>) -> Self {
        Self {
            actor_id,
            role,
            cabinet_id,
            ip_address: None,
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Fail-closed accessor for the home cabinet.
    pub fn require_cabinet(&self) -> CliniqResult<Uuid> {
        self.cabinet_id.ok_or_else(|| CliniqError::Forbidden {
            reason: "actor has no resolvable cabinet".into(),
        })
    }
}

/// Tenant filter injected into list/read-many queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// No tenant filtering (super-admin only).
    All,
    /// Restrict to a single cabinet.
    Cabinet(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_cabinet_fails_closed() {
        let actor = ActorContext::new(Uuid::new_v4(), Role::Clinician, None);
        assert!(actor.require_cabinet().is_err());

        let home = Uuid::new_v4();
        let actor = ActorContext::new(Uuid::new_v4(), Role::Clinician, Some(home));
        assert_eq!(actor.require_cabinet().unwrap(), home);
    }
}
