//! Tenant isolation guard.
//!
//! Every read and write is constrained to the actor's home cabinet,
//! resolved once at authentication and carried on the
//! [`ActorContext`]. Super-admins operate unscoped. Cross-cabinet reads
//! are masked: a mismatch surfaces as `NotFound`, indistinguishable from
//! a record that does not exist, so probing for foreign ids leaks
//! nothing.
//!
//! Actors without a home cabinet are denied outright unless the
//! bootstrap exemption is enabled in [`PolicyConfig`]; the exemption
//! exists for initial data loading and must stay off in production.

use cliniq_core::context::{ActorContext, TenantScope};
use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::cabinet::CabinetRef;
use uuid::Uuid;

use crate::config::PolicyConfig;

#[derive(Debug, Clone, Copy)]
pub struct TenantIsolationGuard {
    bootstrap_exemption: bool,
}

impl TenantIsolationGuard {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            bootstrap_exemption: config.bootstrap_exemption,
        }
    }

    /// The tenant filter for list queries made by this actor.
    pub fn scope(&self, actor: &ActorContext) -> CliniqResult<TenantScope> {
        if actor.is_super_admin() {
            return Ok(TenantScope::All);
        }
        match actor.cabinet_id {
            Some(id) => Ok(TenantScope::Cabinet(id)),
            None if self.bootstrap_exemption => {
                tracing::warn!(
                    actor_id = %actor.actor_id,
                    "bootstrap exemption active: granting unscoped access to cabinet-less actor"
                );
                Ok(TenantScope::All)
            }
            None => Err(CliniqError::Forbidden {
                reason: "actor has no resolvable cabinet".into(),
            }),
        }
    }

    /// Check that a fetched entity is visible to the actor.
    ///
    /// A cabinet mismatch is reported as `NotFound` for the given entity
    /// name and id, never as a permission error.
    pub fn check_read(
        &self,
        actor: &ActorContext,
        entity_cabinet: Uuid,
        entity: &str,
        id: Uuid,
    ) -> CliniqResult<()> {
        match self.scope(actor)? {
            TenantScope::All => Ok(()),
            TenantScope::Cabinet(home) if home == entity_cabinet => Ok(()),
            TenantScope::Cabinet(_) => Err(CliniqError::NotFound {
                entity: entity.into(),
                id: id.to_string(),
            }),
        }
    }

    /// Resolve the owning cabinet for a new entity.
    ///
    /// Regular actors get their home cabinet; a client-supplied foreign
    /// cabinet is an explicit `Forbidden`, and a matching one is a no-op.
    /// Unscoped actors (super-admin, bootstrap) must name a cabinet in
    /// the payload since there is no home to fall back to.
    pub fn resolve_create_cabinet(
        &self,
        actor: &ActorContext,
        requested: Option<CabinetRef>,
    ) -> CliniqResult<Uuid> {
        let requested = requested.map(|r| r.id());

        if actor.is_super_admin() || (self.bootstrap_exemption && actor.cabinet_id.is_none()) {
            return requested.or(actor.cabinet_id).ok_or(CliniqError::Validation {
                message: "a cabinet reference is required".into(),
            });
        }

        let home = actor.require_cabinet()?;
        match requested {
            Some(id) if id != home => Err(CliniqError::Forbidden {
                reason: "cannot create records in another cabinet".into(),
            }),
            _ => Ok(home),
        }
    }

    /// Reject attempts to move an entity between cabinets.
    ///
    /// The owning cabinet is write-once; an update naming the current
    /// cabinet is a no-op, any other cabinet is refused.
    pub fn check_reassignment(
        &self,
        current_cabinet: Uuid,
        requested: Option<CabinetRef>,
    ) -> CliniqResult<()> {
        match requested {
            Some(r) if r.id() != current_cabinet => Err(CliniqError::Forbidden {
                reason: "an entity cannot be moved to another cabinet".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Check that a referenced entity lives in the expected cabinet.
///
/// Used when a new record points at an existing one (a plan at its
/// patient, a payment at its invoice): the reference must stay inside
/// the owning cabinet, and a foreign reference is masked as `NotFound`
/// exactly like a cross-tenant read.
pub fn ensure_in_cabinet(
    cabinet_id: Uuid,
    entity_cabinet: Uuid,
    entity: &str,
    id: Uuid,
) -> CliniqResult<()> {
    if entity_cabinet == cabinet_id {
        Ok(())
    } else {
        Err(CliniqError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        })
    }
}
