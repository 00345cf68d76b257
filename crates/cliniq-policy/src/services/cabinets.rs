//! Cabinet operations.
//!
//! Cabinets are the tenant boundary itself: creating and enumerating
//! them is platform administration, while reading or updating one is
//! confined to its own members.

use cliniq_core::context::ActorContext;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::audit::AuditAction;
use cliniq_core::models::cabinet::{Cabinet, CreateCabinet, UpdateCabinet};
use cliniq_core::repository::{CabinetRepository, ClinicStore, PaginatedResult, Pagination};
use uuid::Uuid;

use crate::access;
use crate::audit::AuditRecorder;
use crate::config::PolicyConfig;
use crate::lifecycle;
use crate::role::RoleGuard;
use crate::tenant::TenantIsolationGuard;

pub struct CabinetService<S: ClinicStore> {
    store: S,
    recorder: AuditRecorder,
    tenant: TenantIsolationGuard,
}

impl<S: ClinicStore> CabinetService<S> {
    pub fn new(store: S, recorder: AuditRecorder, config: &PolicyConfig) -> Self {
        Self {
            store,
            recorder,
            tenant: TenantIsolationGuard::new(config),
        }
    }

    pub async fn create(&self, actor: &ActorContext, input: CreateCabinet) -> CliniqResult<Cabinet> {
        RoleGuard::new(access::CABINET_CREATE).check(Some(actor))?;
        lifecycle::require_non_empty("name", &input.name)?;

        let cabinet = self.store.cabinets().create(input).await?;

        self.recorder.record_change(
            actor,
            cabinet.id,
            AuditAction::Create,
            "cabinet",
            cabinet.id,
            None,
            lifecycle::snapshot(&cabinet),
        );
        Ok(cabinet)
    }

    pub async fn get(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<Cabinet> {
        RoleGuard::new(access::CABINET_READ).check(Some(actor))?;

        let cabinet = self.store.cabinets().get_by_id(id).await?;
        // A cabinet is its own isolation boundary.
        self.tenant.check_read(actor, cabinet.id, "cabinet", id)?;
        Ok(cabinet)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        input: UpdateCabinet,
    ) -> CliniqResult<Cabinet> {
        RoleGuard::new(access::CABINET_UPDATE).check(Some(actor))?;

        let current = self.store.cabinets().get_by_id(id).await?;
        self.tenant.check_read(actor, current.id, "cabinet", id)?;

        if let Some(name) = &input.name {
            lifecycle::require_non_empty("name", name)?;
        }

        let updated = self.store.cabinets().update(id, input).await?;

        self.recorder.record_change(
            actor,
            updated.id,
            AuditAction::Update,
            "cabinet",
            updated.id,
            lifecycle::snapshot(&current),
            lifecycle::snapshot(&updated),
        );
        Ok(updated)
    }

    pub async fn list(
        &self,
        actor: &ActorContext,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<Cabinet>> {
        RoleGuard::new(access::CABINET_LIST).check(Some(actor))?;
        self.store.cabinets().list(pagination).await
    }
}
