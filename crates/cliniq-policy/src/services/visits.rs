//! Visit operations.
//!
//! Visits always start out `Scheduled`; later status changes walk the
//! visit transition table (confirm, complete, cancel, reschedule).

use cliniq_core::context::ActorContext;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::audit::AuditAction;
use cliniq_core::models::visit::{CreateVisit, UpdateVisit, Visit, VisitStatus};
use cliniq_core::repository::{
    ClinicStore, PaginatedResult, Pagination, PatientRepository, VisitRepository,
};
use cliniq_core::statemachine::VISIT_TRANSITIONS;
use uuid::Uuid;

use crate::access;
use crate::audit::AuditRecorder;
use crate::config::PolicyConfig;
use crate::lifecycle;
use crate::role::RoleGuard;
use crate::tenant::{self, TenantIsolationGuard};

pub struct VisitService<S: ClinicStore> {
    store: S,
    recorder: AuditRecorder,
    tenant: TenantIsolationGuard,
}

impl<S: ClinicStore> VisitService<S> {
    pub fn new(store: S, recorder: AuditRecorder, config: &PolicyConfig) -> Self {
        Self {
            store,
            recorder,
            tenant: TenantIsolationGuard::new(config),
        }
    }

    pub async fn create(&self, actor: &ActorContext, input: CreateVisit) -> CliniqResult<Visit> {
        // 1. Authorize and resolve the owning cabinet.
        RoleGuard::new(access::VISIT_WRITE).check(Some(actor))?;
        let cabinet_id = self.tenant.resolve_create_cabinet(actor, input.cabinet)?;

        // 2. The patient must live in the same cabinet.
        let patient = self.store.patients().get_by_id(input.patient_id).await?;
        tenant::ensure_in_cabinet(cabinet_id, patient.cabinet_id, "patient", patient.id)?;

        // 3. Persist; visits enter the lifecycle as Scheduled.
        let visit = self
            .store
            .visits()
            .create(cabinet_id, Some(actor.actor_id), input)
            .await?;

        // 4. Audit.
        self.recorder.record_change(
            actor,
            visit.cabinet_id,
            AuditAction::Create,
            "visit",
            visit.id,
            None,
            lifecycle::snapshot(&visit),
        );
        Ok(visit)
    }

    pub async fn get(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<Visit> {
        RoleGuard::new(access::VISIT_READ).check(Some(actor))?;

        let visit = self.store.visits().get_by_id(id).await?;
        self.tenant.check_read(actor, visit.cabinet_id, "visit", id)?;
        Ok(visit)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        mut input: UpdateVisit,
    ) -> CliniqResult<Visit> {
        RoleGuard::new(access::VISIT_WRITE).check(Some(actor))?;

        let current = self.store.visits().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "visit", id)?;
        self.tenant
            .check_reassignment(current.cabinet_id, input.cabinet)?;
        lifecycle::sanitize_update("visit", &mut input);

        if let Some(next) = input.status {
            lifecycle::ensure_transition(
                &VISIT_TRANSITIONS,
                "visit",
                current.status,
                next,
                VisitStatus::as_str,
            )?;
        }

        let updated = self
            .store
            .visits()
            .update(current.cabinet_id, id, input)
            .await?;

        self.recorder.record_change(
            actor,
            updated.cabinet_id,
            AuditAction::Update,
            "visit",
            updated.id,
            lifecycle::snapshot(&current),
            lifecycle::snapshot(&updated),
        );
        Ok(updated)
    }

    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<()> {
        RoleGuard::new(access::VISIT_DELETE).check(Some(actor))?;

        let current = self.store.visits().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "visit", id)?;

        // Visits are leaves; nothing depends on them.
        self.store.visits().delete(current.cabinet_id, id).await?;

        self.recorder.record_change(
            actor,
            current.cabinet_id,
            AuditAction::Delete,
            "visit",
            current.id,
            lifecycle::snapshot(&current),
            None,
        );
        Ok(())
    }

    pub async fn list(
        &self,
        actor: &ActorContext,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<Visit>> {
        RoleGuard::new(access::VISIT_READ).check(Some(actor))?;
        let scope = self.tenant.scope(actor)?;
        self.store.visits().list(scope, pagination).await
    }
}
