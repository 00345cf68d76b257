//! Patient operations.

use cliniq_core::context::ActorContext;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::audit::AuditAction;
use cliniq_core::models::patient::{CreatePatient, Patient, UpdatePatient};
use cliniq_core::repository::{ClinicStore, PaginatedResult, Pagination, PatientRepository};
use uuid::Uuid;

use crate::access;
use crate::audit::AuditRecorder;
use crate::config::PolicyConfig;
use crate::delete_guard::DeleteGuard;
use crate::lifecycle;
use crate::role::RoleGuard;
use crate::tenant::TenantIsolationGuard;

pub struct PatientService<S: ClinicStore> {
    store: S,
    recorder: AuditRecorder,
    tenant: TenantIsolationGuard,
}

impl<S: ClinicStore> PatientService<S> {
    pub fn new(store: S, recorder: AuditRecorder, config: &PolicyConfig) -> Self {
        Self {
            store,
            recorder,
            tenant: TenantIsolationGuard::new(config),
        }
    }

    pub async fn create(&self, actor: &ActorContext, input: CreatePatient) -> CliniqResult<Patient> {
        // 1. Authorize and resolve the owning cabinet.
        RoleGuard::new(access::PATIENT_WRITE).check(Some(actor))?;
        let cabinet_id = self.tenant.resolve_create_cabinet(actor, input.cabinet)?;

        // 2. Validate.
        lifecycle::require_non_empty("first_name", &input.first_name)?;
        lifecycle::require_non_empty("last_name", &input.last_name)?;

        // 3. Persist with server-populated provenance.
        let patient = self
            .store
            .patients()
            .create(cabinet_id, Some(actor.actor_id), input)
            .await?;

        // 4. Audit.
        self.recorder.record_change(
            actor,
            patient.cabinet_id,
            AuditAction::Create,
            "patient",
            patient.id,
            None,
            lifecycle::snapshot(&patient),
        );
        Ok(patient)
    }

    pub async fn get(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<Patient> {
        RoleGuard::new(access::PATIENT_READ).check(Some(actor))?;

        let patient = self.store.patients().get_by_id(id).await?;
        self.tenant
            .check_read(actor, patient.cabinet_id, "patient", id)?;

        // Chart access leaves a trail.
        self.recorder.record_change(
            actor,
            patient.cabinet_id,
            AuditAction::View,
            "patient",
            patient.id,
            None,
            None,
        );
        Ok(patient)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        mut input: UpdatePatient,
    ) -> CliniqResult<Patient> {
        RoleGuard::new(access::PATIENT_WRITE).check(Some(actor))?;

        let current = self.store.patients().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "patient", id)?;
        self.tenant
            .check_reassignment(current.cabinet_id, input.cabinet)?;
        lifecycle::sanitize_update("patient", &mut input);

        if let Some(first_name) = &input.first_name {
            lifecycle::require_non_empty("first_name", first_name)?;
        }
        if let Some(last_name) = &input.last_name {
            lifecycle::require_non_empty("last_name", last_name)?;
        }

        let updated = self
            .store
            .patients()
            .update(current.cabinet_id, id, input)
            .await?;

        self.recorder.record_change(
            actor,
            updated.cabinet_id,
            AuditAction::Update,
            "patient",
            updated.id,
            lifecycle::snapshot(&current),
            lifecycle::snapshot(&updated),
        );
        Ok(updated)
    }

    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<()> {
        RoleGuard::new(access::PATIENT_DELETE).check(Some(actor))?;

        let current = self.store.patients().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "patient", id)?;
        DeleteGuard::check_patient(&self.store, current.cabinet_id, id).await?;

        self.store.patients().delete(current.cabinet_id, id).await?;

        self.recorder.record_change(
            actor,
            current.cabinet_id,
            AuditAction::Delete,
            "patient",
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
    ) -> CliniqResult<PaginatedResult<Patient>> {
        RoleGuard::new(access::PATIENT_READ).check(Some(actor))?;
        let scope = self.tenant.scope(actor)?;
        self.store.patients().list(scope, pagination).await
    }
}
