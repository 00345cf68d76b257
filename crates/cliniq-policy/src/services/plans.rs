//! Treatment plan operations.
//!
//! The plan total is derived: every write that touches the line items
//! recomputes it server-side, so the stored aggregate can never drift
//! from the items it summarizes.

use cliniq_core::context::ActorContext;
use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::audit::AuditAction;
use cliniq_core::models::treatment_plan::{
    CreateTreatmentPlan, Treatment, TreatmentPlan, UpdateTreatmentPlan,
};
use cliniq_core::repository::{
    ClinicStore, PaginatedResult, Pagination, PatientRepository, TreatmentPlanRepository,
};
use uuid::Uuid;

use crate::access;
use crate::audit::AuditRecorder;
use crate::config::PolicyConfig;
use crate::delete_guard::DeleteGuard;
use crate::lifecycle;
use crate::role::RoleGuard;
use crate::tenant::{self, TenantIsolationGuard};

pub struct TreatmentPlanService<S: ClinicStore> {
    store: S,
    recorder: AuditRecorder,
    tenant: TenantIsolationGuard,
}

impl<S: ClinicStore> TreatmentPlanService<S> {
    pub fn new(store: S, recorder: AuditRecorder, config: &PolicyConfig) -> Self {
        Self {
            store,
            recorder,
            tenant: TenantIsolationGuard::new(config),
        }
    }

    pub async fn create(
        &self,
        actor: &ActorContext,
        input: CreateTreatmentPlan,
    ) -> CliniqResult<TreatmentPlan> {
        // 1. Authorize and resolve the owning cabinet.
        RoleGuard::new(access::PLAN_WRITE).check(Some(actor))?;
        let cabinet_id = self.tenant.resolve_create_cabinet(actor, input.cabinet)?;

        // 2. The patient must live in the same cabinet and accept new
        //    clinical records.
        let patient = self.store.patients().get_by_id(input.patient_id).await?;
        tenant::ensure_in_cabinet(cabinet_id, patient.cabinet_id, "patient", patient.id)?;
        lifecycle::ensure_patient_active(&patient, "treatment plans")?;

        // 3. Validate and derive the total.
        lifecycle::require_non_empty("title", &input.title)?;
        validate_treatments(&input.treatments)?;
        let total = TreatmentPlan::compute_total(&input.treatments);

        // 4. Persist.
        let plan = self
            .store
            .plans()
            .create(cabinet_id, Some(actor.actor_id), input, total)
            .await?;

        // 5. Audit.
        self.recorder.record_change(
            actor,
            plan.cabinet_id,
            AuditAction::Create,
            "treatment_plan",
            plan.id,
            None,
            lifecycle::snapshot(&plan),
        );
        Ok(plan)
    }

    pub async fn get(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<TreatmentPlan> {
        RoleGuard::new(access::PLAN_READ).check(Some(actor))?;

        let plan = self.store.plans().get_by_id(id).await?;
        self.tenant
            .check_read(actor, plan.cabinet_id, "treatment_plan", id)?;
        Ok(plan)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        mut input: UpdateTreatmentPlan,
    ) -> CliniqResult<TreatmentPlan> {
        RoleGuard::new(access::PLAN_WRITE).check(Some(actor))?;

        let current = self.store.plans().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "treatment_plan", id)?;
        self.tenant
            .check_reassignment(current.cabinet_id, input.cabinet)?;
        lifecycle::sanitize_update("treatment_plan", &mut input);

        if let Some(title) = &input.title {
            lifecycle::require_non_empty("title", title)?;
        }

        // Replaced line items recompute the derived total.
        let total = match &input.treatments {
            Some(treatments) => {
                validate_treatments(treatments)?;
                Some(TreatmentPlan::compute_total(treatments))
            }
            None => None,
        };

        let updated = self
            .store
            .plans()
            .update(current.cabinet_id, id, input, total)
            .await?;

        self.recorder.record_change(
            actor,
            updated.cabinet_id,
            AuditAction::Update,
            "treatment_plan",
            updated.id,
            lifecycle::snapshot(&current),
            lifecycle::snapshot(&updated),
        );
        Ok(updated)
    }

    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<()> {
        RoleGuard::new(access::PLAN_DELETE).check(Some(actor))?;

        let current = self.store.plans().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "treatment_plan", id)?;
        DeleteGuard::check_treatment_plan(&self.store, current.cabinet_id, id).await?;

        self.store.plans().delete(current.cabinet_id, id).await?;

        self.recorder.record_change(
            actor,
            current.cabinet_id,
            AuditAction::Delete,
            "treatment_plan",
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
    ) -> CliniqResult<PaginatedResult<TreatmentPlan>> {
        RoleGuard::new(access::PLAN_READ).check(Some(actor))?;
        let scope = self.tenant.scope(actor)?;
        self.store.plans().list(scope, pagination).await
    }

    pub async fn list_by_patient(
        &self,
        actor: &ActorContext,
        patient_id: Uuid,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<TreatmentPlan>> {
        RoleGuard::new(access::PLAN_READ).check(Some(actor))?;

        let patient = self.store.patients().get_by_id(patient_id).await?;
        self.tenant
            .check_read(actor, patient.cabinet_id, "patient", patient_id)?;
        self.store
            .plans()
            .list_by_patient(patient.cabinet_id, patient_id, pagination)
            .await
    }
}

fn validate_treatments(treatments: &[Treatment]) -> CliniqResult<()> {
    for treatment in treatments {
        lifecycle::require_non_empty("procedure", &treatment.procedure)?;
        if treatment.price < 0.0 {
            return Err(CliniqError::Validation {
                message: "treatment price cannot be negative".into(),
            });
        }
    }
    Ok(())
}
