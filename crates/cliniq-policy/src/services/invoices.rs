//! Invoice operations.
//!
//! Invoices are created as drafts with a server-allocated cabinet-local
//! number; status changes walk the invoice transition table, and the
//! issue timestamp is set once on the `Draft -> Issued` edge by the
//! storage layer.

use cliniq_core::context::ActorContext;
use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::audit::AuditAction;
use cliniq_core::models::invoice::{CreateInvoice, Invoice, InvoiceStatus, UpdateInvoice};
use cliniq_core::repository::{
    ClinicStore, InvoiceRepository, PaginatedResult, Pagination, PatientRepository,
    TreatmentPlanRepository,
};
use cliniq_core::statemachine::INVOICE_TRANSITIONS;
use uuid::Uuid;

use crate::access;
use crate::audit::AuditRecorder;
use crate::config::PolicyConfig;
use crate::delete_guard::DeleteGuard;
use crate::lifecycle;
use crate::role::RoleGuard;
use crate::sequence::SequenceGenerator;
use crate::tenant::{self, TenantIsolationGuard};

pub struct InvoiceService<S: ClinicStore> {
    store: S,
    recorder: AuditRecorder,
    tenant: TenantIsolationGuard,
}

impl<S: ClinicStore> InvoiceService<S> {
    pub fn new(store: S, recorder: AuditRecorder, config: &PolicyConfig) -> Self {
        Self {
            store,
            recorder,
            tenant: TenantIsolationGuard::new(config),
        }
    }

    pub async fn create(&self, actor: &ActorContext, input: CreateInvoice) -> CliniqResult<Invoice> {
        // 1. Authorize and resolve the owning cabinet.
        RoleGuard::new(access::INVOICE_WRITE).check(Some(actor))?;
        let cabinet_id = self.tenant.resolve_create_cabinet(actor, input.cabinet)?;

        // 2. Cross-references stay inside the cabinet.
        let patient = self.store.patients().get_by_id(input.patient_id).await?;
        tenant::ensure_in_cabinet(cabinet_id, patient.cabinet_id, "patient", patient.id)?;
        if let Some(plan_id) = input.treatment_plan_id {
            let plan = self.store.plans().get_by_id(plan_id).await?;
            tenant::ensure_in_cabinet(cabinet_id, plan.cabinet_id, "treatment_plan", plan_id)?;
            if plan.patient_id != input.patient_id {
                return Err(CliniqError::Validation {
                    message: "treatment plan belongs to a different patient".into(),
                });
            }
        }

        // 3. Validate.
        if input.total < 0.0 {
            return Err(CliniqError::Validation {
                message: "invoice total cannot be negative".into(),
            });
        }

        // 4. Allocate the cabinet-local number and persist as a draft.
        let number =
            SequenceGenerator::next_invoice_number(self.store.invoices(), cabinet_id).await?;
        let invoice = self
            .store
            .invoices()
            .create(cabinet_id, Some(actor.actor_id), input, number)
            .await?;

        // 5. Audit.
        self.recorder.record_change(
            actor,
            invoice.cabinet_id,
            AuditAction::Create,
            "invoice",
            invoice.id,
            None,
            lifecycle::snapshot(&invoice),
        );
        Ok(invoice)
    }

    pub async fn get(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<Invoice> {
        RoleGuard::new(access::INVOICE_READ).check(Some(actor))?;

        let invoice = self.store.invoices().get_by_id(id).await?;
        self.tenant
            .check_read(actor, invoice.cabinet_id, "invoice", id)?;
        Ok(invoice)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        mut input: UpdateInvoice,
    ) -> CliniqResult<Invoice> {
        RoleGuard::new(access::INVOICE_WRITE).check(Some(actor))?;

        let current = self.store.invoices().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "invoice", id)?;
        self.tenant
            .check_reassignment(current.cabinet_id, input.cabinet)?;
        lifecycle::sanitize_update("invoice", &mut input);

        // A requested status change must be a legal edge; the stored
        // status stays put otherwise.
        if let Some(next) = input.status {
            lifecycle::ensure_transition(
                &INVOICE_TRANSITIONS,
                "invoice",
                current.status,
                next,
                InvoiceStatus::as_str,
            )?;
        }
        if let Some(total) = input.total {
            if total < 0.0 {
                return Err(CliniqError::Validation {
                    message: "invoice total cannot be negative".into(),
                });
            }
        }

        let updated = self
            .store
            .invoices()
            .update(current.cabinet_id, id, input)
            .await?;

        self.recorder.record_change(
            actor,
            updated.cabinet_id,
            AuditAction::Update,
            "invoice",
            updated.id,
            lifecycle::snapshot(&current),
            lifecycle::snapshot(&updated),
        );
        Ok(updated)
    }

    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<()> {
        RoleGuard::new(access::INVOICE_DELETE).check(Some(actor))?;

        let current = self.store.invoices().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "invoice", id)?;
        DeleteGuard::check_invoice(&self.store, current.cabinet_id, id).await?;

        self.store.invoices().delete(current.cabinet_id, id).await?;

        self.recorder.record_change(
            actor,
            current.cabinet_id,
            AuditAction::Delete,
            "invoice",
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
    ) -> CliniqResult<PaginatedResult<Invoice>> {
        RoleGuard::new(access::INVOICE_READ).check(Some(actor))?;
        let scope = self.tenant.scope(actor)?;
        self.store.invoices().list(scope, pagination).await
    }
}
