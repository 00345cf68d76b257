//! Payment operations.
//!
//! Every payment write re-derives the owning invoice's status from the
//! stored payments (see [`PaymentReconciler`]); the response reflects
//! the payment, and the invoice change is audited alongside it.

use chrono::Utc;
use cliniq_core::context::ActorContext;
use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::audit::AuditAction;
use cliniq_core::models::payment::{AMOUNT_EPSILON, CreatePayment, Payment, UpdatePayment};
use cliniq_core::repository::{
    ClinicStore, InvoiceRepository, PaginatedResult, Pagination, PatientRepository,
    PaymentRepository,
};
use uuid::Uuid;

use crate::access;
use crate::audit::AuditRecorder;
use crate::config::PolicyConfig;
use crate::lifecycle;
use crate::reconcile::PaymentReconciler;
use crate::role::RoleGuard;
use crate::tenant::{self, TenantIsolationGuard};

pub struct PaymentService<S: ClinicStore> {
    store: S,
    recorder: AuditRecorder,
    tenant: TenantIsolationGuard,
}

impl<S: ClinicStore> PaymentService<S> {
    pub fn new(store: S, recorder: AuditRecorder, config: &PolicyConfig) -> Self {
        Self {
            store,
            recorder,
            tenant: TenantIsolationGuard::new(config),
        }
    }

    pub async fn create(&self, actor: &ActorContext, input: CreatePayment) -> CliniqResult<Payment> {
        // 1. Authorize and resolve the owning cabinet.
        RoleGuard::new(access::PAYMENT_WRITE).check(Some(actor))?;
        let cabinet_id = self.tenant.resolve_create_cabinet(actor, input.cabinet)?;

        // 2. The invoice must live in the same cabinet, and its patient
        //    must still accept payments.
        let invoice = self.store.invoices().get_by_id(input.invoice_id).await?;
        tenant::ensure_in_cabinet(cabinet_id, invoice.cabinet_id, "invoice", invoice.id)?;
        let patient = self.store.patients().get_by_id(invoice.patient_id).await?;
        lifecycle::ensure_patient_active(&patient, "payments")?;

        // 3. Validate against the paid total so far.
        let existing = self
            .store
            .payments()
            .list_by_invoice(cabinet_id, invoice.id)
            .await?;
        let total_paid: f64 = existing.iter().map(|p| p.amount).sum();
        PaymentReconciler::validate_new_payment(&invoice, &input, total_paid)?;

        // 4. Persist, then bring the invoice status in line.
        let received_at = input.received_at.unwrap_or_else(Utc::now);
        let payment = self
            .store
            .payments()
            .create(cabinet_id, Some(actor.actor_id), input, received_at)
            .await?;
        let reconciled = PaymentReconciler::reconcile(&self.store, &invoice).await?;

        // 5. Audit the payment and any derived invoice change.
        self.recorder.record_change(
            actor,
            payment.cabinet_id,
            AuditAction::Create,
            "payment",
            payment.id,
            None,
            lifecycle::snapshot(&payment),
        );
        if reconciled.status != invoice.status {
            self.recorder.record_change(
                actor,
                invoice.cabinet_id,
                AuditAction::Update,
                "invoice",
                invoice.id,
                lifecycle::snapshot(&invoice),
                lifecycle::snapshot(&reconciled),
            );
        }
        Ok(payment)
    }

    pub async fn get(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<Payment> {
        RoleGuard::new(access::PAYMENT_READ).check(Some(actor))?;

        let payment = self.store.payments().get_by_id(id).await?;
        self.tenant
            .check_read(actor, payment.cabinet_id, "payment", id)?;
        Ok(payment)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        mut input: UpdatePayment,
    ) -> CliniqResult<Payment> {
        RoleGuard::new(access::PAYMENT_WRITE).check(Some(actor))?;

        let current = self.store.payments().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "payment", id)?;
        self.tenant
            .check_reassignment(current.cabinet_id, input.cabinet)?;
        lifecycle::sanitize_update("payment", &mut input);

        let invoice = self.store.invoices().get_by_id(current.invoice_id).await?;

        // An amended amount still has to fit the invoice.
        if let Some(amount) = input.amount {
            if amount <= 0.0 {
                return Err(CliniqError::Validation {
                    message: "payment amount must be positive".into(),
                });
            }
            let payments = self
                .store
                .payments()
                .list_by_invoice(current.cabinet_id, invoice.id)
                .await?;
            let others: f64 = payments
                .iter()
                .filter(|p| p.id != id)
                .map(|p| p.amount)
                .sum();
            let remaining = invoice.total - others;
            if amount > remaining + AMOUNT_EPSILON {
                return Err(CliniqError::Overpayment { amount, remaining });
            }
        }

        let updated = self
            .store
            .payments()
            .update(current.cabinet_id, id, input)
            .await?;
        let reconciled = PaymentReconciler::reconcile(&self.store, &invoice).await?;

        self.recorder.record_change(
            actor,
            updated.cabinet_id,
            AuditAction::Update,
            "payment",
            updated.id,
            lifecycle::snapshot(&current),
            lifecycle::snapshot(&updated),
        );
        if reconciled.status != invoice.status {
            self.recorder.record_change(
                actor,
                invoice.cabinet_id,
                AuditAction::Update,
                "invoice",
                invoice.id,
                lifecycle::snapshot(&invoice),
                lifecycle::snapshot(&reconciled),
            );
        }
        Ok(updated)
    }

    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> CliniqResult<()> {
        RoleGuard::new(access::PAYMENT_DELETE).check(Some(actor))?;

        let current = self.store.payments().get_by_id(id).await?;
        self.tenant
            .check_read(actor, current.cabinet_id, "payment", id)?;
        let invoice = self.store.invoices().get_by_id(current.invoice_id).await?;

        self.store.payments().delete(current.cabinet_id, id).await?;

        // Terminal invoices keep their status; the rest re-derive from
        // the remaining payments.
        let reconciled = PaymentReconciler::reconcile(&self.store, &invoice).await?;

        self.recorder.record_change(
            actor,
            current.cabinet_id,
            AuditAction::Delete,
            "payment",
            current.id,
            lifecycle::snapshot(&current),
            None,
        );
        if reconciled.status != invoice.status {
            self.recorder.record_change(
                actor,
                invoice.cabinet_id,
                AuditAction::Update,
                "invoice",
                invoice.id,
                lifecycle::snapshot(&invoice),
                lifecycle::snapshot(&reconciled),
            );
        }
        Ok(())
    }

    pub async fn list(
        &self,
        actor: &ActorContext,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<Payment>> {
        RoleGuard::new(access::PAYMENT_READ).check(Some(actor))?;
        let scope = self.tenant.scope(actor)?;
        self.store.payments().list(scope, pagination).await
    }

    pub async fn list_by_invoice(
        &self,
        actor: &ActorContext,
        invoice_id: Uuid,
    ) -> CliniqResult<Vec<Payment>> {
        RoleGuard::new(access::PAYMENT_READ).check(Some(actor))?;

        let invoice = self.store.invoices().get_by_id(invoice_id).await?;
        self.tenant
            .check_read(actor, invoice.cabinet_id, "invoice", invoice_id)?;
        self.store
            .payments()
            .list_by_invoice(invoice.cabinet_id, invoice_id)
            .await
    }
}
