//! Referential integrity checks ahead of physical deletes.
//!
//! Deletes are hard deletes, so an entity with dependent records cannot
//! go: the guard counts dependents relation by relation and reports the
//! first non-empty one. Checks and the delete that follows run against
//! the same store handle; the window between them is accepted (there is
//! no cross-record transaction here).

use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::repository::{
    ClinicStore, InvoiceRepository, PaymentRepository, TreatmentPlanRepository, VisitRepository,
};
use uuid::Uuid;

pub struct DeleteGuard;

impl DeleteGuard {
    /// A patient with any clinical or billing history is not deletable;
    /// archiving is the supported alternative.
    pub async fn check_patient<S: ClinicStore>(
        store: &S,
        cabinet_id: Uuid,
        patient_id: Uuid,
    ) -> CliniqResult<()> {
        let visits = store
            .visits()
            .count_by_patient(cabinet_id, patient_id)
            .await?;
        if visits > 0 {
            return Err(blocked("patient", "visits", visits));
        }

        let plans = store
            .plans()
            .count_by_patient(cabinet_id, patient_id)
            .await?;
        if plans > 0 {
            return Err(blocked("patient", "treatment plans", plans));
        }

        let invoices = store
            .invoices()
            .count_by_patient(cabinet_id, patient_id)
            .await?;
        if invoices > 0 {
            return Err(blocked("patient", "invoices", invoices));
        }

        let payments = store
            .payments()
            .count_by_patient(cabinet_id, patient_id)
            .await?;
        if payments > 0 {
            return Err(blocked("patient", "payments", payments));
        }

        Ok(())
    }

    /// A plan that has been invoiced stays; cancel its treatments instead.
    pub async fn check_treatment_plan<S: ClinicStore>(
        store: &S,
        cabinet_id: Uuid,
        plan_id: Uuid,
    ) -> CliniqResult<()> {
        let invoices = store
            .invoices()
            .count_by_treatment_plan(cabinet_id, plan_id)
            .await?;
        if invoices > 0 {
            return Err(blocked("treatment plan", "invoices", invoices));
        }
        Ok(())
    }

    /// An invoice with recorded payments stays; cancel it instead.
    pub async fn check_invoice<S: ClinicStore>(
        store: &S,
        cabinet_id: Uuid,
        invoice_id: Uuid,
    ) -> CliniqResult<()> {
        let payments = store
            .payments()
            .count_by_invoice(cabinet_id, invoice_id)
            .await?;
        if payments > 0 {
            return Err(blocked("invoice", "payments", payments));
        }
        Ok(())
    }
}

fn blocked(entity: &str, relation: &str, count: u64) -> CliniqError {
    CliniqError::DeleteBlocked {
        entity: entity.into(),
        relation: relation.into(),
        count,
    }
}
