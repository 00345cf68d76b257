//! SurrealDB-backed [`ClinicStore`] bundle.

use cliniq_core::repository::ClinicStore;
use surrealdb::{Connection, Surreal};

use super::{
    SurrealAuditLogRepository, SurrealCabinetRepository, SurrealInvoiceRepository,
    SurrealPatientRepository, SurrealPaymentRepository, SurrealTreatmentPlanRepository,
    SurrealVisitRepository,
};

/// All CLINIQ repositories over one SurrealDB connection.
///
/// `Surreal` handles are cheap to clone (shared connection state), so
/// each repository keeps its own.
#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    cabinets: SurrealCabinetRepository<C>,
    patients: SurrealPatientRepository<C>,
    plans: SurrealTreatmentPlanRepository<C>,
    visits: SurrealVisitRepository<C>,
    invoices: SurrealInvoiceRepository<C>,
    payments: SurrealPaymentRepository<C>,
    audit: SurrealAuditLogRepository<C>,
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            cabinets: SurrealCabinetRepository::new(db.clone()),
            patients: SurrealPatientRepository::new(db.clone()),
            plans: SurrealTreatmentPlanRepository::new(db.clone()),
            visits: SurrealVisitRepository::new(db.clone()),
            invoices: SurrealInvoiceRepository::new(db.clone()),
            payments: SurrealPaymentRepository::new(db.clone()),
            audit: SurrealAuditLogRepository::new(db),
        }
    }
}

impl<C: Connection + Clone> ClinicStore for SurrealStore<C> {
    type Cabinets = SurrealCabinetRepository<C>;
    type Patients = SurrealPatientRepository<C>;
    type Plans = SurrealTreatmentPlanRepository<C>;
    type Visits = SurrealVisitRepository<C>;
    type Invoices = SurrealInvoiceRepository<C>;
    type Payments = SurrealPaymentRepository<C>;
    type Audit = SurrealAuditLogRepository<C>;

    fn cabinets(&self) -> &Self::Cabinets {
        &self.cabinets
    }

    fn patients(&self) -> &Self::Patients {
        &self.patients
    }

    fn plans(&self) -> &Self::Plans {
        &self.plans
    }

    fn visits(&self) -> &Self::Visits {
        &self.visits
    }

    fn invoices(&self) -> &Self::Invoices {
        &self.invoices
    }

    fn payments(&self) -> &Self::Payments {
        &self.payments
    }

    fn audit(&self) -> &Self::Audit {
        &self.audit
    }
}
