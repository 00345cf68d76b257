//! Per-entity service facades.
//!
//! Services are the authenticated operation surface: every call checks
//! the role allow-list, then tenant isolation, then runs the shared
//! lifecycle stages around the persist call. They are generic over
//! [`ClinicStore`](cliniq_core::repository::ClinicStore) so the policy
//! layer never depends on the storage crate.

use cliniq_core::repository::ClinicStore;

use crate::audit::AuditRecorder;
use crate::config::PolicyConfig;

mod audit_log;
mod cabinets;
mod invoices;
mod patients;
mod payments;
mod plans;
mod visits;

pub use audit_log::AuditLogService;
pub use cabinets::CabinetService;
pub use invoices::InvoiceService;
pub use patients::PatientService;
pub use payments::PaymentService;
pub use plans::TreatmentPlanService;
pub use visits::VisitService;

/// The full service set, wired to one store and one audit recorder.
pub struct Services<S: ClinicStore> {
    pub cabinets: CabinetService<S>,
    pub patients: PatientService<S>,
    pub plans: TreatmentPlanService<S>,
    pub visits: VisitService<S>,
    pub invoices: InvoiceService<S>,
    pub payments: PaymentService<S>,
    pub audit: AuditLogService<S>,
}

impl<S: ClinicStore> Services<S> {
    pub fn new(store: S, recorder: AuditRecorder, config: &PolicyConfig) -> Self {
        Self {
            cabinets: CabinetService::new(store.clone(), recorder.clone(), config),
            patients: PatientService::new(store.clone(), recorder.clone(), config),
            plans: TreatmentPlanService::new(store.clone(), recorder.clone(), config),
            visits: VisitService::new(store.clone(), recorder.clone(), config),
            invoices: InvoiceService::new(store.clone(), recorder.clone(), config),
            payments: PaymentService::new(store.clone(), recorder, config),
            audit: AuditLogService::new(store, config),
        }
    }
}
