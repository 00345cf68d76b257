//! SurrealDB repository implementations.

mod audit;
mod cabinet;
mod invoice;
mod patient;
mod payment;
mod store;
mod treatment_plan;
mod visit;

pub use audit::SurrealAuditLogRepository;
pub use cabinet::SurrealCabinetRepository;
pub use invoice::SurrealInvoiceRepository;
pub use patient::SurrealPatientRepository;
pub use payment::SurrealPaymentRepository;
pub use store::SurrealStore;
pub use treatment_plan::SurrealTreatmentPlanRepository;
pub use visit::SurrealVisitRepository;
