//! CLINIQ Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `cliniq-core` traits, bundled
//!   behind [`SurrealStore`]
//! - Error types ([`DbError`])

mod connection;
mod error;
mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{
    SurrealAuditLogRepository, SurrealCabinetRepository, SurrealInvoiceRepository,
    SurrealPatientRepository, SurrealPaymentRepository, SurrealStore,
    SurrealTreatmentPlanRepository, SurrealVisitRepository,
};
pub use schema::{run_migrations, schema_v1};
