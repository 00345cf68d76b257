//! CLINIQ Policy — tenant isolation, authorization, and transactional
//! integrity.
//!
//! This crate is the guarded operation surface over the clinic store:
//! - Static per-operation role allow-lists ([`access`]) enforced by
//!   [`RoleGuard`]
//! - Tenant isolation with cross-cabinet masking
//!   ([`TenantIsolationGuard`])
//! - Shared write-lifecycle stages: field stripping, transition checks,
//!   audit snapshots ([`lifecycle`])
//! - Per-cabinet invoice numbering ([`SequenceGenerator`])
//! - Payment-to-invoice reconciliation ([`PaymentReconciler`])
//! - Dependent-record checks before hard deletes ([`DeleteGuard`])
//! - A deferred audit outbox ([`AuditRecorder`], [`AuditOutbox`])
//! - Per-entity services composing all of the above ([`services`])

pub mod access;
pub mod audit;
pub mod config;
pub mod delete_guard;
pub mod lifecycle;
pub mod reconcile;
pub mod role;
pub mod sequence;
pub mod services;
pub mod tenant;

pub use audit::{AuditOutbox, AuditRecorder};
pub use config::PolicyConfig;
pub use delete_guard::DeleteGuard;
pub use reconcile::PaymentReconciler;
pub use role::RoleGuard;
pub use sequence::SequenceGenerator;
pub use services::{
    AuditLogService, CabinetService, InvoiceService, PatientService, PaymentService, Services,
    TreatmentPlanService, VisitService,
};
pub use tenant::TenantIsolationGuard;
