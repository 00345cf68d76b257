//! CLINIQ Core — domain models, error taxonomy, and repository traits.
//!
//! This crate provides:
//! - Domain models for every clinic entity ([`models`])
//! - The actor identity consumed by every guarded operation
//!   ([`ActorContext`], [`TenantScope`])
//! - The shared error taxonomy ([`CliniqError`], [`ErrorKind`])
//! - Status transition tables for invoices and visits ([`StateMachine`])
//! - Repository traits the storage crate implements ([`repository`])
//!
//! Everything here is storage-agnostic; the SurrealDB implementations
//! live in `cliniq-db` and the guard/service layer in `cliniq-policy`.

pub mod context;
pub mod error;
pub mod models;
pub mod repository;
pub mod statemachine;

pub use context::{ActorContext, Role, TenantScope};
pub use error::{CliniqError, CliniqResult, ErrorBody, ErrorKind};
pub use statemachine::{INVOICE_TRANSITIONS, StateMachine, VISIT_TRANSITIONS};
