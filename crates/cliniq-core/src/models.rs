//! Domain models for CLINIQ.
//!
//! These are the core types shared across all crates. Status enums store
//! as their exact variant names so persisted data stays self-describing.

pub mod audit;
pub mod cabinet;
pub mod invoice;
pub mod patient;
pub mod payment;
pub mod treatment_plan;
pub mod visit;
