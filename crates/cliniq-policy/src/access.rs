//! Static access table: role allow-lists per operation.
//!
//! Lists are data, fixed at compile time; [`crate::role::RoleGuard`]
//! interprets them. An empty list admits any authenticated role, and
//! super-admins bypass every list.

use cliniq_core::context::Role;

/// Open to any authenticated actor.
pub const ANY_AUTHENTICATED: &[Role] = &[];

// Cabinets are the tenant boundary itself, so creating or enumerating
// them is platform administration, not clinic work.
pub const CABINET_CREATE: &[Role] = &[Role::SuperAdmin];
pub const CABINET_LIST: &[Role] = &[Role::SuperAdmin];
pub const CABINET_READ: &[Role] = ANY_AUTHENTICATED;
pub const CABINET_UPDATE: &[Role] = &[Role::CabinetAdmin];

pub const PATIENT_READ: &[Role] = ANY_AUTHENTICATED;
pub const PATIENT_WRITE: &[Role] = &[Role::CabinetAdmin, Role::Clinician, Role::Receptionist];
pub const PATIENT_DELETE: &[Role] = &[Role::CabinetAdmin];

pub const PLAN_READ: &[Role] = ANY_AUTHENTICATED;
pub const PLAN_WRITE: &[Role] = &[Role::CabinetAdmin, Role::Clinician];
pub const PLAN_DELETE: &[Role] = &[Role::CabinetAdmin];

pub const VISIT_READ: &[Role] = ANY_AUTHENTICATED;
pub const VISIT_WRITE: &[Role] = &[Role::CabinetAdmin, Role::Clinician, Role::Receptionist];
pub const VISIT_DELETE: &[Role] = &[Role::CabinetAdmin];

pub const INVOICE_READ: &[Role] = ANY_AUTHENTICATED;
pub const INVOICE_WRITE: &[Role] = &[Role::CabinetAdmin, Role::Accountant];
/// Deleting billing records is reserved for cabinet admins; accountants
/// cancel invoices instead.
pub const INVOICE_DELETE: &[Role] = &[Role::CabinetAdmin];

pub const PAYMENT_READ: &[Role] = ANY_AUTHENTICATED;
pub const PAYMENT_WRITE: &[Role] = &[Role::CabinetAdmin, Role::Accountant, Role::Receptionist];
pub const PAYMENT_DELETE: &[Role] = &[Role::CabinetAdmin];

pub const AUDIT_READ: &[Role] = &[Role::CabinetAdmin];
