//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Reads fetch by bare id: the
//! tenant comparison happens in the isolation guard, which also decides
//! how a mismatch surfaces to the caller. Mutations keep a `cabinet_id`
//! parameter so their `where` clause stays cabinet-scoped even if a
//! caller skips the guard, and list queries take an explicit
//! [`TenantScope`] so the injected tenant filter is visible at this seam.
//!
//! `cabinet_id` and `created_by` on `create` are separate parameters
//! rather than payload fields: both are populated server-side from the
//! actor context and are write-once.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::context::TenantScope;
use crate::error::CliniqResult;
use crate::models::{
    audit::{AuditAction, AuditLogEntry, CreateAuditLogEntry},
    cabinet::{Cabinet, CreateCabinet, UpdateCabinet},
    invoice::{CreateInvoice, Invoice, UpdateInvoice},
    patient::{CreatePatient, Patient, UpdatePatient},
    payment::{CreatePayment, Payment, UpdatePayment},
    treatment_plan::{CreateTreatmentPlan, TreatmentPlan, UpdateTreatmentPlan},
    visit::{CreateVisit, UpdateVisit, Visit},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Cabinets (global scope)
// ---------------------------------------------------------------------------

pub trait CabinetRepository: Send + Sync {
    fn create(&self, input: CreateCabinet) -> impl Future<Output = CliniqResult<Cabinet>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CliniqResult<Cabinet>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCabinet,
    ) -> impl Future<Output = CliniqResult<Cabinet>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<Cabinet>>> + Send;
}

// ---------------------------------------------------------------------------
// Cabinet-scoped repositories
// ---------------------------------------------------------------------------

pub trait PatientRepository: Send + Sync {
    fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreatePatient,
    ) -> impl Future<Output = CliniqResult<Patient>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CliniqResult<Patient>> + Send;
    fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdatePatient,
    ) -> impl Future<Output = CliniqResult<Patient>> + Send;
    fn delete(&self, cabinet_id: Uuid, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;
    fn list(
        &self,
        scope: TenantScope,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<Patient>>> + Send;
}

pub trait TreatmentPlanRepository: Send + Sync {
    /// `total_price` is the server-computed sum over the line items.
    fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreateTreatmentPlan,
        total_price: f64,
    ) -> impl Future<Output = CliniqResult<TreatmentPlan>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CliniqResult<TreatmentPlan>> + Send;
    /// `total_price` is the recomputed aggregate when the line items
    /// changed; `None` leaves the stored total untouched.
    fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdateTreatmentPlan,
        total_price: Option<f64>,
    ) -> impl Future<Output = CliniqResult<TreatmentPlan>> + Send;
    fn delete(&self, cabinet_id: Uuid, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;
    fn list(
        &self,
        scope: TenantScope,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<TreatmentPlan>>> + Send;
    fn list_by_patient(
        &self,
        cabinet_id: Uuid,
        patient_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<TreatmentPlan>>> + Send;
    fn count_by_patient(
        &self,
        cabinet_id: Uuid,
        patient_id: Uuid,
    ) -> impl Future<Output = CliniqResult<u64>> + Send;
}

pub trait VisitRepository: Send + Sync {
    /// New visits persist as `Scheduled`; callers cannot pick a status.
    fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreateVisit,
    ) -> impl Future<Output = CliniqResult<Visit>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CliniqResult<Visit>> + Send;
    fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdateVisit,
    ) -> impl Future<Output = CliniqResult<Visit>> + Send;
    fn delete(&self, cabinet_id: Uuid, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;
    fn list(
        &self,
        scope: TenantScope,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<Visit>>> + Send;
    fn count_by_patient(
        &self,
        cabinet_id: Uuid,
        patient_id: Uuid,
    ) -> impl Future<Output = CliniqResult<u64>> + Send;
}

pub trait InvoiceRepository: Send + Sync {
    /// `number` is generated server-side; new invoices persist as `Draft`.
    fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreateInvoice,
        number: String,
    ) -> impl Future<Output = CliniqResult<Invoice>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CliniqResult<Invoice>> + Send;
    fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdateInvoice,
    ) -> impl Future<Output = CliniqResult<Invoice>> + Send;
    fn delete(&self, cabinet_id: Uuid, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;
    fn list(
        &self,
        scope: TenantScope,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<Invoice>>> + Send;
    /// Uniqueness probe for the number generator; `None` means the
    /// candidate number is free within the cabinet.
    fn get_by_number(
        &self,
        cabinet_id: Uuid,
        number: &str,
    ) -> impl Future<Output = CliniqResult<Option<Invoice>>> + Send;
    /// Most recently created invoice in the cabinet, if any.
    fn last_created(
        &self,
        cabinet_id: Uuid,
    ) -> impl Future<Output = CliniqResult<Option<Invoice>>> + Send;
    fn count_by_patient(
        &self,
        cabinet_id: Uuid,
        patient_id: Uuid,
    ) -> impl Future<Output = CliniqResult<u64>> + Send;
    fn count_by_treatment_plan(
        &self,
        cabinet_id: Uuid,
        treatment_plan_id: Uuid,
    ) -> impl Future<Output = CliniqResult<u64>> + Send;
}

pub trait PaymentRepository: Send + Sync {
    fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreatePayment,
        received_at: DateTime<Utc>,
    ) -> impl Future<Output = CliniqResult<Payment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CliniqResult<Payment>> + Send;
    fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdatePayment,
    ) -> impl Future<Output = CliniqResult<Payment>> + Send;
    fn delete(&self, cabinet_id: Uuid, id: Uuid) -> impl Future<Output = CliniqResult<()>> + Send;
    fn list(
        &self,
        scope: TenantScope,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<Payment>>> + Send;
    /// All payments recorded against one invoice; reconciliation sums these.
    fn list_by_invoice(
        &self,
        cabinet_id: Uuid,
        invoice_id: Uuid,
    ) -> impl Future<Output = CliniqResult<Vec<Payment>>> + Send;
    fn count_by_invoice(
        &self,
        cabinet_id: Uuid,
        invoice_id: Uuid,
    ) -> impl Future<Output = CliniqResult<u64>> + Send;
    fn count_by_patient(
        &self,
        cabinet_id: Uuid,
        patient_id: Uuid,
    ) -> impl Future<Output = CliniqResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only, cabinet-scoped)
// ---------------------------------------------------------------------------

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = CliniqResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        scope: TenantScope,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = CliniqResult<PaginatedResult<AuditLogEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Store bundle
// ---------------------------------------------------------------------------

/// The full set of repositories the service layer operates over.
///
/// Services are generic over this bundle so they carry no dependency on
/// the storage crate, and so cross-entity operations (dependent-record
/// checks before a delete, payment reconciliation against an invoice)
/// run against the same store handle.
pub trait ClinicStore: Clone + Send + Sync {
    type Cabinets: CabinetRepository;
    type Patients: PatientRepository;
    type Plans: TreatmentPlanRepository;
    type Visits: VisitRepository;
    type Invoices: InvoiceRepository;
    type Payments: PaymentRepository;
    type Audit: AuditLogRepository;

    fn cabinets(&self) -> &Self::Cabinets;
    fn patients(&self) -> &Self::Patients;
    fn plans(&self) -> &Self::Plans;
    fn visits(&self) -> &Self::Visits;
    fn invoices(&self) -> &Self::Invoices;
    fn payments(&self) -> &Self::Payments;
    fn audit(&self) -> &Self::Audit;
}
