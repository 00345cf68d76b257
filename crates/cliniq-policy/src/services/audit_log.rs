//! Read-only audit trail queries.

use cliniq_core::context::ActorContext;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::audit::AuditLogEntry;
use cliniq_core::repository::{
    AuditLogFilter, AuditLogRepository, ClinicStore, PaginatedResult, Pagination,
};

use crate::access;
use crate::config::PolicyConfig;
use crate::role::RoleGuard;
use crate::tenant::TenantIsolationGuard;

/// Query surface over the append-only audit log. There is no write
/// surface here; entries arrive through the outbox only.
pub struct AuditLogService<S: ClinicStore> {
    store: S,
    tenant: TenantIsolationGuard,
}

impl<S: ClinicStore> AuditLogService<S> {
    pub fn new(store: S, config: &PolicyConfig) -> Self {
        Self {
            store,
            tenant: TenantIsolationGuard::new(config),
        }
    }

    pub async fn list(
        &self,
        actor: &ActorContext,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<AuditLogEntry>> {
        RoleGuard::new(access::AUDIT_READ).check(Some(actor))?;
        let scope = self.tenant.scope(actor)?;
        self.store.audit().list(scope, filter, pagination).await
    }
}
