//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The `audit_log` table is append-only: schema permissions reject
//! update and delete, so this impl only ever creates and selects.

use chrono::{DateTime, Utc};
use cliniq_core::context::TenantScope;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::audit::{AuditAction, AuditLogEntry, CreateAuditLogEntry};
use cliniq_core::repository::{AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AuditRow {
    cabinet_id: Option<String>,
    actor_id: Option<String>,
    action: String,
    entity_type: String,
    entity_id: String,
    old_state: Option<serde_json::Value>,
    new_state: Option<serde_json::Value>,
    ip_address: Option<String>,
    timestamp: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    cabinet_id: Option<String>,
    actor_id: Option<String>,
    action: String,
    entity_type: String,
    entity_id: String,
    old_state: Option<serde_json::Value>,
    new_state: Option<serde_json::Value>,
    ip_address: Option<String>,
    timestamp: DateTime<Utc>,
}

fn parse_action(s: &str) -> Result<AuditAction, DbError> {
    match s {
        "Create" => Ok(AuditAction::Create),
        "Update" => Ok(AuditAction::Update),
        "Delete" => Ok(AuditAction::Delete),
        "View" => Ok(AuditAction::View),
        other => Err(DbError::Migration(format!("unknown audit action: {other}"))),
    }
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditLogEntry, DbError> {
        let cabinet_id = match self.cabinet_id {
            Some(s) => Some(
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid cabinet UUID: {e}")))?,
            ),
            None => None,
        };
        let actor_id = match self.actor_id {
            Some(s) => Some(
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid actor UUID: {e}")))?,
            ),
            None => None,
        };
        Ok(AuditLogEntry {
            id,
            cabinet_id,
            actor_id,
            action: parse_action(&self.action)?,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            old_state: self.old_state,
            new_state: self.new_state,
            ip_address: self.ip_address,
            timestamp: self.timestamp,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = AuditRow {
            cabinet_id: self.cabinet_id,
            actor_id: self.actor_id,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            old_state: self.old_state,
            new_state: self.new_state,
            ip_address: self.ip_address,
            timestamp: self.timestamp,
        };
        row.into_entry(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> CliniqResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let cabinet_id_str = input.cabinet_id.map(|u| u.to_string());
        let actor_id_str = input.actor_id.map(|u| u.to_string());

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 cabinet_id = $cabinet_id, \
                 actor_id = $actor_id, \
                 action = $action, \
                 entity_type = $entity_type, \
                 entity_id = $entity_id, \
                 old_state = $old_state, \
                 new_state = $new_state, \
                 ip_address = $ip_address",
            )
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str))
            .bind(("actor_id", actor_id_str))
            .bind(("action", input.action.as_str().to_string()))
            .bind(("entity_type", input.entity_type))
            .bind(("entity_id", input.entity_id))
            .bind(("old_state", input.old_state))
            .bind(("new_state", input.new_state))
            .bind(("ip_address", input.ip_address))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        scope: TenantScope,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<AuditLogEntry>> {
        let mut conds: Vec<&str> = Vec::new();
        let cabinet_id_str = match scope {
            TenantScope::All => None,
            TenantScope::Cabinet(id) => {
                conds.push("cabinet_id = $cabinet_id");
                Some(id.to_string())
            }
        };
        if filter.actor_id.is_some() {
            conds.push("actor_id = $actor_id");
        }
        if filter.action.is_some() {
            conds.push("action = $action");
        }
        if filter.entity_type.is_some() {
            conds.push("entity_type = $entity_type");
        }
        if filter.entity_id.is_some() {
            conds.push("entity_id = $entity_id");
        }
        if filter.from.is_some() {
            conds.push("timestamp >= $from");
        }
        if filter.to.is_some() {
            conds.push("timestamp <= $to");
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conds.join(" AND "))
        };

        let count_query = format!("SELECT count() AS total FROM audit_log {where_clause} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(ref cabinet_id) = cabinet_id_str {
            count_builder = count_builder.bind(("cabinet_id", cabinet_id.clone()));
        }
        if let Some(actor_id) = filter.actor_id {
            count_builder = count_builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(ref action) = filter.action {
            count_builder = count_builder.bind(("action", action.as_str().to_string()));
        }
        if let Some(ref entity_type) = filter.entity_type {
            count_builder = count_builder.bind(("entity_type", entity_type.clone()));
        }
        if let Some(ref entity_id) = filter.entity_id {
            count_builder = count_builder.bind(("entity_id", entity_id.clone()));
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(("to", to));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_log {where_clause} \
             ORDER BY timestamp DESC \
             LIMIT $limit START $offset"
        );
        let mut builder = self
            .db
            .query(&page_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(cabinet_id) = cabinet_id_str {
            builder = builder.bind(("cabinet_id", cabinet_id));
        }
        if let Some(actor_id) = filter.actor_id {
            builder = builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(ref action) = filter.action {
            builder = builder.bind(("action", action.as_str().to_string()));
        }
        if let Some(entity_type) = filter.entity_type {
            builder = builder.bind(("entity_type", entity_type));
        }
        if let Some(entity_id) = filter.entity_id {
            builder = builder.bind(("entity_id", entity_id));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
