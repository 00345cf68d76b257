//! SurrealDB implementation of [`VisitRepository`].

use chrono::{DateTime, Utc};
use cliniq_core::context::TenantScope;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::visit::{CreateVisit, UpdateVisit, Visit, VisitStatus};
use cliniq_core::repository::{PaginatedResult, Pagination, VisitRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct VisitRow {
    cabinet_id: String,
    patient_id: String,
    scheduled_at: DateTime<Utc>,
    reason: Option<String>,
    status: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct VisitRowWithId {
    record_id: String,
    cabinet_id: String,
    patient_id: String,
    scheduled_at: DateTime<Utc>,
    reason: Option<String>,
    status: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<VisitStatus, DbError> {
    match s {
        "Scheduled" => Ok(VisitStatus::Scheduled),
        "Confirmed" => Ok(VisitStatus::Confirmed),
        "Completed" => Ok(VisitStatus::Completed),
        "Cancelled" => Ok(VisitStatus::Cancelled),
        other => Err(DbError::Migration(format!("unknown visit status: {other}"))),
    }
}

impl VisitRow {
    fn into_visit(self, id: Uuid) -> Result<Visit, DbError> {
        let cabinet_id = Uuid::parse_str(&self.cabinet_id)
            .map_err(|e| DbError::Migration(format!("invalid cabinet UUID: {e}")))?;
        let patient_id = Uuid::parse_str(&self.patient_id)
            .map_err(|e| DbError::Migration(format!("invalid patient UUID: {e}")))?;
        let created_by = match self.created_by {
            Some(s) => Some(
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?,
            ),
            None => None,
        };
        Ok(Visit {
            id,
            cabinet_id,
            patient_id,
            scheduled_at: self.scheduled_at,
            reason: self.reason,
            status: parse_status(&self.status)?,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl VisitRowWithId {
    fn try_into_visit(self) -> Result<Visit, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = VisitRow {
            cabinet_id: self.cabinet_id,
            patient_id: self.patient_id,
            scheduled_at: self.scheduled_at,
            reason: self.reason,
            status: self.status,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_visit(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Visit repository.
#[derive(Clone)]
pub struct SurrealVisitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealVisitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> VisitRepository for SurrealVisitRepository<C> {
    async fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreateVisit,
    ) -> CliniqResult<Visit> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();
        let patient_id_str = input.patient_id.to_string();
        let created_by_str = created_by.map(|u| u.to_string());

        let result = self
            .db
            .query(
                "CREATE type::record('visit', $id) SET \
                 cabinet_id = $cabinet_id, \
                 patient_id = $patient_id, \
                 scheduled_at = $scheduled_at, \
                 reason = $reason, \
                 status = 'Scheduled', \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str))
            .bind(("patient_id", patient_id_str))
            .bind(("scheduled_at", input.scheduled_at))
            .bind(("reason", input.reason))
            .bind(("created_by", created_by_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<VisitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "visit".into(),
            id: id_str,
        })?;

        Ok(row.into_visit(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<Visit> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('visit', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VisitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "visit".into(),
            id: id_str,
        })?;

        Ok(row.into_visit(id)?)
    }

    async fn update(&self, cabinet_id: Uuid, id: Uuid, input: UpdateVisit) -> CliniqResult<Visit> {
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();

        let mut sets = Vec::new();
        if input.scheduled_at.is_some() {
            sets.push("scheduled_at = $scheduled_at");
        }
        if input.reason.is_some() {
            sets.push("reason = $reason");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('visit', $id) SET {} \
             WHERE cabinet_id = $cabinet_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str));

        if let Some(scheduled_at) = input.scheduled_at {
            builder = builder.bind(("scheduled_at", scheduled_at));
        }
        if let Some(reason) = input.reason {
            builder = builder.bind(("reason", reason));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<VisitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "visit".into(),
            id: id_str,
        })?;

        Ok(row.into_visit(id)?)
    }

    async fn delete(&self, cabinet_id: Uuid, id: Uuid) -> CliniqResult<()> {
        self.db
            .query("DELETE type::record('visit', $id) WHERE cabinet_id = $cabinet_id")
            .bind(("id", id.to_string()))
            .bind(("cabinet_id", cabinet_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        scope: TenantScope,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<Visit>> {
        let filter = match scope {
            TenantScope::All => "",
            TenantScope::Cabinet(_) => "WHERE cabinet_id = $cabinet_id",
        };
        let cabinet_id_str = match scope {
            TenantScope::All => None,
            TenantScope::Cabinet(id) => Some(id.to_string()),
        };

        let count_query = format!("SELECT count() AS total FROM visit {filter} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(ref cabinet_id) = cabinet_id_str {
            count_builder = count_builder.bind(("cabinet_id", cabinet_id.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM visit {filter} \
             ORDER BY scheduled_at ASC \
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
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<VisitRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_visit())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_by_patient(&self, cabinet_id: Uuid, patient_id: Uuid) -> CliniqResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM visit \
                 WHERE cabinet_id = $cabinet_id AND patient_id = $patient_id \
                 GROUP ALL",
            )
            .bind(("cabinet_id", cabinet_id.to_string()))
            .bind(("patient_id", patient_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
