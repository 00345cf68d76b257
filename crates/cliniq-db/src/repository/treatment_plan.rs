//! SurrealDB implementation of [`TreatmentPlanRepository`].
//!
//! Line items are embedded in the plan row as an array of objects, so a
//! plan and its treatments always change together. The stored
//! `total_price` is computed by the service layer, never trusted from
//! client input.

use chrono::{DateTime, Utc};
use cliniq_core::context::TenantScope;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::treatment_plan::{
    CreateTreatmentPlan, Treatment, TreatmentPlan, TreatmentStatus, UpdateTreatmentPlan,
};
use cliniq_core::repository::{PaginatedResult, Pagination, TreatmentPlanRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Embedded line-item object as stored in SurrealDB.
#[derive(Debug, SurrealValue)]
struct TreatmentRow {
    procedure: String,
    tooth: Option<String>,
    price: f64,
    status: String,
}

fn parse_treatment_status(s: &str) -> Result<TreatmentStatus, DbError> {
    match s {
        "Planned" => Ok(TreatmentStatus::Planned),
        "Completed" => Ok(TreatmentStatus::Completed),
        "Cancelled" => Ok(TreatmentStatus::Cancelled),
        other => Err(DbError::Migration(format!(
            "unknown treatment status: {other}"
        ))),
    }
}

fn treatment_to_row(t: Treatment) -> TreatmentRow {
    TreatmentRow {
        procedure: t.procedure,
        tooth: t.tooth,
        price: t.price,
        status: t.status.as_str().to_string(),
    }
}

fn row_to_treatment(row: TreatmentRow) -> Result<Treatment, DbError> {
    Ok(Treatment {
        procedure: row.procedure,
        tooth: row.tooth,
        price: row.price,
        status: parse_treatment_status(&row.status)?,
    })
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TreatmentPlanRow {
    cabinet_id: String,
    patient_id: String,
    title: String,
    treatments: Vec<TreatmentRow>,
    total_price: f64,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TreatmentPlanRowWithId {
    record_id: String,
    cabinet_id: String,
    patient_id: String,
    title: String,
    treatments: Vec<TreatmentRow>,
    total_price: f64,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TreatmentPlanRow {
    fn into_plan(self, id: Uuid) -> Result<TreatmentPlan, DbError> {
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
        let treatments = self
            .treatments
            .into_iter()
            .map(row_to_treatment)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(TreatmentPlan {
            id,
            cabinet_id,
            patient_id,
            title: self.title,
            treatments,
            total_price: self.total_price,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TreatmentPlanRowWithId {
    fn try_into_plan(self) -> Result<TreatmentPlan, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = TreatmentPlanRow {
            cabinet_id: self.cabinet_id,
            patient_id: self.patient_id,
            title: self.title,
            treatments: self.treatments,
            total_price: self.total_price,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_plan(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the TreatmentPlan repository.
#[derive(Clone)]
pub struct SurrealTreatmentPlanRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTreatmentPlanRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TreatmentPlanRepository for SurrealTreatmentPlanRepository<C> {
    async fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreateTreatmentPlan,
        total_price: f64,
    ) -> CliniqResult<TreatmentPlan> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();
        let patient_id_str = input.patient_id.to_string();
        let created_by_str = created_by.map(|u| u.to_string());
        let treatments: Vec<TreatmentRow> = input.treatments.into_iter().map(treatment_to_row).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('treatment_plan', $id) SET \
                 cabinet_id = $cabinet_id, \
                 patient_id = $patient_id, \
                 title = $title, \
                 treatments = $treatments, \
                 total_price = $total_price, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str))
            .bind(("patient_id", patient_id_str))
            .bind(("title", input.title))
            .bind(("treatments", treatments))
            .bind(("total_price", total_price))
            .bind(("created_by", created_by_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TreatmentPlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "treatment_plan".into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<TreatmentPlan> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('treatment_plan', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TreatmentPlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "treatment_plan".into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdateTreatmentPlan,
        total_price: Option<f64>,
    ) -> CliniqResult<TreatmentPlan> {
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.treatments.is_some() {
            sets.push("treatments = $treatments");
        }
        if total_price.is_some() {
            sets.push("total_price = $total_price");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('treatment_plan', $id) SET {} \
             WHERE cabinet_id = $cabinet_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(treatments) = input.treatments {
            let rows: Vec<TreatmentRow> = treatments.into_iter().map(treatment_to_row).collect();
            builder = builder.bind(("treatments", rows));
        }
        if let Some(total_price) = total_price {
            builder = builder.bind(("total_price", total_price));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TreatmentPlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "treatment_plan".into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn delete(&self, cabinet_id: Uuid, id: Uuid) -> CliniqResult<()> {
        self.db
            .query("DELETE type::record('treatment_plan', $id) WHERE cabinet_id = $cabinet_id")
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
    ) -> CliniqResult<PaginatedResult<TreatmentPlan>> {
        let filter = match scope {
            TenantScope::All => "",
            TenantScope::Cabinet(_) => "WHERE cabinet_id = $cabinet_id",
        };
        let cabinet_id_str = match scope {
            TenantScope::All => None,
            TenantScope::Cabinet(id) => Some(id.to_string()),
        };

        let count_query = format!("SELECT count() AS total FROM treatment_plan {filter} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(ref cabinet_id) = cabinet_id_str {
            count_builder = count_builder.bind(("cabinet_id", cabinet_id.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM treatment_plan {filter} \
             ORDER BY created_at ASC \
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

        let rows: Vec<TreatmentPlanRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_plan())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_patient(
        &self,
        cabinet_id: Uuid,
        patient_id: Uuid,
        pagination: Pagination,
    ) -> CliniqResult<PaginatedResult<TreatmentPlan>> {
        let cabinet_id_str = cabinet_id.to_string();
        let patient_id_str = patient_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM treatment_plan \
                 WHERE cabinet_id = $cabinet_id AND patient_id = $patient_id \
                 GROUP ALL",
            )
            .bind(("cabinet_id", cabinet_id_str.clone()))
            .bind(("patient_id", patient_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM treatment_plan \
                 WHERE cabinet_id = $cabinet_id AND patient_id = $patient_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("cabinet_id", cabinet_id_str))
            .bind(("patient_id", patient_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TreatmentPlanRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_plan())
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
                "SELECT count() AS total FROM treatment_plan \
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
