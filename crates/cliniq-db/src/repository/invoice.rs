//! SurrealDB implementation of [`InvoiceRepository`].
//!
//! Invoice numbers carry a per-cabinet UNIQUE index
//! (`idx_invoice_cabinet_number`), so a write that loses a number race
//! fails at the storage layer and the generator retries with a fresh
//! candidate. `issued_at` is written at most once: the update coalesces
//! the existing value so restating `Issued` never moves the timestamp.

use chrono::{DateTime, Utc};
use cliniq_core::context::TenantScope;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::invoice::{CreateInvoice, Invoice, InvoiceStatus, UpdateInvoice};
use cliniq_core::repository::{InvoiceRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct InvoiceRow {
    cabinet_id: String,
    patient_id: String,
    treatment_plan_id: Option<String>,
    number: String,
    total: f64,
    status: String,
    issued_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct InvoiceRowWithId {
    record_id: String,
    cabinet_id: String,
    patient_id: String,
    treatment_plan_id: Option<String>,
    number: String,
    total: f64,
    status: String,
    issued_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<InvoiceStatus, DbError> {
    match s {
        "Draft" => Ok(InvoiceStatus::Draft),
        "Issued" => Ok(InvoiceStatus::Issued),
        "PartiallyPaid" => Ok(InvoiceStatus::PartiallyPaid),
        "Paid" => Ok(InvoiceStatus::Paid),
        "Cancelled" => Ok(InvoiceStatus::Cancelled),
        other => Err(DbError::Migration(format!(
            "unknown invoice status: {other}"
        ))),
    }
}

impl InvoiceRow {
    fn into_invoice(self, id: Uuid) -> Result<Invoice, DbError> {
        let cabinet_id = Uuid::parse_str(&self.cabinet_id)
            .map_err(|e| DbError::Migration(format!("invalid cabinet UUID: {e}")))?;
        let patient_id = Uuid::parse_str(&self.patient_id)
            .map_err(|e| DbError::Migration(format!("invalid patient UUID: {e}")))?;
        let treatment_plan_id = match self.treatment_plan_id {
            Some(s) => Some(
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid plan UUID: {e}")))?,
            ),
            None => None,
        };
        let created_by = match self.created_by {
            Some(s) => Some(
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?,
            ),
            None => None,
        };
        Ok(Invoice {
            id,
            cabinet_id,
            patient_id,
            treatment_plan_id,
            number: self.number,
            total: self.total,
            status: parse_status(&self.status)?,
            issued_at: self.issued_at,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl InvoiceRowWithId {
    fn try_into_invoice(self) -> Result<Invoice, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = InvoiceRow {
            cabinet_id: self.cabinet_id,
            patient_id: self.patient_id,
            treatment_plan_id: self.treatment_plan_id,
            number: self.number,
            total: self.total,
            status: self.status,
            issued_at: self.issued_at,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_invoice(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Invoice repository.
#[derive(Clone)]
pub struct SurrealInvoiceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInvoiceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InvoiceRepository for SurrealInvoiceRepository<C> {
    async fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreateInvoice,
        number: String,
    ) -> CliniqResult<Invoice> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();
        let patient_id_str = input.patient_id.to_string();
        let treatment_plan_id_str = input.treatment_plan_id.map(|u| u.to_string());
        let created_by_str = created_by.map(|u| u.to_string());

        let result = self
            .db
            .query(
                "CREATE type::record('invoice', $id) SET \
                 cabinet_id = $cabinet_id, \
                 patient_id = $patient_id, \
                 treatment_plan_id = $treatment_plan_id, \
                 number = $number, \
                 total = $total, \
                 status = 'Draft', \
                 issued_at = NONE, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str))
            .bind(("patient_id", patient_id_str))
            .bind(("treatment_plan_id", treatment_plan_id_str))
            .bind(("number", number))
            .bind(("total", input.total))
            .bind(("created_by", created_by_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<InvoiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invoice".into(),
            id: id_str,
        })?;

        Ok(row.into_invoice(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<Invoice> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('invoice', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvoiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invoice".into(),
            id: id_str,
        })?;

        Ok(row.into_invoice(id)?)
    }

    async fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdateInvoice,
    ) -> CliniqResult<Invoice> {
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();

        let mut sets = Vec::new();
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.status == Some(InvoiceStatus::Issued) {
            // Set-once: keep an existing issue timestamp.
            sets.push("issued_at = issued_at ?? time::now()");
        }
        if input.total.is_some() {
            sets.push("total = $total");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('invoice', $id) SET {} \
             WHERE cabinet_id = $cabinet_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str));

        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(total) = input.total {
            builder = builder.bind(("total", total));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<InvoiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invoice".into(),
            id: id_str,
        })?;

        Ok(row.into_invoice(id)?)
    }

    async fn delete(&self, cabinet_id: Uuid, id: Uuid) -> CliniqResult<()> {
        self.db
            .query("DELETE type::record('invoice', $id) WHERE cabinet_id = $cabinet_id")
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
    ) -> CliniqResult<PaginatedResult<Invoice>> {
        let filter = match scope {
            TenantScope::All => "",
            TenantScope::Cabinet(_) => "WHERE cabinet_id = $cabinet_id",
        };
        let cabinet_id_str = match scope {
            TenantScope::All => None,
            TenantScope::Cabinet(id) => Some(id.to_string()),
        };

        let count_query = format!("SELECT count() AS total FROM invoice {filter} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(ref cabinet_id) = cabinet_id_str {
            count_builder = count_builder.bind(("cabinet_id", cabinet_id.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM invoice {filter} \
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

        let rows: Vec<InvoiceRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_invoice())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_by_number(&self, cabinet_id: Uuid, number: &str) -> CliniqResult<Option<Invoice>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invoice \
                 WHERE cabinet_id = $cabinet_id AND number = $number",
            )
            .bind(("cabinet_id", cabinet_id.to_string()))
            .bind(("number", number.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvoiceRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_invoice()?)),
            None => Ok(None),
        }
    }

    async fn last_created(&self, cabinet_id: Uuid) -> CliniqResult<Option<Invoice>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invoice \
                 WHERE cabinet_id = $cabinet_id \
                 ORDER BY created_at DESC \
                 LIMIT 1",
            )
            .bind(("cabinet_id", cabinet_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvoiceRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_invoice()?)),
            None => Ok(None),
        }
    }

    async fn count_by_patient(&self, cabinet_id: Uuid, patient_id: Uuid) -> CliniqResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM invoice \
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

    async fn count_by_treatment_plan(
        &self,
        cabinet_id: Uuid,
        treatment_plan_id: Uuid,
    ) -> CliniqResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM invoice \
                 WHERE cabinet_id = $cabinet_id \
                 AND treatment_plan_id = $treatment_plan_id \
                 GROUP ALL",
            )
            .bind(("cabinet_id", cabinet_id.to_string()))
            .bind(("treatment_plan_id", treatment_plan_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
