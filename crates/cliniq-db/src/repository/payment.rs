//! SurrealDB implementation of [`PaymentRepository`].

use chrono::{DateTime, Utc};
use cliniq_core::context::TenantScope;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::payment::{CreatePayment, Payment, PaymentMethod, UpdatePayment};
use cliniq_core::repository::{PaginatedResult, Pagination, PaymentRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PaymentRow {
    cabinet_id: String,
    invoice_id: String,
    patient_id: Option<String>,
    amount: f64,
    method: String,
    received_at: DateTime<Utc>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PaymentRowWithId {
    record_id: String,
    cabinet_id: String,
    invoice_id: String,
    patient_id: Option<String>,
    amount: f64,
    method: String,
    received_at: DateTime<Utc>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_method(s: &str) -> Result<PaymentMethod, DbError> {
    match s {
        "Cash" => Ok(PaymentMethod::Cash),
        "Card" => Ok(PaymentMethod::Card),
        "Transfer" => Ok(PaymentMethod::Transfer),
        "Insurance" => Ok(PaymentMethod::Insurance),
        other => Err(DbError::Migration(format!(
            "unknown payment method: {other}"
        ))),
    }
}

impl PaymentRow {
    fn into_payment(self, id: Uuid) -> Result<Payment, DbError> {
        let cabinet_id = Uuid::parse_str(&self.cabinet_id)
            .map_err(|e| DbError::Migration(format!("invalid cabinet UUID: {e}")))?;
        let invoice_id = Uuid::parse_str(&self.invoice_id)
            .map_err(|e| DbError::Migration(format!("invalid invoice UUID: {e}")))?;
        let patient_id = match self.patient_id {
            Some(s) => Some(
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid patient UUID: {e}")))?,
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
        Ok(Payment {
            id,
            cabinet_id,
            invoice_id,
            patient_id,
            amount: self.amount,
            method: parse_method(&self.method)?,
            received_at: self.received_at,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PaymentRowWithId {
    fn try_into_payment(self) -> Result<Payment, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = PaymentRow {
            cabinet_id: self.cabinet_id,
            invoice_id: self.invoice_id,
            patient_id: self.patient_id,
            amount: self.amount,
            method: self.method,
            received_at: self.received_at,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_payment(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Payment repository.
#[derive(Clone)]
pub struct SurrealPaymentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPaymentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PaymentRepository for SurrealPaymentRepository<C> {
    async fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreatePayment,
        received_at: DateTime<Utc>,
    ) -> CliniqResult<Payment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();
        let invoice_id_str = input.invoice_id.to_string();
        let patient_id_str = input.patient_id.map(|u| u.to_string());
        let created_by_str = created_by.map(|u| u.to_string());

        let result = self
            .db
            .query(
                "CREATE type::record('payment', $id) SET \
                 cabinet_id = $cabinet_id, \
                 invoice_id = $invoice_id, \
                 patient_id = $patient_id, \
                 amount = $amount, \
                 method = $method, \
                 received_at = $received_at, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str))
            .bind(("invoice_id", invoice_id_str))
            .bind(("patient_id", patient_id_str))
            .bind(("amount", input.amount))
            .bind(("method", input.method.as_str().to_string()))
            .bind(("received_at", received_at))
            .bind(("created_by", created_by_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "payment".into(),
            id: id_str,
        })?;

        Ok(row.into_payment(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<Payment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('payment', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "payment".into(),
            id: id_str,
        })?;

        Ok(row.into_payment(id)?)
    }

    async fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdatePayment,
    ) -> CliniqResult<Payment> {
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();

        let mut sets = Vec::new();
        if input.amount.is_some() {
            sets.push("amount = $amount");
        }
        if input.method.is_some() {
            sets.push("method = $method");
        }
        if input.received_at.is_some() {
            sets.push("received_at = $received_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('payment', $id) SET {} \
             WHERE cabinet_id = $cabinet_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str));

        if let Some(amount) = input.amount {
            builder = builder.bind(("amount", amount));
        }
        if let Some(ref method) = input.method {
            builder = builder.bind(("method", method.as_str().to_string()));
        }
        if let Some(received_at) = input.received_at {
            builder = builder.bind(("received_at", received_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "payment".into(),
            id: id_str,
        })?;

        Ok(row.into_payment(id)?)
    }

    async fn delete(&self, cabinet_id: Uuid, id: Uuid) -> CliniqResult<()> {
        self.db
            .query("DELETE type::record('payment', $id) WHERE cabinet_id = $cabinet_id")
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
    ) -> CliniqResult<PaginatedResult<Payment>> {
        let filter = match scope {
            TenantScope::All => "",
            TenantScope::Cabinet(_) => "WHERE cabinet_id = $cabinet_id",
        };
        let cabinet_id_str = match scope {
            TenantScope::All => None,
            TenantScope::Cabinet(id) => Some(id.to_string()),
        };

        let count_query = format!("SELECT count() AS total FROM payment {filter} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(ref cabinet_id) = cabinet_id_str {
            count_builder = count_builder.bind(("cabinet_id", cabinet_id.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM payment {filter} \
             ORDER BY received_at ASC \
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

        let rows: Vec<PaymentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_payment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_invoice(&self, cabinet_id: Uuid, invoice_id: Uuid) -> CliniqResult<Vec<Payment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM payment \
                 WHERE cabinet_id = $cabinet_id AND invoice_id = $invoice_id \
                 ORDER BY received_at ASC",
            )
            .bind(("cabinet_id", cabinet_id.to_string()))
            .bind(("invoice_id", invoice_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRowWithId> = result.take(0).map_err(DbError::from)?;

        let payments = rows
            .into_iter()
            .map(|row| row.try_into_payment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(payments)
    }

    async fn count_by_invoice(&self, cabinet_id: Uuid, invoice_id: Uuid) -> CliniqResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM payment \
                 WHERE cabinet_id = $cabinet_id AND invoice_id = $invoice_id \
                 GROUP ALL",
            )
            .bind(("cabinet_id", cabinet_id.to_string()))
            .bind(("invoice_id", invoice_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_by_patient(&self, cabinet_id: Uuid, patient_id: Uuid) -> CliniqResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM payment \
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
