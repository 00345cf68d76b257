//! SurrealDB implementation of [`PatientRepository`].
//!
//! Deletes are hard deletes; the service layer refuses them while
//! dependent records exist and offers archiving as the soft path.

use chrono::{DateTime, NaiveDate, Utc};
use cliniq_core::context::TenantScope;
use cliniq_core::error::CliniqResult;
use cliniq_core::models::patient::{CreatePatient, Patient, PatientStatus, UpdatePatient};
use cliniq_core::repository::{PaginatedResult, Pagination, PatientRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PatientRow {
    cabinet_id: String,
    first_name: String,
    last_name: String,
    date_of_birth: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    status: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PatientRowWithId {
    record_id: String,
    cabinet_id: String,
    first_name: String,
    last_name: String,
    date_of_birth: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    status: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<PatientStatus, DbError> {
    match s {
        "Active" => Ok(PatientStatus::Active),
        "Archived" => Ok(PatientStatus::Archived),
        other => Err(DbError::Migration(format!(
            "unknown patient status: {other}"
        ))),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DbError::Migration(format!("invalid date of birth: {e}")))
}

impl PatientRow {
    fn into_patient(self, id: Uuid) -> Result<Patient, DbError> {
        let cabinet_id = Uuid::parse_str(&self.cabinet_id)
            .map_err(|e| DbError::Migration(format!("invalid cabinet UUID: {e}")))?;
        let created_by = match self.created_by {
            Some(s) => Some(
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?,
            ),
            None => None,
        };
        let date_of_birth = match self.date_of_birth {
            Some(s) => Some(parse_date(&s)?),
            None => None,
        };
        Ok(Patient {
            id,
            cabinet_id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth,
            phone: self.phone,
            email: self.email,
            status: parse_status(&self.status)?,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PatientRowWithId {
    fn try_into_patient(self) -> Result<Patient, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = PatientRow {
            cabinet_id: self.cabinet_id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            phone: self.phone,
            email: self.email,
            status: self.status,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_patient(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Patient repository.
#[derive(Clone)]
pub struct SurrealPatientRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPatientRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PatientRepository for SurrealPatientRepository<C> {
    async fn create(
        &self,
        cabinet_id: Uuid,
        created_by: Option<Uuid>,
        input: CreatePatient,
    ) -> CliniqResult<Patient> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();
        let created_by_str = created_by.map(|u| u.to_string());
        let date_of_birth = input.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string());

        let result = self
            .db
            .query(
                "CREATE type::record('patient', $id) SET \
                 cabinet_id = $cabinet_id, \
                 first_name = $first_name, last_name = $last_name, \
                 date_of_birth = $date_of_birth, \
                 phone = $phone, email = $email, \
                 status = 'Active', \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("date_of_birth", date_of_birth))
            .bind(("phone", input.phone))
            .bind(("email", input.email))
            .bind(("created_by", created_by_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PatientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "patient".into(),
            id: id_str,
        })?;

        Ok(row.into_patient(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<Patient> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('patient', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PatientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "patient".into(),
            id: id_str,
        })?;

        Ok(row.into_patient(id)?)
    }

    async fn update(
        &self,
        cabinet_id: Uuid,
        id: Uuid,
        input: UpdatePatient,
    ) -> CliniqResult<Patient> {
        let id_str = id.to_string();
        let cabinet_id_str = cabinet_id.to_string();

        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.date_of_birth.is_some() {
            sets.push("date_of_birth = $date_of_birth");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('patient', $id) SET {} \
             WHERE cabinet_id = $cabinet_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("cabinet_id", cabinet_id_str));

        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(date_of_birth) = input.date_of_birth {
            builder = builder.bind((
                "date_of_birth",
                date_of_birth.format("%Y-%m-%d").to_string(),
            ));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PatientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "patient".into(),
            id: id_str,
        })?;

        Ok(row.into_patient(id)?)
    }

    async fn delete(&self, cabinet_id: Uuid, id: Uuid) -> CliniqResult<()> {
        self.db
            .query("DELETE type::record('patient', $id) WHERE cabinet_id = $cabinet_id")
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
    ) -> CliniqResult<PaginatedResult<Patient>> {
        let filter = match scope {
            TenantScope::All => "",
            TenantScope::Cabinet(_) => "WHERE cabinet_id = $cabinet_id",
        };
        let cabinet_id_str = match scope {
            TenantScope::All => None,
            TenantScope::Cabinet(id) => Some(id.to_string()),
        };

        let count_query = format!("SELECT count() AS total FROM patient {filter} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(ref cabinet_id) = cabinet_id_str {
            count_builder = count_builder.bind(("cabinet_id", cabinet_id.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let page_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM patient {filter} \
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

        let rows: Vec<PatientRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_patient())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
