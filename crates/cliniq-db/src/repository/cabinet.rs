//! SurrealDB implementation of [`CabinetRepository`].

use chrono::{DateTime, Utc};
use cliniq_core::error::CliniqResult;
use cliniq_core::models::cabinet::{Cabinet, CreateCabinet, UpdateCabinet};
use cliniq_core::repository::{CabinetRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CabinetRow {
    name: String,
    address: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CabinetRowWithId {
    record_id: String,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CabinetRow {
    fn into_cabinet(self, id: Uuid) -> Cabinet {
        Cabinet {
            id,
            name: self.name,
            address: self.address,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl CabinetRowWithId {
    fn try_into_cabinet(self) -> Result<Cabinet, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Cabinet {
            id,
            name: self.name,
            address: self.address,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Cabinet repository.
#[derive(Clone)]
pub struct SurrealCabinetRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCabinetRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CabinetRepository for SurrealCabinetRepository<C> {
    async fn create(&self, input: CreateCabinet) -> CliniqResult<Cabinet> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('cabinet', $id) SET \
                 name = $name, address = $address, phone = $phone",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("address", input.address))
            .bind(("phone", input.phone))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<CabinetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cabinet".into(),
            id: id_str,
        })?;

        Ok(row.into_cabinet(id))
    }

    async fn get_by_id(&self, id: Uuid) -> CliniqResult<Cabinet> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('cabinet', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CabinetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cabinet".into(),
            id: id_str,
        })?;

        Ok(row.into_cabinet(id))
    }

    async fn update(&self, id: Uuid, input: UpdateCabinet) -> CliniqResult<Cabinet> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('cabinet', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<CabinetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "cabinet".into(),
            id: id_str,
        })?;

        Ok(row.into_cabinet(id))
    }

    async fn list(&self, pagination: Pagination) -> CliniqResult<PaginatedResult<Cabinet>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM cabinet GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM cabinet \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CabinetRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_cabinet())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
