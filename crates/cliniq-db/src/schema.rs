//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The `audit_log` table forbids
//! update and delete at the schema level so entries stay immutable.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Cabinets (global scope)
-- =======================================================================
DEFINE TABLE cabinet SCHEMAFULL;
DEFINE FIELD name ON TABLE cabinet TYPE string;
DEFINE FIELD address ON TABLE cabinet TYPE option<string>;
DEFINE FIELD phone ON TABLE cabinet TYPE option<string>;
DEFINE FIELD created_at ON TABLE cabinet TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE cabinet TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Patients (cabinet scope)
-- =======================================================================
DEFINE TABLE patient SCHEMAFULL;
DEFINE FIELD cabinet_id ON TABLE patient TYPE string;
DEFINE FIELD first_name ON TABLE patient TYPE string;
DEFINE FIELD last_name ON TABLE patient TYPE string;
DEFINE FIELD date_of_birth ON TABLE patient TYPE option<string>;
DEFINE FIELD phone ON TABLE patient TYPE option<string>;
DEFINE FIELD email ON TABLE patient TYPE option<string>;
DEFINE FIELD status ON TABLE patient TYPE string \
    ASSERT $value IN ['Active', 'Archived'];
DEFINE FIELD created_by ON TABLE patient TYPE option<string>;
DEFINE FIELD created_at ON TABLE patient TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE patient TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_patient_cabinet ON TABLE patient COLUMNS cabinet_id;

-- =======================================================================
-- Treatment Plans (cabinet scope, embedded line items)
-- =======================================================================
DEFINE TABLE treatment_plan SCHEMAFULL;
DEFINE FIELD cabinet_id ON TABLE treatment_plan TYPE string;
DEFINE FIELD patient_id ON TABLE treatment_plan TYPE string;
DEFINE FIELD title ON TABLE treatment_plan TYPE string;
DEFINE FIELD treatments ON TABLE treatment_plan TYPE array;
DEFINE FIELD treatments.* ON TABLE treatment_plan TYPE object;
DEFINE FIELD treatments.*.procedure ON TABLE treatment_plan TYPE string;
DEFINE FIELD treatments.*.tooth ON TABLE treatment_plan \
    TYPE option<string>;
DEFINE FIELD treatments.*.price ON TABLE treatment_plan TYPE float \
    ASSERT $value >= 0;
DEFINE FIELD treatments.*.status ON TABLE treatment_plan TYPE string \
    ASSERT $value IN ['Planned', 'Completed', 'Cancelled'];
DEFINE FIELD total_price ON TABLE treatment_plan TYPE float \
    ASSERT $value >= 0;
DEFINE FIELD created_by ON TABLE treatment_plan TYPE option<string>;
DEFINE FIELD created_at ON TABLE treatment_plan TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE treatment_plan TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_plan_cabinet_patient ON TABLE treatment_plan \
    COLUMNS cabinet_id, patient_id;

-- =======================================================================
-- Visits (cabinet scope)
-- =======================================================================
DEFINE TABLE visit SCHEMAFULL;
DEFINE FIELD cabinet_id ON TABLE visit TYPE string;
DEFINE FIELD patient_id ON TABLE visit TYPE string;
DEFINE FIELD scheduled_at ON TABLE visit TYPE datetime;
DEFINE FIELD reason ON TABLE visit TYPE option<string>;
DEFINE FIELD status ON TABLE visit TYPE string \
    ASSERT $value IN ['Scheduled', 'Confirmed', 'Completed', \
    'Cancelled'];
DEFINE FIELD created_by ON TABLE visit TYPE option<string>;
DEFINE FIELD created_at ON TABLE visit TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE visit TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_visit_cabinet_patient ON TABLE visit \
    COLUMNS cabinet_id, patient_id;
DEFINE INDEX idx_visit_cabinet_time ON TABLE visit \
    COLUMNS cabinet_id, scheduled_at;

-- =======================================================================
-- Invoices (cabinet scope, per-cabinet number uniqueness)
-- =======================================================================
DEFINE TABLE invoice SCHEMAFULL;
DEFINE FIELD cabinet_id ON TABLE invoice TYPE string;
DEFINE FIELD patient_id ON TABLE invoice TYPE string;
DEFINE FIELD treatment_plan_id ON TABLE invoice TYPE option<string>;
DEFINE FIELD number ON TABLE invoice TYPE string;
DEFINE FIELD total ON TABLE invoice TYPE float ASSERT $value >= 0;
DEFINE FIELD status ON TABLE invoice TYPE string \
    ASSERT $value IN ['Draft', 'Issued', 'PartiallyPaid', 'Paid', \
    'Cancelled'];
DEFINE FIELD issued_at ON TABLE invoice TYPE option<datetime>;
DEFINE FIELD created_by ON TABLE invoice TYPE option<string>;
DEFINE FIELD created_at ON TABLE invoice TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE invoice TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_invoice_cabinet_number ON TABLE invoice \
    COLUMNS cabinet_id, number UNIQUE;
DEFINE INDEX idx_invoice_cabinet_patient ON TABLE invoice \
    COLUMNS cabinet_id, patient_id;

-- =======================================================================
-- Payments (cabinet scope)
-- =======================================================================
DEFINE TABLE payment SCHEMAFULL;
DEFINE FIELD cabinet_id ON TABLE payment TYPE string;
DEFINE FIELD invoice_id ON TABLE payment TYPE string;
DEFINE FIELD patient_id ON TABLE payment TYPE option<string>;
DEFINE FIELD amount ON TABLE payment TYPE float ASSERT $value > 0;
DEFINE FIELD method ON TABLE payment TYPE string \
    ASSERT $value IN ['Cash', 'Card', 'Transfer', 'Insurance'];
DEFINE FIELD received_at ON TABLE payment TYPE datetime;
DEFINE FIELD created_by ON TABLE payment TYPE option<string>;
DEFINE FIELD created_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_payment_cabinet_invoice ON TABLE payment \
    COLUMNS cabinet_id, invoice_id;
DEFINE INDEX idx_payment_cabinet_patient ON TABLE payment \
    COLUMNS cabinet_id, patient_id;

-- =======================================================================
-- Audit Log (cabinet scope, append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD cabinet_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD actor_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['Create', 'Update', 'Delete', 'View'];
DEFINE FIELD entity_type ON TABLE audit_log TYPE string;
DEFINE FIELD entity_id ON TABLE audit_log TYPE string;
DEFINE FIELD old_state ON TABLE audit_log \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD new_state ON TABLE audit_log \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD ip_address ON TABLE audit_log TYPE option<string>;
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_cabinet_time ON TABLE audit_log \
    COLUMNS cabinet_id, timestamp;
DEFINE INDEX idx_audit_cabinet_actor ON TABLE audit_log \
    COLUMNS cabinet_id, actor_id;
DEFINE INDEX idx_audit_entity ON TABLE audit_log \
    COLUMNS entity_type, entity_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
