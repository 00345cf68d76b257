//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    cliniq_db::run_migrations(&db).await.unwrap();

    // Verify that key tables exist by querying INFO FOR DB.
    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("cabinet"), "missing cabinet table");
    assert!(info_str.contains("patient"), "missing patient table");
    assert!(
        info_str.contains("treatment_plan"),
        "missing treatment_plan table"
    );
    assert!(info_str.contains("visit"), "missing visit table");
    assert!(info_str.contains("invoice"), "missing invoice table");
    assert!(info_str.contains("payment"), "missing payment table");
    assert!(info_str.contains("audit_log"), "missing audit_log table");

    // Verify migration was recorded.
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    // Run twice — should not fail.
    cliniq_db::run_migrations(&db).await.unwrap();
    cliniq_db::run_migrations(&db).await.unwrap();

    // Verify only one migration record exists.
    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn can_create_record_after_migration() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    cliniq_db::run_migrations(&db).await.unwrap();

    // Create a cabinet record to verify the schema works.
    db.query(
        "CREATE cabinet SET \
         name = 'Downtown Dental', \
         address = NONE, \
         phone = NONE",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let mut result = db
        .query("SELECT * FROM cabinet WHERE name = 'Downtown Dental'")
        .await
        .unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn unique_index_prevents_duplicate_invoice_numbers() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    cliniq_db::run_migrations(&db).await.unwrap();

    // Create first invoice.
    db.query(
        "CREATE invoice SET \
         cabinet_id = 'cab-1', patient_id = 'pat-1', \
         treatment_plan_id = NONE, \
         number = 'F-0001', total = 100.0, status = 'Draft', \
         issued_at = NONE, created_by = NONE",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    // Same number in the same cabinet — should fail.
    let result = db
        .query(
            "CREATE invoice SET \
             cabinet_id = 'cab-1', patient_id = 'pat-2', \
             treatment_plan_id = NONE, \
             number = 'F-0001', total = 50.0, status = 'Draft', \
             issued_at = NONE, created_by = NONE",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "duplicate number should be rejected");

    // Same number in a different cabinet — allowed.
    db.query(
        "CREATE invoice SET \
         cabinet_id = 'cab-2', patient_id = 'pat-3', \
         treatment_plan_id = NONE, \
         number = 'F-0001', total = 75.0, status = 'Draft', \
         issued_at = NONE, created_by = NONE",
    )
    .await
    .unwrap()
    .check()
    .unwrap();
}

#[tokio::test]
async fn status_assertions_reject_unknown_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    cliniq_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE patient SET \
             cabinet_id = 'cab-1', \
             first_name = 'Ann', last_name = 'Bell', \
             date_of_birth = NONE, phone = NONE, email = NONE, \
             status = 'Hibernating', created_by = NONE",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "unknown status should be rejected");
}
