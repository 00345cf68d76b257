//! Integration tests for the append-only audit log repository using
//! in-memory SurrealDB.

use cliniq_core::context::TenantScope;
use cliniq_core::models::audit::{AuditAction, CreateAuditLogEntry};
use cliniq_core::repository::{AuditLogFilter, AuditLogRepository, Pagination};
use cliniq_db::SurrealAuditLogRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    cliniq_db::run_migrations(&db).await.unwrap();
    db
}

fn entry(
    cabinet_id: Uuid,
    actor_id: Uuid,
    action: AuditAction,
    entity_type: &str,
    entity_id: &str,
) -> CreateAuditLogEntry {
    CreateAuditLogEntry {
        cabinet_id: Some(cabinet_id),
        actor_id: Some(actor_id),
        action,
        entity_type: entity_type.into(),
        entity_id: entity_id.into(),
        old_state: None,
        new_state: None,
        ip_address: None,
    }
}

#[tokio::test]
async fn append_and_read_back_entry() {
    let db = setup().await;
    let repo = SurrealAuditLogRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();

    let mut input = entry(cabinet_id, actor_id, AuditAction::Update, "patient", "p-1");
    input.old_state = Some(serde_json::json!({"status": "Active"}));
    input.new_state = Some(serde_json::json!({"status": "Archived"}));
    input.ip_address = Some("10.0.0.9".into());

    let appended = repo.append(input).await.unwrap();
    assert_eq!(appended.cabinet_id, Some(cabinet_id));
    assert_eq!(appended.actor_id, Some(actor_id));
    assert_eq!(appended.action, AuditAction::Update);
    assert_eq!(appended.entity_type, "patient");
    assert_eq!(
        appended.old_state,
        Some(serde_json::json!({"status": "Active"}))
    );
    assert_eq!(appended.ip_address.as_deref(), Some("10.0.0.9"));

    let listed = repo
        .list(
            TenantScope::Cabinet(cabinet_id),
            AuditLogFilter::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, appended.id);
}

#[tokio::test]
async fn list_is_scoped_and_filtered() {
    let db = setup().await;
    let repo = SurrealAuditLogRepository::new(db);

    let cab_a = Uuid::new_v4();
    let cab_b = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let other_actor = Uuid::new_v4();

    repo.append(entry(cab_a, actor, AuditAction::Create, "patient", "p-1"))
        .await
        .unwrap();
    repo.append(entry(cab_a, actor, AuditAction::Delete, "invoice", "i-1"))
        .await
        .unwrap();
    repo.append(entry(cab_a, other_actor, AuditAction::Create, "visit", "v-1"))
        .await
        .unwrap();
    repo.append(entry(cab_b, actor, AuditAction::Create, "patient", "p-2"))
        .await
        .unwrap();

    // Cabinet scope hides the other cabinet's entries.
    let scoped = repo
        .list(
            TenantScope::Cabinet(cab_a),
            AuditLogFilter::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(scoped.total, 3);

    // Actor filter.
    let by_actor = repo
        .list(
            TenantScope::Cabinet(cab_a),
            AuditLogFilter {
                actor_id: Some(actor),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_actor.total, 2);

    // Action + entity type filters.
    let deletes = repo
        .list(
            TenantScope::Cabinet(cab_a),
            AuditLogFilter {
                action: Some(AuditAction::Delete),
                entity_type: Some("invoice".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(deletes.total, 1);
    assert_eq!(deletes.items[0].entity_id, "i-1");

    // Unscoped listing sees everything.
    let all = repo
        .list(
            TenantScope::All,
            AuditLogFilter::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(all.total, 4);
}
