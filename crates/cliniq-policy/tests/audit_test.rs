//! Integration tests for the deferred audit trail.

use cliniq_core::context::{ActorContext, Role, TenantScope};
use cliniq_core::models::audit::AuditAction;
use cliniq_core::models::cabinet::CreateCabinet;
use cliniq_core::models::invoice::{CreateInvoice, InvoiceStatus, UpdateInvoice};
use cliniq_core::models::patient::{CreatePatient, UpdatePatient};
use cliniq_core::models::payment::{CreatePayment, PaymentMethod};
use cliniq_core::repository::{AuditLogFilter, AuditLogRepository, ClinicStore, Pagination};
use cliniq_db::{SurrealAuditLogRepository, SurrealStore};
use cliniq_policy::audit::{self, AuditOutbox};
use cliniq_policy::config::PolicyConfig;
use cliniq_policy::services::Services;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Store = SurrealStore<Db>;
type Outbox = AuditOutbox<SurrealAuditLogRepository<Db>>;

/// Spin up in-memory DB, run migrations, wire services, create one
/// cabinet. The store is returned for direct audit reads.
async fn setup() -> (
    Services<Store>,
    Outbox,
    Store,
    Uuid, // cabinet_id
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    cliniq_db::run_migrations(&db).await.unwrap();

    let store = SurrealStore::new(db);
    let (recorder, outbox) = audit::channel(store.audit().clone());
    let services = Services::new(store.clone(), recorder, &PolicyConfig::default());

    let root = ActorContext::new(Uuid::new_v4(), Role::SuperAdmin, None);
    let cabinet = services
        .cabinets
        .create(
            &root,
            CreateCabinet {
                name: "Smile Dental".into(),
                address: None,
                phone: None,
            },
        )
        .await
        .unwrap();

    (services, outbox, store, cabinet.id)
}

fn admin(cabinet_id: Uuid) -> ActorContext {
    ActorContext::new(Uuid::new_v4(), Role::CabinetAdmin, Some(cabinet_id))
}

fn patient_input(first_name: &str) -> CreatePatient {
    CreatePatient {
        cabinet: None,
        first_name: first_name.into(),
        last_name: "Moreau".into(),
        date_of_birth: None,
        phone: None,
        email: None,
    }
}

#[tokio::test]
async fn writes_append_entries_with_actor_and_state() {
    let (services, mut outbox, _store, cabinet_id) = setup().await;
    let actor = admin(cabinet_id).with_ip("203.0.113.9");

    let patient = services
        .patients
        .create(&actor, patient_input("Ada"))
        .await
        .unwrap();

    let processed = outbox.process_available().await;
    assert!(processed >= 1, "expected queued entries, got {processed}");

    let entries = services
        .audit
        .list(
            &actor,
            AuditLogFilter {
                entity_type: Some("patient".into()),
                action: Some(AuditAction::Create),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(entries.total, 1);

    let entry = &entries.items[0];
    assert_eq!(entry.actor_id, Some(actor.actor_id));
    assert_eq!(entry.cabinet_id, Some(cabinet_id));
    assert_eq!(entry.entity_id, patient.id.to_string());
    assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.9"));
    assert!(entry.old_state.is_none());

    let new_state = entry.new_state.as_ref().unwrap();
    assert_eq!(
        new_state.get("first_name").and_then(|v| v.as_str()),
        Some("Ada")
    );
}

#[tokio::test]
async fn chart_access_is_recorded() {
    let (services, mut outbox, _store, cabinet_id) = setup().await;
    let actor = admin(cabinet_id);

    let patient = services
        .patients
        .create(&actor, patient_input("Ada"))
        .await
        .unwrap();
    services.patients.get(&actor, patient.id).await.unwrap();

    outbox.process_available().await;
    let views = services
        .audit
        .list(
            &actor,
            AuditLogFilter {
                action: Some(AuditAction::View),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(views.total, 1);
    assert_eq!(views.items[0].entity_id, patient.id.to_string());
}

#[tokio::test]
async fn updates_capture_before_and_after() {
    let (services, mut outbox, _store, cabinet_id) = setup().await;
    let actor = admin(cabinet_id);

    let patient = services
        .patients
        .create(&actor, patient_input("Ada"))
        .await
        .unwrap();
    services
        .patients
        .update(
            &actor,
            patient.id,
            UpdatePatient {
                phone: Some("555-0101".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    outbox.process_available().await;
    let updates = services
        .audit
        .list(
            &actor,
            AuditLogFilter {
                entity_type: Some("patient".into()),
                action: Some(AuditAction::Update),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(updates.total, 1);

    let entry = &updates.items[0];
    let old_state = entry.old_state.as_ref().unwrap();
    let new_state = entry.new_state.as_ref().unwrap();
    assert!(old_state.get("phone").map(|v| v.is_null()).unwrap_or(true));
    assert_eq!(
        new_state.get("phone").and_then(|v| v.as_str()),
        Some("555-0101")
    );
}

#[tokio::test]
async fn payment_writes_audit_the_invoice_side_effect() {
    let (services, mut outbox, _store, cabinet_id) = setup().await;
    let actor = admin(cabinet_id);

    let patient = services
        .patients
        .create(&actor, patient_input("Ada"))
        .await
        .unwrap();
    let invoice = services
        .invoices
        .create(
            &actor,
            CreateInvoice {
                cabinet: None,
                patient_id: patient.id,
                treatment_plan_id: None,
                total: 1000.0,
            },
        )
        .await
        .unwrap();
    services
        .invoices
        .update(
            &actor,
            invoice.id,
            UpdateInvoice {
                status: Some(InvoiceStatus::Issued),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    services
        .payments
        .create(
            &actor,
            CreatePayment {
                cabinet: None,
                invoice_id: invoice.id,
                patient_id: None,
                amount: 400.0,
                method: PaymentMethod::Card,
                received_at: None,
            },
        )
        .await
        .unwrap();

    outbox.process_available().await;

    let payment_entries = services
        .audit
        .list(
            &actor,
            AuditLogFilter {
                entity_type: Some("payment".into()),
                action: Some(AuditAction::Create),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(payment_entries.total, 1);

    // Two invoice updates: the manual issue and the derived
    // PartiallyPaid from reconciliation.
    let invoice_entries = services
        .audit
        .list(
            &actor,
            AuditLogFilter {
                entity_type: Some("invoice".into()),
                action: Some(AuditAction::Update),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(invoice_entries.total, 2);
    assert!(invoice_entries.items.iter().any(|e| {
        e.new_state
            .as_ref()
            .and_then(|s| s.get("status"))
            .and_then(|v| v.as_str())
            == Some("PartiallyPaid")
    }));
}

#[tokio::test]
async fn the_audit_trail_is_cabinet_scoped() {
    let (services, mut outbox, _store, cabinet_a) = setup().await;
    let root = ActorContext::new(Uuid::new_v4(), Role::SuperAdmin, None);
    let cabinet_b = services
        .cabinets
        .create(
            &root,
            CreateCabinet {
                name: "Bright Dental".into(),
                address: None,
                phone: None,
            },
        )
        .await
        .unwrap();

    let admin_a = admin(cabinet_a);
    let admin_b = admin(cabinet_b.id);
    services
        .patients
        .create(&admin_a, patient_input("Ada"))
        .await
        .unwrap();
    services
        .patients
        .create(&admin_b, patient_input("Mila"))
        .await
        .unwrap();

    outbox.process_available().await;

    // Each admin sees only their own cabinet's trail.
    let filter = AuditLogFilter {
        entity_type: Some("patient".into()),
        action: Some(AuditAction::Create),
        ..Default::default()
    };
    let in_a = services
        .audit
        .list(&admin_a, filter.clone(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(in_a.total, 1);
    assert_eq!(in_a.items[0].cabinet_id, Some(cabinet_a));

    // Clinicians have no audit access at all.
    let clinician = ActorContext::new(Uuid::new_v4(), Role::Clinician, Some(cabinet_a));
    assert!(
        services
            .audit
            .list(&clinician, filter, Pagination::default())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn the_drain_task_flushes_before_exit() {
    let (services, outbox, store, cabinet_id) = setup().await;
    let handle = tokio::spawn(outbox.run());

    let actor = admin(cabinet_id);
    let patient = services
        .patients
        .create(&actor, patient_input("Ada"))
        .await
        .unwrap();

    // Dropping the services drops every recorder handle; the drain task
    // finishes whatever is queued and exits.
    drop(services);
    handle.await.unwrap();

    let entries = store
        .audit()
        .list(
            TenantScope::All,
            AuditLogFilter {
                entity_type: Some("patient".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(entries.total, 1);
    assert_eq!(entries.items[0].entity_id, patient.id.to_string());
}

#[tokio::test]
async fn a_closed_outbox_never_blocks_writes() {
    let (services, outbox, _store, cabinet_id) = setup().await;

    // Simulates the recorder outliving the drain side.
    drop(outbox);

    let patient = services
        .patients
        .create(&admin(cabinet_id), patient_input("Ada"))
        .await;
    assert!(patient.is_ok());
}
