//! Integration tests for cabinet-local invoice numbering.

use cliniq_core::context::{ActorContext, Role};
use cliniq_core::models::cabinet::CreateCabinet;
use cliniq_core::models::invoice::CreateInvoice;
use cliniq_core::models::patient::CreatePatient;
use cliniq_core::repository::{ClinicStore, InvoiceRepository};
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
/// cabinet with one patient. The store is returned for direct seeding.
async fn setup() -> (
    Services<Store>,
    Outbox,
    Store,
    Uuid, // cabinet_id
    Uuid, // patient_id
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

    let admin = ActorContext::new(Uuid::new_v4(), Role::CabinetAdmin, Some(cabinet.id));
    let patient = services
        .patients
        .create(
            &admin,
            CreatePatient {
                cabinet: None,
                first_name: "Ada".into(),
                last_name: "Moreau".into(),
                date_of_birth: None,
                phone: None,
                email: None,
            },
        )
        .await
        .unwrap();

    (services, outbox, store, cabinet.id, patient.id)
}

fn admin(cabinet_id: Uuid) -> ActorContext {
    ActorContext::new(Uuid::new_v4(), Role::CabinetAdmin, Some(cabinet_id))
}

fn invoice_input(patient_id: Uuid) -> CreateInvoice {
    CreateInvoice {
        cabinet: None,
        patient_id,
        treatment_plan_id: None,
        total: 100.0,
    }
}

/// Insert an invoice with a fixed number, bypassing the generator.
async fn seed_invoice(store: &Store, cabinet_id: Uuid, patient_id: Uuid, number: &str) {
    store
        .invoices()
        .create(cabinet_id, None, invoice_input(patient_id), number.into())
        .await
        .unwrap();
}

fn suffix(number: &str) -> u64 {
    number.rsplit('-').next().unwrap().parse().unwrap()
}

#[tokio::test]
async fn numbers_increment_within_a_cabinet() {
    let (services, _outbox, _store, cabinet_id, patient_id) = setup().await;
    let actor = admin(cabinet_id);

    for expected in ["F-0001", "F-0002", "F-0003"] {
        let invoice = services
            .invoices
            .create(&actor, invoice_input(patient_id))
            .await
            .unwrap();
        assert_eq!(invoice.number, expected);
    }
}

#[tokio::test]
async fn numbering_restarts_per_cabinet() {
    let (services, _outbox, _store, cabinet_a, patient_a) = setup().await;
    let actor_a = admin(cabinet_a);

    services
        .invoices
        .create(&actor_a, invoice_input(patient_a))
        .await
        .unwrap();
    services
        .invoices
        .create(&actor_a, invoice_input(patient_a))
        .await
        .unwrap();

    // A second cabinet with its own patient starts its own sequence.
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
    let actor_b = admin(cabinet_b.id);
    let patient_b = services
        .patients
        .create(
            &actor_b,
            CreatePatient {
                cabinet: None,
                first_name: "Mila".into(),
                last_name: "Costa".into(),
                date_of_birth: None,
                phone: None,
                email: None,
            },
        )
        .await
        .unwrap();

    let first_in_b = services
        .invoices
        .create(&actor_b, invoice_input(patient_b.id))
        .await
        .unwrap();
    assert_eq!(first_in_b.number, "F-0001");
}

#[tokio::test]
async fn taken_numbers_are_probed_and_skipped() {
    let (services, _outbox, store, cabinet_id, patient_id) = setup().await;

    // F-0002 exists, and the most recently created invoice is F-0001,
    // so the naive increment lands on the taken number.
    seed_invoice(&store, cabinet_id, patient_id, "F-0002").await;
    seed_invoice(&store, cabinet_id, patient_id, "F-0001").await;

    let invoice = services
        .invoices
        .create(&admin(cabinet_id), invoice_input(patient_id))
        .await
        .unwrap();
    assert_eq!(invoice.number, "F-0003");
}

#[tokio::test]
async fn exhausted_probes_fall_back_to_a_timestamp() {
    let (services, _outbox, store, cabinet_id, patient_id) = setup().await;
    let actor = admin(cabinet_id);

    // Every candidate within the retry budget is taken.
    seed_invoice(&store, cabinet_id, patient_id, "F-0002").await;
    seed_invoice(&store, cabinet_id, patient_id, "F-0003").await;
    seed_invoice(&store, cabinet_id, patient_id, "F-0004").await;
    seed_invoice(&store, cabinet_id, patient_id, "F-0001").await;

    let fallback = services
        .invoices
        .create(&actor, invoice_input(patient_id))
        .await
        .unwrap();

    // Allocation still succeeded, degrading to a unix-millis suffix.
    assert!(fallback.number.starts_with("F-"));
    let fallback_suffix = suffix(&fallback.number);
    assert!(
        fallback_suffix > 1_000_000_000_000,
        "expected a millisecond timestamp, got {fallback_suffix}"
    );

    // The sequence continues from the fallback; the gap from F-0004 up
    // to the timestamp is accepted and never backfilled.
    let next = services
        .invoices
        .create(&actor, invoice_input(patient_id))
        .await
        .unwrap();
    assert_eq!(suffix(&next.number), fallback_suffix + 1);
}
