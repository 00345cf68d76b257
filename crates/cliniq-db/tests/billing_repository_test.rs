//! Integration tests for TreatmentPlan, Invoice, and Payment
//! repository implementations using in-memory SurrealDB.

use chrono::Utc;
use cliniq_core::context::TenantScope;
use cliniq_core::models::invoice::{CreateInvoice, InvoiceStatus, UpdateInvoice};
use cliniq_core::models::payment::{CreatePayment, PaymentMethod};
use cliniq_core::models::treatment_plan::{
    CreateTreatmentPlan, Treatment, TreatmentStatus, UpdateTreatmentPlan,
};
use cliniq_core::repository::{
    InvoiceRepository, Pagination, PaymentRepository, TreatmentPlanRepository,
};
use cliniq_db::{
    SurrealInvoiceRepository, SurrealPaymentRepository, SurrealTreatmentPlanRepository,
};
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

fn filling(price: f64) -> Treatment {
    Treatment {
        procedure: "Composite filling".into(),
        tooth: Some("16".into()),
        price,
        status: TreatmentStatus::Planned,
    }
}

fn new_invoice(patient_id: Uuid, total: f64) -> CreateInvoice {
    CreateInvoice {
        cabinet: None,
        patient_id,
        treatment_plan_id: None,
        total,
    }
}

// -----------------------------------------------------------------------
// Treatment plan tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_plan_with_embedded_treatments() {
    let db = setup().await;
    let repo = SurrealTreatmentPlanRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    let plan = repo
        .create(
            cabinet_id,
            None,
            CreateTreatmentPlan {
                cabinet: None,
                patient_id,
                title: "Restoration".into(),
                treatments: vec![filling(120.0), filling(80.0)],
            },
            200.0,
        )
        .await
        .unwrap();

    assert_eq!(plan.cabinet_id, cabinet_id);
    assert_eq!(plan.patient_id, patient_id);
    assert_eq!(plan.treatments.len(), 2);
    assert_eq!(plan.total_price, 200.0);
    assert_eq!(plan.treatments[0].status, TreatmentStatus::Planned);

    let fetched = repo.get_by_id(plan.id).await.unwrap();
    assert_eq!(fetched.treatments.len(), 2);
    assert_eq!(fetched.treatments[1].price, 80.0);
}

#[tokio::test]
async fn update_plan_replaces_line_items() {
    let db = setup().await;
    let repo = SurrealTreatmentPlanRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let plan = repo
        .create(
            cabinet_id,
            None,
            CreateTreatmentPlan {
                cabinet: None,
                patient_id: Uuid::new_v4(),
                title: "Initial".into(),
                treatments: vec![filling(120.0)],
            },
            120.0,
        )
        .await
        .unwrap();

    let updated = repo
        .update(
            cabinet_id,
            plan.id,
            UpdateTreatmentPlan {
                treatments: Some(vec![filling(90.0), filling(60.0), filling(30.0)]),
                ..Default::default()
            },
            Some(180.0),
        )
        .await
        .unwrap();

    assert_eq!(updated.treatments.len(), 3);
    assert_eq!(updated.total_price, 180.0);
    assert_eq!(updated.title, "Initial"); // unchanged
}

#[tokio::test]
async fn count_plans_by_patient() {
    let db = setup().await;
    let repo = SurrealTreatmentPlanRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    for i in 0..2 {
        repo.create(
            cabinet_id,
            None,
            CreateTreatmentPlan {
                cabinet: None,
                patient_id,
                title: format!("Plan {i}"),
                treatments: vec![],
            },
            0.0,
        )
        .await
        .unwrap();
    }

    assert_eq!(repo.count_by_patient(cabinet_id, patient_id).await.unwrap(), 2);
    assert_eq!(
        repo.count_by_patient(cabinet_id, Uuid::new_v4())
            .await
            .unwrap(),
        0
    );
}

// -----------------------------------------------------------------------
// Invoice tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_invoice_starts_as_draft() {
    let db = setup().await;
    let repo = SurrealInvoiceRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let invoice = repo
        .create(
            cabinet_id,
            None,
            new_invoice(Uuid::new_v4(), 250.0),
            "F-0001".into(),
        )
        .await
        .unwrap();

    assert_eq!(invoice.number, "F-0001");
    assert_eq!(invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.total, 250.0);
    assert!(invoice.issued_at.is_none());
}

#[tokio::test]
async fn duplicate_invoice_number_rejected_within_cabinet() {
    let db = setup().await;
    let repo = SurrealInvoiceRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    repo.create(
        cabinet_id,
        None,
        new_invoice(Uuid::new_v4(), 100.0),
        "F-0007".into(),
    )
    .await
    .unwrap();

    let dup = repo
        .create(
            cabinet_id,
            None,
            new_invoice(Uuid::new_v4(), 90.0),
            "F-0007".into(),
        )
        .await;
    assert!(dup.is_err(), "duplicate number should be rejected");

    // Same number in another cabinet is legal.
    repo.create(
        Uuid::new_v4(),
        None,
        new_invoice(Uuid::new_v4(), 90.0),
        "F-0007".into(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn get_by_number_probe() {
    let db = setup().await;
    let repo = SurrealInvoiceRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let created = repo
        .create(
            cabinet_id,
            None,
            new_invoice(Uuid::new_v4(), 10.0),
            "F-0042".into(),
        )
        .await
        .unwrap();

    let found = repo.get_by_number(cabinet_id, "F-0042").await.unwrap();
    assert_eq!(found.map(|i| i.id), Some(created.id));

    let free = repo.get_by_number(cabinet_id, "F-0043").await.unwrap();
    assert!(free.is_none());

    // Numbers are per cabinet: another cabinet sees the number as free.
    let other = repo.get_by_number(Uuid::new_v4(), "F-0042").await.unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn last_created_returns_most_recent() {
    let db = setup().await;
    let repo = SurrealInvoiceRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    assert!(repo.last_created(cabinet_id).await.unwrap().is_none());

    repo.create(
        cabinet_id,
        None,
        new_invoice(Uuid::new_v4(), 10.0),
        "F-0001".into(),
    )
    .await
    .unwrap();
    let second = repo
        .create(
            cabinet_id,
            None,
            new_invoice(Uuid::new_v4(), 20.0),
            "F-0002".into(),
        )
        .await
        .unwrap();

    let last = repo.last_created(cabinet_id).await.unwrap().unwrap();
    assert_eq!(last.id, second.id);
    assert_eq!(last.number, "F-0002");
}

#[tokio::test]
async fn issue_sets_timestamp_once() {
    let db = setup().await;
    let repo = SurrealInvoiceRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let invoice = repo
        .create(
            cabinet_id,
            None,
            new_invoice(Uuid::new_v4(), 300.0),
            "F-0010".into(),
        )
        .await
        .unwrap();

    let issued = repo
        .update(
            cabinet_id,
            invoice.id,
            UpdateInvoice {
                status: Some(InvoiceStatus::Issued),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(issued.status, InvoiceStatus::Issued);
    let first_issue = issued.issued_at.expect("issued_at should be set");

    // Restating the same status must not move the timestamp.
    let restated = repo
        .update(
            cabinet_id,
            invoice.id,
            UpdateInvoice {
                status: Some(InvoiceStatus::Issued),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(restated.issued_at, Some(first_issue));
}

#[tokio::test]
async fn count_invoices_by_treatment_plan() {
    let db = setup().await;
    let repo = SurrealInvoiceRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let plan_id = Uuid::new_v4();

    let mut input = new_invoice(Uuid::new_v4(), 40.0);
    input.treatment_plan_id = Some(plan_id);
    repo.create(cabinet_id, None, input, "F-0050".into())
        .await
        .unwrap();

    assert_eq!(
        repo.count_by_treatment_plan(cabinet_id, plan_id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        repo.count_by_treatment_plan(cabinet_id, Uuid::new_v4())
            .await
            .unwrap(),
        0
    );
}

// -----------------------------------------------------------------------
// Payment tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_list_payments_by_invoice() {
    let db = setup().await;
    let invoice_repo = SurrealInvoiceRepository::new(db.clone());
    let payment_repo = SurrealPaymentRepository::new(db);

    let cabinet_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let invoice = invoice_repo
        .create(
            cabinet_id,
            None,
            new_invoice(patient_id, 500.0),
            "F-0100".into(),
        )
        .await
        .unwrap();

    for amount in [200.0, 300.0] {
        payment_repo
            .create(
                cabinet_id,
                None,
                CreatePayment {
                    cabinet: None,
                    invoice_id: invoice.id,
                    patient_id: Some(patient_id),
                    amount,
                    method: PaymentMethod::Card,
                    received_at: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let payments = payment_repo
        .list_by_invoice(cabinet_id, invoice.id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments.iter().map(|p| p.amount).sum::<f64>(), 500.0);
    assert!(payments.iter().all(|p| p.invoice_id == invoice.id));

    assert_eq!(
        payment_repo
            .count_by_invoice(cabinet_id, invoice.id)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        payment_repo
            .count_by_patient(cabinet_id, patient_id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn payments_listed_per_scope() {
    let db = setup().await;
    let payment_repo = SurrealPaymentRepository::new(db);

    let cab_a = Uuid::new_v4();
    let cab_b = Uuid::new_v4();

    for (cab, amount) in [(cab_a, 10.0), (cab_a, 20.0), (cab_b, 30.0)] {
        payment_repo
            .create(
                cab,
                None,
                CreatePayment {
                    cabinet: None,
                    invoice_id: Uuid::new_v4(),
                    patient_id: None,
                    amount,
                    method: PaymentMethod::Cash,
                    received_at: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let scoped = payment_repo
        .list(TenantScope::Cabinet(cab_a), Pagination::default())
        .await
        .unwrap();
    assert_eq!(scoped.total, 2);
    assert!(scoped.items.iter().all(|p| p.cabinet_id == cab_a));

    let all = payment_repo
        .list(TenantScope::All, Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);
}
