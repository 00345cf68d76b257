//! Payment-to-invoice reconciliation.
//!
//! The paid total of an invoice is always recomputed from its stored
//! payments, never tracked incrementally. The derived status moves
//! forward only: terminal invoices (`Paid`, `Cancelled`) are never
//! auto-reverted, and a zero paid total leaves the status alone.
//! Monetary comparisons tolerate [`AMOUNT_EPSILON`] of float rounding.

use cliniq_core::error::{CliniqError, CliniqResult};
use cliniq_core::models::invoice::{Invoice, InvoiceStatus, UpdateInvoice};
use cliniq_core::models::payment::{AMOUNT_EPSILON, CreatePayment};
use cliniq_core::repository::{ClinicStore, InvoiceRepository, PaymentRepository};
use cliniq_core::statemachine::INVOICE_TRANSITIONS;

pub struct PaymentReconciler;

impl PaymentReconciler {
    /// The invoice status implied by a paid total.
    pub fn derive_status(current: InvoiceStatus, total: f64, total_paid: f64) -> InvoiceStatus {
        if INVOICE_TRANSITIONS.is_terminal(current) {
            return current;
        }
        if total_paid <= 0.0 {
            return current;
        }
        if total_paid + AMOUNT_EPSILON >= total {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::PartiallyPaid
        }
    }

    /// Validate a prospective payment against its invoice.
    ///
    /// Rejects non-positive amounts, payments against invoices that are
    /// not payable (draft, cancelled, already paid), a patient reference
    /// that does not match the invoice's patient, and amounts that would
    /// push the paid total past the invoice total.
    pub fn validate_new_payment(
        invoice: &Invoice,
        input: &CreatePayment,
        total_paid: f64,
    ) -> CliniqResult<()> {
        if input.amount <= 0.0 {
            return Err(CliniqError::Validation {
                message: "payment amount must be positive".into(),
            });
        }

        match invoice.status {
            InvoiceStatus::Draft => {
                return Err(CliniqError::Conflict {
                    message: format!(
                        "invoice {} must be issued before payments can be recorded",
                        invoice.number
                    ),
                });
            }
            InvoiceStatus::Cancelled => {
                return Err(CliniqError::Conflict {
                    message: format!("invoice {} is cancelled", invoice.number),
                });
            }
            InvoiceStatus::Paid => {
                return Err(CliniqError::Conflict {
                    message: format!("invoice {} is already fully paid", invoice.number),
                });
            }
            InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid => {}
        }

        if let Some(patient_id) = input.patient_id {
            if patient_id != invoice.patient_id {
                return Err(CliniqError::Validation {
                    message: "payment patient does not match the invoice patient".into(),
                });
            }
        }

        let remaining = invoice.total - total_paid;
        if input.amount > remaining + AMOUNT_EPSILON {
            return Err(CliniqError::Overpayment {
                amount: input.amount,
                remaining,
            });
        }

        Ok(())
    }

    /// Recompute the paid total for an invoice and persist the derived
    /// status when it changed.
    ///
    /// A derived status the transition table cannot reach is an internal
    /// invariant violation: it is logged with the full detail and
    /// surfaced as an opaque internal error.
    pub async fn reconcile<S: ClinicStore>(store: &S, invoice: &Invoice) -> CliniqResult<Invoice> {
        let payments = store
            .payments()
            .list_by_invoice(invoice.cabinet_id, invoice.id)
            .await?;
        let total_paid: f64 = payments.iter().map(|p| p.amount).sum();

        let derived = Self::derive_status(invoice.status, invoice.total, total_paid);
        if derived == invoice.status {
            return Ok(invoice.clone());
        }

        if !INVOICE_TRANSITIONS.is_valid_transition(invoice.status, derived) {
            tracing::error!(
                invoice_id = %invoice.id,
                from = invoice.status.as_str(),
                to = derived.as_str(),
                total_paid,
                "derived invoice status is not reachable from the stored status"
            );
            return Err(CliniqError::Internal(format!(
                "derived invoice status {} unreachable from {}",
                derived.as_str(),
                invoice.status.as_str()
            )));
        }

        store
            .invoices()
            .update(
                invoice.cabinet_id,
                invoice.id,
                UpdateInvoice {
                    status: Some(derived),
                    ..Default::default()
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn invoice(status: InvoiceStatus, total: f64) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            cabinet_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            treatment_plan_id: None,
            number: "F-0001".into(),
            total,
            status,
            issued_at: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payment_input(invoice: &Invoice, amount: f64) -> CreatePayment {
        CreatePayment {
            cabinet: None,
            invoice_id: invoice.id,
            patient_id: None,
            amount,
            method: cliniq_core::models::payment::PaymentMethod::Card,
            received_at: None,
        }
    }

    #[test]
    fn full_payment_derives_paid() {
        let derived = PaymentReconciler::derive_status(InvoiceStatus::Issued, 1000.0, 1000.0);
        assert_eq!(derived, InvoiceStatus::Paid);
    }

    #[test]
    fn partial_payment_derives_partially_paid() {
        let derived = PaymentReconciler::derive_status(InvoiceStatus::Issued, 1000.0, 400.0);
        assert_eq!(derived, InvoiceStatus::PartiallyPaid);
    }

    #[test]
    fn rounding_shortfall_within_epsilon_counts_as_paid() {
        let derived = PaymentReconciler::derive_status(InvoiceStatus::PartiallyPaid, 100.0, 99.995);
        assert_eq!(derived, InvoiceStatus::Paid);
    }

    #[test]
    fn zero_paid_leaves_the_status_alone() {
        let derived = PaymentReconciler::derive_status(InvoiceStatus::Issued, 1000.0, 0.0);
        assert_eq!(derived, InvoiceStatus::Issued);
    }

    #[test]
    fn terminal_statuses_never_revert() {
        // Even if payments were deleted afterwards.
        let derived = PaymentReconciler::derive_status(InvoiceStatus::Paid, 1000.0, 0.0);
        assert_eq!(derived, InvoiceStatus::Paid);

        let derived = PaymentReconciler::derive_status(InvoiceStatus::Cancelled, 1000.0, 500.0);
        assert_eq!(derived, InvoiceStatus::Cancelled);
    }

    #[test]
    fn draft_invoice_rejects_payments() {
        let inv = invoice(InvoiceStatus::Draft, 500.0);
        let err =
            PaymentReconciler::validate_new_payment(&inv, &payment_input(&inv, 100.0), 0.0)
                .unwrap_err();
        assert!(matches!(err, CliniqError::Conflict { .. }));
    }

    #[test]
    fn cancelled_invoice_rejects_payments() {
        let inv = invoice(InvoiceStatus::Cancelled, 500.0);
        let err =
            PaymentReconciler::validate_new_payment(&inv, &payment_input(&inv, 100.0), 0.0)
                .unwrap_err();
        assert!(matches!(err, CliniqError::Conflict { .. }));
    }

    #[test]
    fn overpayment_reports_the_remaining_balance() {
        let inv = invoice(InvoiceStatus::PartiallyPaid, 1000.0);
        let err =
            PaymentReconciler::validate_new_payment(&inv, &payment_input(&inv, 650.0), 400.0)
                .unwrap_err();
        match err {
            CliniqError::Overpayment { amount, remaining } => {
                assert_eq!(amount, 650.0);
                assert_eq!(remaining, 600.0);
            }
            other => panic!("expected Overpayment, got {other:?}"),
        }
    }

    #[test]
    fn exact_settlement_is_not_an_overpayment() {
        let inv = invoice(InvoiceStatus::PartiallyPaid, 1000.0);
        assert!(
            PaymentReconciler::validate_new_payment(&inv, &payment_input(&inv, 600.0), 400.0)
                .is_ok()
        );
    }

    #[test]
    fn mismatched_patient_is_rejected() {
        let inv = invoice(InvoiceStatus::Issued, 500.0);
        let mut input = payment_input(&inv, 100.0);
        input.patient_id = Some(Uuid::new_v4());
        let err = PaymentReconciler::validate_new_payment(&inv, &input, 0.0).unwrap_err();
        assert!(matches!(err, CliniqError::Validation { .. }));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let inv = invoice(InvoiceStatus::Issued, 500.0);
        assert!(
            PaymentReconciler::validate_new_payment(&inv, &payment_input(&inv, 0.0), 0.0).is_err()
        );
        assert!(
            PaymentReconciler::validate_new_payment(&inv, &payment_input(&inv, -5.0), 0.0)
                .is_err()
        );
    }
}
