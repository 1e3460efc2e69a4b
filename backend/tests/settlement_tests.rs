//! Order, invoice, payment and ledger workflow tests
//!
//! Follows an order from LOI confirmation to completion:
//! - Exactly one order per LOI, even under concurrent confirmation
//! - One open invoice per order
//! - The ledger sums completed payments and reports the paid flag mismatch
//! - Property: paid-to-date is the sum of non-failed payments

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::{dec, Harness};
use procurement_backend::error::{AppError, AppResult};
use procurement_backend::services::component::RejectInput;
use procurement_backend::services::payment::{FailPaymentInput, ReceiptInput};
use procurement_backend::store::{
    DocumentFilter, DocumentStore, DocumentWrite, MemoryDocumentStore, Repository, StoredDocument,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    ConfirmOrder, EntityKind, InvoiceStatus, LedgerBasis, LoiStatus, NewInvoice, NewPayment,
    OrderStatus, PaidFlagMismatch, PaymentPhase, PaymentStatus, Standing, WorkflowError,
};
use uuid::Uuid;

fn workflow_error(err: AppError) -> WorkflowError {
    match err {
        AppError::Workflow(e) => e,
        other => panic!("expected a workflow error, got {:?}", other),
    }
}

/// Memory store whose invoice reads can be switched off after setup
struct InvoiceReadsFail {
    inner: MemoryDocumentStore,
    failing: AtomicBool,
}

#[async_trait]
impl DocumentStore for InvoiceReadsFail {
    async fn find(&self, kind: EntityKind, id: Uuid) -> AppResult<Option<StoredDocument>> {
        self.inner.find(kind, id).await
    }

    async fn query(&self, kind: EntityKind, filter: &DocumentFilter) -> AppResult<Vec<StoredDocument>> {
        if kind == EntityKind::Invoice && self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("invoice table unavailable".to_string()));
        }
        self.inner.query(kind, filter).await
    }

    async fn commit(&self, writes: Vec<DocumentWrite>) -> AppResult<()> {
        self.inner.commit(writes).await
    }
}

fn new_invoice(order_id: Uuid) -> NewInvoice {
    NewInvoice {
        order_id,
        items: None,
        notes: Some("Delivered in full".to_string()),
    }
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn confirming_an_loi_creates_the_order_and_confirms_the_loi() {
    let h = Harness::new();
    let loi = h.accepted_loi().await;

    let order = h
        .orders()
        .confirm_from_loi(&h.manager, loi.id, ConfirmOrder::default())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, dec(1180));
    assert_eq!(order.advance_amount, dec(236));

    let loi = h.lois().get(&h.vendor, loi.id).await.unwrap();
    assert_eq!(loi.status, LoiStatus::Confirmed);
}

#[tokio::test]
async fn advance_override_must_fit_the_total() {
    let h = Harness::new();
    let loi = h.accepted_loi().await;

    let err = h
        .orders()
        .confirm_from_loi(
            &h.manager,
            loi.id,
            ConfirmOrder {
                advance_amount: Some(dec(5000)),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::Validation { .. }));

    // Nothing was written by the failed attempt
    let loi = h.lois().get(&h.manager, loi.id).await.unwrap();
    assert_eq!(loi.status, LoiStatus::Accepted);
}

#[tokio::test]
async fn concurrent_confirmation_yields_one_order() {
    let h = Harness::new();
    let loi = h.accepted_loi().await;
    let (first, second) = (h.orders(), h.orders());

    let (a, b) = tokio::join!(
        first.confirm_from_loi(&h.manager, loi.id, ConfirmOrder::default()),
        second.confirm_from_loi(&h.manager, loi.id, ConfirmOrder::default()),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(loser.status_code(), axum::http::StatusCode::CONFLICT);

    let orders = h.orders().list(&h.manager, &Default::default()).await.unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn loi_must_be_accepted_before_confirmation() {
    let h = Harness::new();
    let quotation = h.accepted_quotation().await;
    let loi = h
        .lois()
        .issue(
            &h.manager,
            Harness::new_loi(quotation.id, shared::LoiSourceType::Quotation),
        )
        .await
        .unwrap();

    let err = h
        .orders()
        .confirm_from_loi(&h.manager, loi.id, ConfirmOrder::default())
        .await
        .unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::Precondition { .. }));
}

#[tokio::test]
async fn vendor_acknowledges_order() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    assert_eq!(order.status, OrderStatus::Confirmed);

    let err = h.orders().acknowledge(&h.vendor, order.id).await.unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::InvalidState { .. }));
}

// ============================================================================
// Invoices
// ============================================================================

#[tokio::test]
async fn invoice_needs_a_confirmed_order() {
    let h = Harness::new();
    let loi = h.accepted_loi().await;
    let order = h
        .orders()
        .confirm_from_loi(&h.manager, loi.id, ConfirmOrder::default())
        .await
        .unwrap();

    let err = h
        .invoices()
        .create(&h.vendor, new_invoice(order.id))
        .await
        .unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::Precondition { .. }));
}

#[tokio::test]
async fn invoice_copies_order_lines_and_numbers_itself() {
    let h = Harness::new();
    let order = h.confirmed_order().await;

    let invoice = h.invoices().create(&h.vendor, new_invoice(order.id)).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.total_amount, order.total_amount);
    assert_eq!(invoice.total_cgst, dec(90));
    assert!(invoice.invoice_number.starts_with("INV-"));
    assert_eq!(invoice.invoice_number.len(), "INV-YYYYMMDD-XXXXXXXX".len());
}

#[tokio::test]
async fn one_open_invoice_per_order_until_rejected() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    let first = h.invoices().create(&h.vendor, new_invoice(order.id)).await.unwrap();

    let err = h
        .invoices()
        .create(&h.vendor, new_invoice(order.id))
        .await
        .unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::Conflict { .. }));

    h.invoices()
        .reject(
            &h.manager,
            first.id,
            RejectInput {
                rejection_reason: Some("Wrong GST number".to_string()),
            },
        )
        .await
        .unwrap();
    let second = h.invoices().create(&h.vendor, new_invoice(order.id)).await.unwrap();
    assert_ne!(second.id, first.id);
}

#[tokio::test]
async fn invoice_cannot_skip_review() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    let invoice = h.invoices().create(&h.vendor, new_invoice(order.id)).await.unwrap();

    let err = h.invoices().accept(&h.manager, invoice.id).await.unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::InvalidState { .. }));
    let err = h.invoices().mark_paid(&h.manager, invoice.id).await.unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::InvalidState { .. }));
}

// ============================================================================
// Payments and ledger
// ============================================================================

#[tokio::test]
async fn ledger_settles_on_completed_payments_only() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    let invoice = h.accepted_invoice(&order).await;

    h.completed_payment(&order, PaymentPhase::Advance, dec(236)).await;
    let failed = h.completed_payment(&order, PaymentPhase::Final, dec(500)).await;
    h.payments()
        .fail(
            &h.manager,
            failed.id,
            FailPaymentInput {
                reason: Some("Bounced".to_string()),
            },
        )
        .await
        .unwrap();

    let ledger = h.ledger().order_ledger(&h.manager, order.id).await.unwrap();
    assert_eq!(ledger.basis, LedgerBasis::Invoice);
    assert_eq!(ledger.invoice_id, Some(invoice.id));
    assert_eq!(ledger.paid_to_date, dec(236));
    assert_eq!(ledger.advance_paid, dec(236));
    assert_eq!(ledger.pending, dec(944));
    assert_eq!(ledger.standing, Standing::Open);
    assert_eq!(ledger.payment_count, 2);

    h.completed_payment(&order, PaymentPhase::Final, dec(944)).await;
    let ledger = h.ledger().order_ledger(&h.vendor, order.id).await.unwrap();
    assert_eq!(ledger.standing, Standing::Settled);
    assert_eq!(ledger.pending, Decimal::ZERO);
}

#[tokio::test]
async fn marking_paid_with_balance_reports_mismatch() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    let invoice = h.accepted_invoice(&order).await;
    h.completed_payment(&order, PaymentPhase::Advance, dec(236)).await;

    let paid = h.invoices().mark_paid(&h.manager, invoice.id).await.unwrap();
    assert_eq!(paid.invoice.status, InvoiceStatus::Paid);
    assert!(paid.invoice.paid_at.is_some());
    assert_eq!(
        paid.mismatch,
        Some(PaidFlagMismatch::MarkedPaidWithBalance { pending: dec(944) })
    );
}

#[tokio::test]
async fn full_chain_completes_the_order() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    let invoice = h.accepted_invoice(&order).await;

    let err = h.orders().complete(&h.manager, order.id).await.unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::Precondition { .. }));

    h.completed_payment(&order, PaymentPhase::Advance, dec(236)).await;
    h.completed_payment(&order, PaymentPhase::Final, dec(944)).await;
    let paid = h.invoices().mark_paid(&h.manager, invoice.id).await.unwrap();
    assert!(paid.mismatch.is_none());
    assert!(paid.ledger.is_settled());

    let completed = h.orders().complete(&h.manager, order.id).await.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);

    // Completed orders take no further payments
    let err = h
        .payments()
        .record(
            &h.manager,
            order.id,
            NewPayment {
                phase: PaymentPhase::Final,
                amount: dec(1),
                due_date: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::Precondition { .. }));

    let event = h.event_for("complete").await.expect("completion announced");
    assert_eq!(event.entity_id, order.id);
    assert_eq!(event.from_status.as_deref(), Some("confirmed"));
}

#[tokio::test]
async fn receipt_needs_a_reference() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    let payment = h.completed_payment(&order, PaymentPhase::Advance, dec(236)).await;
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.payment_date.is_some());

    let err = h
        .payments()
        .send_receipt(&h.manager, payment.id, ReceiptInput { reference_number: None })
        .await
        .unwrap_err();
    assert!(matches!(workflow_error(err), WorkflowError::Validation { .. }));

    let sent = h
        .payments()
        .send_receipt(
            &h.manager,
            payment.id,
            ReceiptInput {
                reference_number: Some("UTR-778812".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(sent.status, PaymentStatus::ReceiptSent);

    let ledger = h.ledger().order_ledger(&h.manager, order.id).await.unwrap();
    assert_eq!(ledger.paid_to_date, dec(236));
}

#[tokio::test]
async fn vendors_see_only_their_payments() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    h.completed_payment(&order, PaymentPhase::Advance, dec(100)).await;

    let mine = h.payments().list_for_order(&h.vendor, order.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    let err = h
        .payments()
        .list_for_order(&h.other_vendor(), order.id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ledger_report_exports_csv() {
    let h = Harness::new();
    let order = h.confirmed_order().await;
    h.completed_payment(&order, PaymentPhase::Advance, dec(236)).await;

    let rows = h.ledger().report(&h.manager).await.unwrap();
    assert_eq!(rows.len(), 1);
    let csv = procurement_backend::services::LedgerService::export_to_csv(&rows).unwrap();
    assert!(csv.lines().next().unwrap().contains("order_id"));
    assert!(csv.contains(&order.id.to_string()));
}

#[tokio::test]
async fn recorded_payment_survives_a_failed_overpayment_check() {
    let store = Arc::new(InvoiceReadsFail {
        inner: MemoryDocumentStore::new(),
        failing: AtomicBool::new(false),
    });
    let h = Harness::with_repo(Repository::new(store.clone()));
    let order = h.confirmed_order().await;
    store.failing.store(true, Ordering::SeqCst);

    let payment = h
        .payments()
        .record(
            &h.manager,
            order.id,
            NewPayment {
                phase: PaymentPhase::Advance,
                amount: dec(236),
                due_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);

    let event = h.event_for("record").await.unwrap();
    assert_eq!(event.entity_id, payment.id);
    let stored = h.payments().list_for_order(&h.manager, order.id).await.unwrap();
    assert_eq!(stored.len(), 1);
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Paid-to-date equals the sum of payments that did not fail
    #[test]
    fn prop_paid_to_date_ignores_failed_payments(
        payments in prop::collection::vec((1i64..2_000, any::<bool>()), 1..6)
    ) {
        tokio_test::block_on(async {
            let h = Harness::new();
            let order = h.confirmed_order().await;
            let mut expected = Decimal::ZERO;

            for (amount, fails) in &payments {
                let payment = h.completed_payment(&order, PaymentPhase::Final, dec(*amount)).await;
                if *fails {
                    h.payments()
                        .fail(&h.manager, payment.id, FailPaymentInput { reason: Some("Reversed".to_string()) })
                        .await
                        .unwrap();
                } else {
                    expected += dec(*amount);
                }
            }

            let ledger = h.ledger().order_ledger(&h.manager, order.id).await.unwrap();
            assert_eq!(ledger.paid_to_date, expected);
            assert_eq!(ledger.basis, LedgerBasis::Order);
            assert_eq!(ledger.pending, (dec(1180) - expected).max(Decimal::ZERO));
        });
    }
}
