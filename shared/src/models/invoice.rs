//! Vendor invoices raised against a confirmed order

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{Order, OrderStatus};
use super::payment::Payment;
use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::ledger::{check_paid_flag, summarize, LedgerSummary, PaidFlagMismatch};
use crate::lifecycle::{transition, Lifecycle};
use crate::money::{compute_totals, validate_line_items, LineItem};
use crate::types::EntityKind;
use crate::validation::require_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Received,
    Accepted,
    Rejected,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Received => "received",
            InvoiceStatus::Accepted => "accepted",
            InvoiceStatus::Rejected => "rejected",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Every status but `rejected` blocks a new invoice on the order
    pub fn is_open(&self) -> bool {
        *self != InvoiceStatus::Rejected
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceAction {
    Receive,
    Accept,
    Reject,
    MarkPaid,
}

impl std::fmt::Display for InvoiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InvoiceAction::Receive => "receive",
            InvoiceAction::Accept => "accept",
            InvoiceAction::Reject => "reject",
            InvoiceAction::MarkPaid => "mark_paid",
        })
    }
}

impl Lifecycle for InvoiceStatus {
    type Action = InvoiceAction;

    const ENTITY: EntityKind = EntityKind::Invoice;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (InvoiceStatus::Pending, InvoiceAction::Receive, InvoiceStatus::Received),
        (InvoiceStatus::Received, InvoiceAction::Accept, InvoiceStatus::Accepted),
        (InvoiceStatus::Accepted, InvoiceAction::MarkPaid, InvoiceStatus::Paid),
        (InvoiceStatus::Pending, InvoiceAction::Reject, InvoiceStatus::Rejected),
        (InvoiceStatus::Received, InvoiceAction::Reject, InvoiceStatus::Rejected),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total_cgst: Decimal,
    pub total_sgst: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub status: InvoiceStatus,
    pub rejection_reason: Option<String>,
    pub created_by: Uuid,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub order_id: Uuid,
    /// Defaults to the order's items
    pub items: Option<Vec<LineItem>>,
    pub notes: Option<String>,
}

/// Result of marking an invoice paid
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidInvoice {
    pub invoice: Invoice,
    pub ledger: LedgerSummary,
    /// Set when the payment log disagrees with the paid flag
    pub mismatch: Option<PaidFlagMismatch>,
}

pub fn invoice_key(order_id: Uuid) -> String {
    format!("invoice:{}", order_id)
}

impl Invoice {
    /// Raise an invoice; `existing` are the invoices already on the order
    pub fn create(
        order: &Order,
        existing: &[Invoice],
        created_by: Uuid,
        input: NewInvoice,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Self> {
        if order.status != OrderStatus::Confirmed {
            return Err(WorkflowError::precondition(
                EntityKind::Order,
                order.id,
                OrderStatus::Confirmed.as_str(),
                order.status.as_str(),
            ));
        }
        if let Some(open) = existing
            .iter()
            .find(|i| i.order_id == order.id && i.status.is_open())
        {
            return Err(WorkflowError::conflict(
                EntityKind::Invoice,
                Some(open.id),
                format!("invoice {} is already {} for order {}", open.id, open.status, order.id),
            ));
        }

        let items = input.items.unwrap_or_else(|| order.items.clone());
        validate_line_items("items", &items)?;
        let totals = compute_totals(&items)?;

        let id = Uuid::new_v4();
        let invoice_number = format!(
            "INV-{}-{}",
            now.format("%Y%m%d"),
            &id.simple().to_string()[..8].to_uppercase()
        );

        Ok(Self {
            id,
            invoice_number,
            order_id: order.id,
            vendor_id: order.vendor_id,
            items,
            subtotal: totals.subtotal,
            total_discount: totals.total_discount,
            total_cgst: totals.total_cgst,
            total_sgst: totals.total_sgst,
            total_amount: totals.total_amount,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            status: InvoiceStatus::Pending,
            rejection_reason: None,
            created_by,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn advance(&self, action: InvoiceAction, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, action)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn mark_received(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        self.advance(InvoiceAction::Receive, now)
    }

    pub fn accept(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        self.advance(InvoiceAction::Accept, now)
    }

    pub fn reject(&self, reason: Option<&str>, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let reason = require_text("rejectionReason", reason)?;
        let mut rejected = self.advance(InvoiceAction::Reject, now)?;
        rejected.rejection_reason = Some(reason);
        Ok(rejected)
    }

    /// Manual bookkeeping confirmation. The payment log is summarised
    /// alongside and any disagreement reported, never corrected.
    pub fn mark_paid(
        &self,
        order: &Order,
        payments: &[Payment],
        now: DateTime<Utc>,
    ) -> WorkflowResult<PaidInvoice> {
        let mut invoice = self.advance(InvoiceAction::MarkPaid, now)?;
        invoice.paid_at = Some(now);

        let ledger = summarize(order, std::slice::from_ref(&invoice), payments);
        let mismatch = check_paid_flag(&invoice, &ledger);
        Ok(PaidInvoice {
            invoice,
            ledger,
            mismatch,
        })
    }
}

impl Document for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;

    fn id(&self) -> Uuid {
        self.id
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn vendor_id(&self) -> Uuid {
        self.vendor_id
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.order_id)
    }

    /// Rejected invoices release the order for a fresh invoice
    fn unique_key(&self) -> Option<String> {
        self.status.is_open().then(|| invoice_key(self.order_id))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::order::fixtures::{confirmed_order, pending_order};

    #[test]
    fn create_recomputes_totals_from_items() {
        let order = confirmed_order();
        let mut items = order.items.clone();
        items[0].discount_percent = Decimal::ZERO;

        let invoice = Invoice::create(
            &order,
            &[],
            Uuid::new_v4(),
            NewInvoice {
                items: Some(items),
                ..new_invoice(&order)
            },
            Utc::now(),
        )
        .unwrap();

        // 10 × 100, no discount, 9% + 9%
        assert_eq!(invoice.subtotal, Decimal::from(1000));
        assert_eq!(invoice.total_discount, Decimal::ZERO);
        assert_eq!(invoice.total_cgst, Decimal::from(90));
        assert_eq!(invoice.total_sgst, Decimal::from(90));
        assert_eq!(invoice.total_amount, Decimal::from(1180));
        assert!(invoice.invoice_number.starts_with("INV-"));
    }

    #[test]
    fn items_default_to_order_items() {
        let order = confirmed_order();
        let invoice =
            Invoice::create(&order, &[], Uuid::new_v4(), new_invoice(&order), Utc::now()).unwrap();
        assert_eq!(invoice.items, order.items);
        assert_eq!(invoice.total_amount, order.total_amount);
    }

    #[test]
    fn create_requires_confirmed_order() {
        let (order, _) = pending_order();
        let result = Invoice::create(&order, &[], Uuid::new_v4(), new_invoice(&order), Utc::now());
        assert!(matches!(result, Err(WorkflowError::Precondition { .. })));
    }

    #[test]
    fn one_open_invoice_per_order() {
        let order = confirmed_order();
        let first =
            Invoice::create(&order, &[], Uuid::new_v4(), new_invoice(&order), Utc::now()).unwrap();

        let second = Invoice::create(
            &order,
            std::slice::from_ref(&first),
            Uuid::new_v4(),
            new_invoice(&order),
            Utc::now(),
        );
        assert!(matches!(second, Err(WorkflowError::Conflict { .. })));

        let rejected = first.reject(Some("Wrong GST number"), Utc::now()).unwrap();
        assert_eq!(rejected.unique_key(), None);
        let retry = Invoice::create(
            &order,
            std::slice::from_ref(&rejected),
            Uuid::new_v4(),
            new_invoice(&order),
            Utc::now(),
        );
        assert!(retry.is_ok());
    }

    #[test]
    fn reject_requires_reason_and_open_status() {
        let order = confirmed_order();
        let invoice = accepted_invoice(&order);
        assert!(matches!(
            invoice.reject(Some("late"), Utc::now()),
            Err(WorkflowError::InvalidState { .. })
        ));

        let pending =
            Invoice::create(&order, &[], Uuid::new_v4(), new_invoice(&order), Utc::now()).unwrap();
        assert!(matches!(
            pending.reject(Some(" "), Utc::now()),
            Err(WorkflowError::Validation { .. })
        ));
    }

    #[test]
    fn mark_paid_without_payments_flags_mismatch() {
        let order = confirmed_order();
        let invoice = accepted_invoice(&order);
        let paid = invoice.mark_paid(&order, &[], Utc::now()).unwrap();

        assert_eq!(paid.invoice.status, InvoiceStatus::Paid);
        assert!(paid.invoice.paid_at.is_some());
        assert_eq!(
            paid.mismatch,
            Some(PaidFlagMismatch::MarkedPaidWithBalance {
                pending: invoice.total_amount
            })
        );
    }

    #[test]
    fn mark_paid_requires_accepted() {
        let order = confirmed_order();
        let pending =
            Invoice::create(&order, &[], Uuid::new_v4(), new_invoice(&order), Utc::now()).unwrap();
        assert!(matches!(
            pending.mark_paid(&order, &[], Utc::now()),
            Err(WorkflowError::InvalidState { .. })
        ));
    }
}
