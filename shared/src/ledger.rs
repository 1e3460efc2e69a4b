//! Settlement ledger for an order and its invoice
//!
//! Nothing here is stored. `paid_to_date` is the sum of every payment that
//! has not failed, measured against the open invoice (or the order total
//! before one exists). Amounts within [`SETTLEMENT_TOLERANCE`] of each other
//! are treated as equal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Invoice, InvoiceStatus, Order, Payment, PaymentPhase};

/// One hundredth of a currency unit
pub const SETTLEMENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Open,
    Settled,
    Overpaid,
}

impl Standing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Standing::Open => "open",
            Standing::Settled => "settled",
            Standing::Overpaid => "overpaid",
        }
    }
}

/// What the amount due was measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBasis {
    Invoice,
    Order,
}

impl LedgerBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerBasis::Invoice => "invoice",
            LedgerBasis::Order => "order",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub order_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub invoice_status: Option<InvoiceStatus>,
    pub basis: LedgerBasis,
    pub amount_due: Decimal,
    pub paid_to_date: Decimal,
    pub advance_paid: Decimal,
    pub pending: Decimal,
    pub surplus: Decimal,
    pub standing: Standing,
    pub payment_count: usize,
}

impl LedgerSummary {
    pub fn is_settled(&self) -> bool {
        self.standing != Standing::Open
    }
}

/// Disagreement between the manual paid flag and the payment log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaidFlagMismatch {
    /// Invoice marked paid while the log still shows a balance
    MarkedPaidWithBalance { pending: Decimal },
    /// Payments cover the invoice but nobody marked it paid
    SettledButNotMarkedPaid,
}

/// Σ of non-failed payment amounts
pub fn paid_to_date(payments: &[Payment]) -> Decimal {
    payments
        .iter()
        .filter(|p| p.status.counts_towards_paid())
        .fold(Decimal::ZERO, |sum, p| sum.saturating_add(p.amount))
}

/// Classify `paid` against `due`
pub fn standing(due: Decimal, paid: Decimal) -> Standing {
    if paid - due > SETTLEMENT_TOLERANCE {
        Standing::Overpaid
    } else if due - paid <= SETTLEMENT_TOLERANCE {
        Standing::Settled
    } else {
        Standing::Open
    }
}

/// Summarise an order's payments against its open invoice, if any
pub fn summarize(order: &Order, invoices: &[Invoice], payments: &[Payment]) -> LedgerSummary {
    let invoice = invoices
        .iter()
        .find(|i| i.order_id == order.id && i.status.is_open());
    let payments: Vec<Payment> = payments
        .iter()
        .filter(|p| p.order_id == order.id)
        .cloned()
        .collect();

    let (basis, amount_due) = match invoice {
        Some(invoice) => (LedgerBasis::Invoice, invoice.total_amount),
        None => (LedgerBasis::Order, order.total_amount),
    };
    let paid = paid_to_date(&payments);
    let advance_paid = payments
        .iter()
        .filter(|p| p.phase == PaymentPhase::Advance && p.status.counts_towards_paid())
        .fold(Decimal::ZERO, |sum, p| sum.saturating_add(p.amount));

    LedgerSummary {
        order_id: order.id,
        invoice_id: invoice.map(|i| i.id),
        invoice_status: invoice.map(|i| i.status),
        basis,
        amount_due,
        paid_to_date: paid,
        advance_paid,
        pending: (amount_due - paid).max(Decimal::ZERO),
        surplus: (paid - amount_due).max(Decimal::ZERO),
        standing: standing(amount_due, paid),
        payment_count: payments.len(),
    }
}

/// Compare the invoice's paid flag with what the ledger says
pub fn check_paid_flag(invoice: &Invoice, summary: &LedgerSummary) -> Option<PaidFlagMismatch> {
    let marked_paid = invoice.status == InvoiceStatus::Paid;
    match (marked_paid, summary.is_settled()) {
        (true, false) => Some(PaidFlagMismatch::MarkedPaidWithBalance {
            pending: summary.pending,
        }),
        (false, true) if invoice.status == InvoiceStatus::Accepted => {
            Some(PaidFlagMismatch::SettledButNotMarkedPaid)
        }
        _ => None,
    }
}
