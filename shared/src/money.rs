//! Fixed-point money arithmetic for priced line items
//!
//! `line_total = quantity × unit_price × (1 − discount/100) × (1 + (cgst + sgst)/100)`,
//! rounded to two decimal places (half away from zero). Document totals are
//! the sum of the rounded line totals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};

pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Decimal places kept for currency amounts
pub const CURRENCY_SCALE: u32 = 2;

/// Round an amount to the currency scale
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent` of `amount`, unrounded; cannot overflow for percentages up to 100
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * (percent / HUNDRED)
}

fn checked_percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount.checked_mul(percent.checked_div(HUNDRED)?)
}

/// A priced line on a quotation, counter, LOI, order or invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub component_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub cgst_percent: Decimal,
    pub sgst_percent: Decimal,
}

/// Amount breakdown for one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAmounts {
    pub gross: Decimal,
    pub discount: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub line_total: Decimal,
}

impl LineItem {
    /// Per-line amounts, each figure rounded independently; `None` when a
    /// figure leaves the decimal range
    pub fn amounts(&self) -> Option<LineAmounts> {
        let gross = self.quantity.checked_mul(self.unit_price)?;
        let discount = checked_percent_of(gross, self.discount_percent)?;
        let taxable = gross.checked_sub(discount)?;
        let cgst = checked_percent_of(taxable, self.cgst_percent)?;
        let sgst = checked_percent_of(taxable, self.sgst_percent)?;
        let line_total = taxable.checked_add(cgst)?.checked_add(sgst)?;

        Some(LineAmounts {
            gross: round_currency(gross),
            discount: round_currency(discount),
            cgst: round_currency(cgst),
            sgst: round_currency(sgst),
            line_total: round_currency(line_total),
        })
    }
}

/// Aggregate totals of a set of line items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total_cgst: Decimal,
    pub total_sgst: Decimal,
    pub total_amount: Decimal,
}

/// Recompute totals from the items themselves
pub fn compute_totals(items: &[LineItem]) -> WorkflowResult<DocumentTotals> {
    totals_for("items", items)
}

fn totals_for(field: &str, items: &[LineItem]) -> WorkflowResult<DocumentTotals> {
    let mut totals = DocumentTotals::default();
    for (index, item) in items.iter().enumerate() {
        let line = item.amounts().ok_or_else(|| {
            WorkflowError::validation(
                format!("{}[{}].quantity", field, index),
                "Line amount is too large",
            )
        })?;
        totals = add_line(&totals, &line)
            .ok_or_else(|| WorkflowError::validation(field, "Document total is too large"))?;
    }
    Ok(totals)
}

fn add_line(acc: &DocumentTotals, line: &LineAmounts) -> Option<DocumentTotals> {
    Some(DocumentTotals {
        subtotal: acc.subtotal.checked_add(line.gross)?,
        total_discount: acc.total_discount.checked_add(line.discount)?,
        total_cgst: acc.total_cgst.checked_add(line.cgst)?,
        total_sgst: acc.total_sgst.checked_add(line.sgst)?,
        total_amount: acc.total_amount.checked_add(line.line_total)?,
    })
}

/// Validate a non-empty set of priced lines
pub fn validate_line_items(field: &str, items: &[LineItem]) -> WorkflowResult<()> {
    if items.is_empty() {
        return Err(WorkflowError::validation(field, "At least one line item is required"));
    }

    for (index, item) in items.iter().enumerate() {
        let at = |name: &str| format!("{}[{}].{}", field, index, name);

        if item.quantity <= Decimal::ZERO {
            return Err(WorkflowError::validation(at("quantity"), "Quantity must be greater than 0"));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(WorkflowError::validation(at("unitPrice"), "Unit price cannot be negative"));
        }
        if item.discount_percent < Decimal::ZERO || item.discount_percent > HUNDRED {
            return Err(WorkflowError::validation(
                at("discountPercent"),
                "Discount must be between 0 and 100",
            ));
        }
        if item.cgst_percent < Decimal::ZERO {
            return Err(WorkflowError::validation(at("cgstPercent"), "CGST cannot be negative"));
        }
        if item.sgst_percent < Decimal::ZERO {
            return Err(WorkflowError::validation(at("sgstPercent"), "SGST cannot be negative"));
        }
    }

    totals_for(field, items).map(|_| ())
}
