//! WebAssembly module for the procurement marketplace
//!
//! Lets a browser client preview what the server will compute:
//! - Line item and document totals
//! - Advance amounts and ledger standing
//! - The actions a document's status allows next

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use shared::{
    compute_totals, percent_of, round_currency, standing, validate_line_items, ComponentStatus,
    CounterStatus, DocumentTotals, EnquiryStatus, EntityKind, InvoiceStatus, Lifecycle, LineItem,
    LoiStatus, OrderStatus, PaymentStatus, QuotationStatus,
};
use wasm_bindgen::prelude::*;

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|e| format!("{}: {}", field, e))
}

fn totals_of(items_json: &str) -> Result<DocumentTotals, String> {
    let items: Vec<LineItem> =
        serde_json::from_str(items_json).map_err(|e| format!("Invalid items JSON: {}", e))?;
    validate_line_items("items", &items).map_err(|e| e.to_string())?;
    compute_totals(&items).map_err(|e| e.to_string())
}

fn advance_of(total: &str, percent: &str) -> Result<Decimal, String> {
    let total = parse_decimal("total", total)?;
    let percent = parse_decimal("percent", percent)?;
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err("percent: must be between 0 and 100".to_string());
    }
    Ok(round_currency(percent_of(total, percent)))
}

fn standing_of(amount_due: &str, paid: &str) -> Result<&'static str, String> {
    let due = parse_decimal("amountDue", amount_due)?;
    let paid = parse_decimal("paid", paid)?;
    Ok(standing(due, paid).as_str())
}

fn actions_from<S: Lifecycle + DeserializeOwned>(status: &str) -> Result<Vec<String>, String> {
    let current: S = serde_json::from_value(serde_json::Value::String(status.to_string()))
        .map_err(|_| format!("Unknown status '{}'", status))?;
    Ok(S::TABLE
        .iter()
        .filter(|(from, _, _)| *from == current)
        .map(|(_, action, _)| action.to_string())
        .collect())
}

fn actions_of(entity: &str, status: &str) -> Result<Vec<String>, String> {
    match EntityKind::from_str(entity) {
        Some(EntityKind::Component) => actions_from::<ComponentStatus>(status),
        Some(EntityKind::Enquiry) => actions_from::<EnquiryStatus>(status),
        Some(EntityKind::Quotation) => actions_from::<QuotationStatus>(status),
        Some(EntityKind::CounterQuotation) => actions_from::<CounterStatus>(status),
        Some(EntityKind::Loi) => actions_from::<LoiStatus>(status),
        Some(EntityKind::Order) => actions_from::<OrderStatus>(status),
        Some(EntityKind::Invoice) => actions_from::<InvoiceStatus>(status),
        Some(EntityKind::Payment) => actions_from::<PaymentStatus>(status),
        None => Err(format!("Unknown entity '{}'", entity)),
    }
}

/// Totals of a JSON array of line items, returned as JSON
#[wasm_bindgen]
pub fn calculate_totals(items_json: &str) -> Result<String, JsValue> {
    let totals = totals_of(items_json).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&totals).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Advance due on an order total at the given percentage
#[wasm_bindgen]
pub fn calculate_advance(total: &str, percent: &str) -> Result<String, JsValue> {
    advance_of(total, percent)
        .map(|amount| amount.to_string())
        .map_err(|e| JsValue::from_str(&e))
}

/// `open`, `settled` or `overpaid`
#[wasm_bindgen]
pub fn ledger_standing(amount_due: &str, paid: &str) -> Result<String, JsValue> {
    standing_of(amount_due, paid)
        .map(str::to_string)
        .map_err(|e| JsValue::from_str(&e))
}

/// JSON array of the actions allowed from `status`
#[wasm_bindgen]
pub fn allowed_actions(entity: &str, status: &str) -> Result<String, JsValue> {
    let actions = actions_of(entity, status).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&actions).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: &str = r#"[{
        "componentId": "6f9619ff-8b86-d011-b42d-00cf4fc964ff",
        "quantity": "10",
        "unitPrice": "100",
        "discountPercent": "10",
        "cgstPercent": "9",
        "sgstPercent": "9"
    }]"#;

    #[test]
    fn test_totals() {
        let totals = totals_of(ITEMS).unwrap();
        assert_eq!(totals.subtotal, Decimal::from(1000));
        assert_eq!(totals.total_discount, Decimal::from(100));
        assert_eq!(totals.total_cgst, Decimal::from(81));
        assert_eq!(totals.total_amount, Decimal::from(1062));
    }

    #[test]
    fn test_totals_reject_bad_lines() {
        assert!(totals_of("[]").is_err());
        assert!(totals_of(&ITEMS.replace(r#""quantity": "10""#, r#""quantity": "0""#)).is_err());
        assert!(totals_of("not json").is_err());
    }

    #[test]
    fn test_advance() {
        assert_eq!(advance_of("1062", "20").unwrap(), Decimal::from_str("212.40").unwrap());
        assert!(advance_of("1062", "120").is_err());
    }

    #[test]
    fn test_standing() {
        assert_eq!(standing_of("10000", "9999.995").unwrap(), "settled");
        assert_eq!(standing_of("10000", "4000").unwrap(), "open");
        assert_eq!(standing_of("10000", "10500").unwrap(), "overpaid");
    }

    #[test]
    fn test_allowed_actions() {
        assert_eq!(actions_of("invoice", "accepted").unwrap(), vec!["mark_paid"]);
        assert_eq!(actions_of("order", "pending").unwrap(), vec!["acknowledge"]);
        assert!(actions_of("order", "completed").unwrap().is_empty());
        assert!(actions_of("order", "shipped").is_err());
        assert!(actions_of("shipment", "pending").is_err());
    }
}
