//! Orders confirmed from an accepted LOI

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invoice::{Invoice, InvoiceStatus};
use super::loi::{Loi, LoiStatus};
use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::lifecycle::{transition, Lifecycle};
use crate::money::{percent_of, round_currency, LineItem};
use crate::types::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Acknowledge,
    Complete,
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OrderAction::Acknowledge => "acknowledge",
            OrderAction::Complete => "complete",
        })
    }
}

impl Lifecycle for OrderStatus {
    type Action = OrderAction;

    const ENTITY: EntityKind = EntityKind::Order;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (OrderStatus::Pending, OrderAction::Acknowledge, OrderStatus::Confirmed),
        (OrderStatus::Confirmed, OrderAction::Complete, OrderStatus::Completed),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub loi_id: Uuid,
    pub quotation_id: Uuid,
    pub vendor_id: Uuid,
    pub items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub advance_payment_percent: Decimal,
    pub advance_amount: Decimal,
    pub expected_delivery_date: NaiveDate,
    pub status: OrderStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOrder {
    /// Replaces the computed advance when present
    pub advance_amount: Option<Decimal>,
}

pub fn order_key(loi_id: Uuid) -> String {
    format!("order:{}", loi_id)
}

impl Order {
    /// Create the order for an accepted LOI; returns the order and the LOI moved to `confirmed`.
    /// Both must be written together.
    pub fn confirm_from_loi(
        loi: &Loi,
        existing: Option<&Order>,
        created_by: Uuid,
        input: ConfirmOrder,
        now: DateTime<Utc>,
    ) -> WorkflowResult<(Self, Loi)> {
        if let Some(order) = existing {
            return Err(WorkflowError::conflict(
                EntityKind::Order,
                Some(order.id),
                format!("order {} already exists for LOI {}", order.id, loi.id),
            ));
        }
        if loi.status != LoiStatus::Accepted {
            return Err(WorkflowError::precondition(
                EntityKind::Loi,
                loi.id,
                LoiStatus::Accepted.as_str(),
                loi.status.as_str(),
            ));
        }

        let advance_amount = match input.advance_amount {
            Some(amount) if amount < Decimal::ZERO || amount > loi.total_amount => {
                return Err(WorkflowError::validation(
                    "advanceAmount",
                    "must be between 0 and the order total",
                ));
            }
            Some(amount) => round_currency(amount),
            None => round_currency(percent_of(loi.total_amount, loi.advance_payment_percent)),
        };

        let confirmed = loi.confirm(now)?;
        let order = Self {
            id: Uuid::new_v4(),
            loi_id: loi.id,
            quotation_id: loi.quotation_id,
            vendor_id: loi.vendor_id,
            items: loi.items.clone(),
            total_amount: loi.total_amount,
            advance_payment_percent: loi.advance_payment_percent,
            advance_amount,
            expected_delivery_date: loi.expected_delivery_date,
            status: OrderStatus::Pending,
            created_by,
            created_at: now,
            updated_at: now,
        };
        Ok((order, confirmed))
    }

    /// Vendor acknowledges the order
    pub fn acknowledge(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, OrderAction::Acknowledge)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Close the order once its invoice has been marked paid
    pub fn complete(&self, invoice: Option<&Invoice>, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, OrderAction::Complete)?;
        match invoice {
            Some(invoice) if invoice.status == InvoiceStatus::Paid => {}
            Some(invoice) => {
                return Err(WorkflowError::precondition(
                    EntityKind::Invoice,
                    invoice.id,
                    InvoiceStatus::Paid.as_str(),
                    invoice.status.as_str(),
                ));
            }
            None => {
                return Err(WorkflowError::precondition(
                    EntityKind::Order,
                    self.id,
                    "a paid invoice",
                    "no open invoice",
                ));
            }
        }
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Balance still owed as advance
    pub fn advance_remaining(&self, paid_to_date: Decimal) -> Decimal {
        (self.advance_amount - paid_to_date).max(Decimal::ZERO)
    }
}

impl Document for Order {
    const KIND: EntityKind = EntityKind::Order;

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
        Some(self.loi_id)
    }

    fn unique_key(&self) -> Option<String> {
        Some(order_key(self.loi_id))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::loi::fixtures::sent_loi;

    #[test]
    fn confirm_moves_loi_and_computes_advance() {
        let (order, loi) = pending_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(loi.status, LoiStatus::Confirmed);
        assert_eq!(order.total_amount, Decimal::from(1062));
        // 20% of 1062
        assert_eq!(order.advance_amount, Decimal::new(21240, 2));
        assert_eq!(order.unique_key(), Some(format!("order:{}", loi.id)));
    }

    #[test]
    fn confirm_from_sent_loi_is_precondition_failure() {
        let loi = sent_loi();
        let before = loi.clone();
        let err = Order::confirm_from_loi(&loi, None, Uuid::new_v4(), ConfirmOrder::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Precondition { ref expected, ref actual, .. }
                if expected == "accepted" && actual == "sent"
        ));
        assert_eq!(loi, before);
    }

    #[test]
    fn second_order_for_loi_is_conflict() {
        let loi = sent_loi().accept(Utc::now()).unwrap();
        let (order, _) =
            Order::confirm_from_loi(&loi, None, Uuid::new_v4(), ConfirmOrder::default(), Utc::now())
                .unwrap();
        let err = Order::confirm_from_loi(
            &loi,
            Some(&order),
            Uuid::new_v4(),
            ConfirmOrder::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict { .. }));
    }

    #[test]
    fn advance_override_is_bounded_by_total() {
        let loi = sent_loi().accept(Utc::now()).unwrap();
        let (order, _) = Order::confirm_from_loi(
            &loi,
            None,
            Uuid::new_v4(),
            ConfirmOrder {
                advance_amount: Some(Decimal::from(500)),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(order.advance_amount, Decimal::from(500));

        let result = Order::confirm_from_loi(
            &loi,
            None,
            Uuid::new_v4(),
            ConfirmOrder {
                advance_amount: Some(Decimal::from(5000)),
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(WorkflowError::Validation { .. })));
    }

    #[test]
    fn complete_requires_confirmed_order_and_paid_invoice() {
        let (pending, _) = pending_order();
        assert!(matches!(
            pending.complete(None, Utc::now()),
            Err(WorkflowError::InvalidState { .. })
        ));

        let confirmed = confirmed_order();
        assert!(matches!(
            confirmed.complete(None, Utc::now()),
            Err(WorkflowError::Precondition { .. })
        ));
    }
}
