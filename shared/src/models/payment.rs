//! Payment events logged against an order

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{Order, OrderStatus};
use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::lifecycle::{transition, Lifecycle};
use crate::money::round_currency;
use crate::types::EntityKind;
use crate::validation::{parse_calendar_date, require_text, validate_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPhase {
    Advance,
    Final,
}

impl PaymentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPhase::Advance => "advance",
            PaymentPhase::Final => "final",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    ReceiptSent,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::ReceiptSent => "receipt_sent",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Failed payments never count towards what has been paid
    pub fn counts_towards_paid(&self) -> bool {
        *self != PaymentStatus::Failed
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
    Complete,
    SendReceipt,
    Fail,
}

impl std::fmt::Display for PaymentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PaymentAction::Complete => "complete",
            PaymentAction::SendReceipt => "send_receipt",
            PaymentAction::Fail => "fail",
        })
    }
}

impl Lifecycle for PaymentStatus {
    type Action = PaymentAction;

    const ENTITY: EntityKind = EntityKind::Payment;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (PaymentStatus::Pending, PaymentAction::Complete, PaymentStatus::Completed),
        (PaymentStatus::Completed, PaymentAction::SendReceipt, PaymentStatus::ReceiptSent),
        (PaymentStatus::Pending, PaymentAction::Fail, PaymentStatus::Failed),
        (PaymentStatus::Completed, PaymentAction::Fail, PaymentStatus::Failed),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub phase: PaymentPhase,
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    /// Receipt reference number or URL
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub failure_reason: Option<String>,
    pub status: PaymentStatus,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub phase: PaymentPhase,
    pub amount: Decimal,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayment {
    /// Defaults to the completion date
    pub payment_date: Option<String>,
}

impl Payment {
    /// Log a payment; several may exist per order and phase
    pub fn record(
        order: &Order,
        recorded_by: Uuid,
        input: NewPayment,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Self> {
        if order.status == OrderStatus::Completed {
            return Err(WorkflowError::precondition(
                EntityKind::Order,
                order.id,
                "pending or confirmed",
                order.status.as_str(),
            ));
        }
        let amount = round_currency(input.amount);
        validate_positive("amount", amount)?;
        let due_date = input
            .due_date
            .as_deref()
            .map(|d| parse_calendar_date("dueDate", d))
            .transpose()?;

        Ok(Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            vendor_id: order.vendor_id,
            phase: input.phase,
            amount,
            due_date,
            payment_date: None,
            reference_number: None,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            failure_reason: None,
            status: PaymentStatus::Pending,
            recorded_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn complete(&self, input: CompletePayment, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, PaymentAction::Complete)?;
        let payment_date = match input.payment_date.as_deref() {
            Some(date) => parse_calendar_date("paymentDate", date)?,
            None => now.date_naive(),
        };
        Ok(Self {
            status,
            payment_date: Some(payment_date),
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn send_receipt(&self, reference: Option<&str>, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let reference = require_text("referenceNumber", reference)?;
        let status = transition(self.id, self.status, PaymentAction::SendReceipt)?;
        Ok(Self {
            status,
            reference_number: Some(reference),
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn fail(&self, reason: Option<&str>, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, PaymentAction::Fail)?;
        Ok(Self {
            status,
            failure_reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            updated_at: now,
            ..self.clone()
        })
    }
}

impl Document for Payment {
    const KIND: EntityKind = EntityKind::Payment;

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
}
