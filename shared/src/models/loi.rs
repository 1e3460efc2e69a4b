//! Letters of intent issued from an accepted quotation or negotiated counter

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::counter::{CounterQuotation, CounterStatus, ResponseAction};
use super::quotation::{Quotation, QuotationStatus};
use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::lifecycle::{transition, Lifecycle};
use crate::money::LineItem;
use crate::types::EntityKind;
use crate::validation::{parse_delivery_date, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoiStatus {
    Sent,
    Accepted,
    Rejected,
    Confirmed,
}

impl LoiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoiStatus::Sent => "sent",
            LoiStatus::Accepted => "accepted",
            LoiStatus::Rejected => "rejected",
            LoiStatus::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for LoiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoiAction {
    Accept,
    Reject,
    /// Only reachable through order creation
    Confirm,
}

impl std::fmt::Display for LoiAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LoiAction::Accept => "accept",
            LoiAction::Reject => "reject",
            LoiAction::Confirm => "confirm",
        })
    }
}

impl Lifecycle for LoiStatus {
    type Action = LoiAction;

    const ENTITY: EntityKind = EntityKind::Loi;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (LoiStatus::Sent, LoiAction::Accept, LoiStatus::Accepted),
        (LoiStatus::Sent, LoiAction::Reject, LoiStatus::Rejected),
        (LoiStatus::Accepted, LoiAction::Confirm, LoiStatus::Confirmed),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoiSourceType {
    Quotation,
    CounterQuotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loi {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub counter_quotation_id: Option<Uuid>,
    pub source_type: LoiSourceType,
    pub vendor_id: Uuid,
    pub items: Vec<LineItem>,
    pub terms_and_conditions: String,
    pub expected_delivery_date: NaiveDate,
    pub advance_payment_percent: Decimal,
    pub total_amount: Decimal,
    pub status: LoiStatus,
    pub rejection_reason: Option<String>,
    pub issued_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoi {
    pub source_id: Uuid,
    pub source_type: LoiSourceType,
    pub terms_and_conditions: String,
    /// Overrides the source's delivery date
    pub expected_delivery_date: Option<String>,
}

/// The accepted document an LOI is issued from
#[derive(Debug, Clone, Copy)]
pub enum LoiSource<'a> {
    Quotation(&'a Quotation),
    Counter {
        counter: &'a CounterQuotation,
        quotation: &'a Quotation,
    },
}

impl<'a> LoiSource<'a> {
    pub fn quotation(&self) -> &'a Quotation {
        match *self {
            LoiSource::Quotation(quotation) => quotation,
            LoiSource::Counter { quotation, .. } => quotation,
        }
    }
}

/// Idempotency key shared by every LOI issued under one quotation
pub fn loi_key(quotation_id: Uuid) -> String {
    format!("loi:{}", quotation_id)
}

impl Loi {
    /// Issue an LOI; `existing` is any LOI already issued under the same quotation
    pub fn issue(
        source: LoiSource<'_>,
        existing: Option<&Loi>,
        issued_by: Uuid,
        input: NewLoi,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Self> {
        let quotation = source.quotation();
        if let Some(loi) = existing {
            return Err(WorkflowError::conflict(
                EntityKind::Loi,
                Some(loi.id),
                format!("LOI {} already issued for quotation {}", loi.id, quotation.id),
            ));
        }

        let (counter_quotation_id, items, delivery, advance, total) = match source {
            LoiSource::Quotation(quotation) => {
                if quotation.status != QuotationStatus::Accepted {
                    return Err(WorkflowError::precondition(
                        EntityKind::Quotation,
                        quotation.id,
                        QuotationStatus::Accepted.as_str(),
                        quotation.status.as_str(),
                    ));
                }
                if let Some(counter_id) = quotation.accepted_counter_id {
                    return Err(WorkflowError::precondition(
                        EntityKind::Quotation,
                        quotation.id,
                        format!("issue from counter quotation {}", counter_id),
                        "accepted through negotiation",
                    ));
                }
                (
                    None,
                    quotation.items.clone(),
                    quotation.expected_delivery_date,
                    quotation.advance_payment_percent,
                    quotation.total_amount,
                )
            }
            LoiSource::Counter { counter, quotation } => {
                if counter.quotation_id != quotation.id {
                    return Err(WorkflowError::validation(
                        "sourceId",
                        "counter does not belong to the quotation",
                    ));
                }
                if counter.status != CounterStatus::Accepted
                    || counter.action != ResponseAction::Negotiate
                {
                    return Err(WorkflowError::precondition(
                        EntityKind::CounterQuotation,
                        counter.id,
                        "accepted negotiation",
                        counter.status.as_str(),
                    ));
                }
                (
                    Some(counter.id),
                    counter.items.clone(),
                    counter.expected_delivery_date,
                    counter.advance_payment_percent,
                    counter.total_amount,
                )
            }
        };

        let terms_and_conditions = require_text(
            "termsAndConditions",
            Some(input.terms_and_conditions.as_str()),
        )?;
        let expected_delivery_date = match input.expected_delivery_date.as_deref() {
            Some(date) => parse_delivery_date("expectedDeliveryDate", date, now.date_naive())?,
            None => delivery,
        };

        Ok(Self {
            id: Uuid::new_v4(),
            quotation_id: quotation.id,
            counter_quotation_id,
            source_type: match source {
                LoiSource::Quotation(_) => LoiSourceType::Quotation,
                LoiSource::Counter { .. } => LoiSourceType::CounterQuotation,
            },
            vendor_id: quotation.vendor_id,
            items,
            terms_and_conditions,
            expected_delivery_date,
            advance_payment_percent: advance,
            total_amount: total,
            status: LoiStatus::Sent,
            rejection_reason: None,
            issued_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn accept(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, LoiAction::Accept)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn reject(&self, reason: Option<&str>, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, LoiAction::Reject)?;
        Ok(Self {
            status,
            rejection_reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            updated_at: now,
            ..self.clone()
        })
    }

    pub(crate) fn confirm(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, LoiAction::Confirm)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }
}

impl Document for Loi {
    const KIND: EntityKind = EntityKind::Loi;

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
        Some(self.quotation_id)
    }

    fn unique_key(&self) -> Option<String> {
        Some(loi_key(self.quotation_id))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::quotation::fixtures::sent_quotation;
    use crate::models::QuotationAction;

    pub fn new_loi(source_id: Uuid, source_type: LoiSourceType) -> NewLoi {
        NewLoi {
            source_id,
            source_type,
            terms_and_conditions: "Net 30, delivery ex-works".to_string(),
            expected_delivery_date: None,
        }
    }

    pub fn accepted_quotation() -> Quotation {
        let (quotation, _, _) = sent_quotation();
        quotation.apply(QuotationAction::Accept, Utc::now()).unwrap()
    }

    /// An LOI in `sent`, issued straight from an accepted quotation
    pub fn sent_loi() -> Loi {
        let quotation = accepted_quotation();
        Loi::issue(
            LoiSource::Quotation(&quotation),
            None,
            Uuid::new_v4(),
            new_loi(quotation.id, LoiSourceType::Quotation),
            Utc::now(),
        )
        .unwrap()
    }
}
