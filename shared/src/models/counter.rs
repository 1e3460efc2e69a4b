//! Counter-quotations: the append-only negotiation record
//!
//! Every response the purchasing side files against a quotation becomes a
//! new `CounterQuotation`; the quotation itself is never rewritten. At most
//! one counter is `pending` per quotation and filing another supersedes it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enquiry::Enquiry;
use super::quotation::{accept_enquiry, validate_terms, Quotation, QuotationAction};
use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::lifecycle::{transition, Lifecycle};
use crate::money::{compute_totals, validate_line_items, LineItem};
use crate::types::EntityKind;
use crate::validation::{require_text, DATE_FORMAT};

/// What the counter asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    Accept,
    Reject,
    Negotiate,
}

impl ResponseAction {
    fn quotation_action(self) -> QuotationAction {
        match self {
            ResponseAction::Accept => QuotationAction::Accept,
            ResponseAction::Reject => QuotationAction::Reject,
            ResponseAction::Negotiate => QuotationAction::Negotiate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterStatus {
    Pending,
    Accepted,
    Rejected,
}

impl CounterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterStatus::Pending => "pending",
            CounterStatus::Accepted => "accepted",
            CounterStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for CounterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    Accept,
    Reject,
    Supersede,
}

impl std::fmt::Display for CounterAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CounterAction::Accept => "accept",
            CounterAction::Reject => "reject",
            CounterAction::Supersede => "supersede",
        })
    }
}

impl Lifecycle for CounterStatus {
    type Action = CounterAction;

    const ENTITY: EntityKind = EntityKind::CounterQuotation;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (CounterStatus::Pending, CounterAction::Accept, CounterStatus::Accepted),
        (CounterStatus::Pending, CounterAction::Reject, CounterStatus::Rejected),
        (CounterStatus::Pending, CounterAction::Supersede, CounterStatus::Rejected),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterQuotation {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub vendor_id: Uuid,
    pub action: ResponseAction,
    /// Proposed lines; empty unless `action` is `negotiate`
    pub items: Vec<LineItem>,
    pub valid_till: NaiveDate,
    pub expected_delivery_date: NaiveDate,
    pub advance_payment_percent: Decimal,
    pub rejection_reason: Option<String>,
    pub negotiation_notes: Option<String>,
    pub total_amount: Decimal,
    pub status: CounterStatus,
    pub filed_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterInput {
    pub action: ResponseAction,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub valid_till: Option<String>,
    pub expected_delivery_date: Option<String>,
    pub advance_payment_percent: Option<Decimal>,
    pub rejection_reason: Option<String>,
    pub negotiation_notes: Option<String>,
}

/// The vendor's answer to a pending negotiation counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterDecision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveCounterInput {
    pub decision: CounterDecision,
    pub rejection_reason: Option<String>,
}

/// Documents written by filing a counter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterFiling {
    pub quotation: Quotation,
    pub counter: CounterQuotation,
    /// The previously pending counter, now rejected
    pub superseded: Option<CounterQuotation>,
    /// Present when the enquiry changed status
    pub enquiry: Option<Enquiry>,
}

/// Documents written by resolving a counter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterResolution {
    pub quotation: Quotation,
    pub counter: CounterQuotation,
    pub enquiry: Option<Enquiry>,
}

impl Quotation {
    /// File an accept, reject or negotiate response against this quotation
    pub fn file_counter(
        &self,
        enquiry: &Enquiry,
        outstanding: Option<&CounterQuotation>,
        filed_by: Uuid,
        input: CounterInput,
        now: DateTime<Utc>,
    ) -> WorkflowResult<CounterFiling> {
        let mut quotation = self.apply(input.action.quotation_action(), now)?;

        let mut counter = CounterQuotation {
            id: Uuid::new_v4(),
            quotation_id: self.id,
            vendor_id: self.vendor_id,
            action: input.action,
            items: Vec::new(),
            valid_till: self.valid_till,
            expected_delivery_date: self.expected_delivery_date,
            advance_payment_percent: self.advance_payment_percent,
            rejection_reason: None,
            negotiation_notes: None,
            total_amount: self.total_amount,
            status: CounterStatus::Pending,
            filed_by,
            created_at: now,
            updated_at: now,
        };

        match input.action {
            ResponseAction::Accept => {
                counter.status = CounterStatus::Accepted;
            }
            ResponseAction::Reject => {
                let reason = require_text("rejectionReason", input.rejection_reason.as_deref())?;
                quotation.rejection_reason = Some(reason.clone());
                counter.rejection_reason = Some(reason);
                counter.status = CounterStatus::Rejected;
            }
            ResponseAction::Negotiate => {
                validate_line_items("items", &input.items)?;
                counter.negotiation_notes = Some(require_text(
                    "negotiationNotes",
                    input.negotiation_notes.as_deref(),
                )?);

                let valid_till = input
                    .valid_till
                    .unwrap_or_else(|| self.valid_till.format(DATE_FORMAT).to_string());
                let expected = input
                    .expected_delivery_date
                    .unwrap_or_else(|| self.expected_delivery_date.format(DATE_FORMAT).to_string());
                let terms = validate_terms(
                    &valid_till,
                    &expected,
                    input
                        .advance_payment_percent
                        .unwrap_or(self.advance_payment_percent),
                    now.date_naive(),
                )?;

                counter.total_amount = compute_totals(&input.items)?.total_amount;
                counter.items = input.items;
                counter.valid_till = terms.valid_till;
                counter.expected_delivery_date = terms.expected_delivery_date;
                counter.advance_payment_percent = terms.advance_payment_percent;
            }
        }

        let superseded = match outstanding {
            Some(previous) if previous.status == CounterStatus::Pending => {
                Some(previous.supersede(counter.id, now)?)
            }
            _ => None,
        };

        let enquiry = match input.action {
            ResponseAction::Accept => Some(accept_enquiry(enquiry, now)?),
            _ => None,
        };

        Ok(CounterFiling {
            quotation,
            counter,
            superseded,
            enquiry,
        })
    }
}

impl CounterQuotation {
    fn supersede(&self, by: Uuid, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, CounterAction::Supersede)?;
        Ok(Self {
            status,
            rejection_reason: Some(format!("superseded by {}", by)),
            updated_at: now,
            ..self.clone()
        })
    }

    /// Vendor accepts or rejects a pending negotiation; the outcome
    /// propagates to the parent quotation.
    pub fn resolve(
        &self,
        quotation: &Quotation,
        enquiry: &Enquiry,
        input: ResolveCounterInput,
        now: DateTime<Utc>,
    ) -> WorkflowResult<CounterResolution> {
        if self.quotation_id != quotation.id {
            return Err(WorkflowError::validation(
                "quotationId",
                "counter does not belong to this quotation",
            ));
        }

        match input.decision {
            CounterDecision::Accept => {
                let status = transition(self.id, self.status, CounterAction::Accept)?;
                let mut accepted = quotation.apply(QuotationAction::Accept, now)?;
                accepted.accepted_counter_id = Some(self.id);
                Ok(CounterResolution {
                    quotation: accepted,
                    counter: Self {
                        status,
                        updated_at: now,
                        ..self.clone()
                    },
                    enquiry: Some(accept_enquiry(enquiry, now)?),
                })
            }
            CounterDecision::Reject => {
                let reason = require_text("rejectionReason", input.rejection_reason.as_deref())?;
                let status = transition(self.id, self.status, CounterAction::Reject)?;
                let mut rejected = quotation.apply(QuotationAction::Reject, now)?;
                rejected.rejection_reason = Some(reason.clone());
                Ok(CounterResolution {
                    quotation: rejected,
                    counter: Self {
                        status,
                        rejection_reason: Some(reason),
                        updated_at: now,
                        ..self.clone()
                    },
                    enquiry: None,
                })
            }
        }
    }
}

impl Document for CounterQuotation {
    const KIND: EntityKind = EntityKind::CounterQuotation;

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
}
