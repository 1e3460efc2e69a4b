//! Vendor quotations against an enquiry

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::component::{Component, ComponentStatus};
use super::enquiry::{Enquiry, EnquiryAction, EnquiryStatus};
use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::lifecycle::{transition, Lifecycle};
use crate::money::{compute_totals, validate_line_items, LineItem};
use crate::types::EntityKind;
use crate::validation::{parse_calendar_date, parse_delivery_date, validate_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Sent,
    Negotiating,
    Accepted,
    Rejected,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Sent => "sent",
            QuotationStatus::Negotiating => "negotiating",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Rejected => "rejected",
        }
    }

    /// Still awaiting a decision
    pub fn is_open(&self) -> bool {
        matches!(self, QuotationStatus::Sent | QuotationStatus::Negotiating)
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotationAction {
    Negotiate,
    Accept,
    Reject,
}

impl std::fmt::Display for QuotationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QuotationAction::Negotiate => "negotiate",
            QuotationAction::Accept => "accept",
            QuotationAction::Reject => "reject",
        })
    }
}

impl Lifecycle for QuotationStatus {
    type Action = QuotationAction;

    const ENTITY: EntityKind = EntityKind::Quotation;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (QuotationStatus::Sent, QuotationAction::Negotiate, QuotationStatus::Negotiating),
        (QuotationStatus::Negotiating, QuotationAction::Negotiate, QuotationStatus::Negotiating),
        (QuotationStatus::Sent, QuotationAction::Accept, QuotationStatus::Accepted),
        (QuotationStatus::Negotiating, QuotationAction::Accept, QuotationStatus::Accepted),
        (QuotationStatus::Sent, QuotationAction::Reject, QuotationStatus::Rejected),
        (QuotationStatus::Negotiating, QuotationAction::Reject, QuotationStatus::Rejected),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,
    pub enquiry_id: Uuid,
    pub vendor_id: Uuid,
    /// Price and tax snapshot taken at quotation time
    pub items: Vec<LineItem>,
    pub valid_till: NaiveDate,
    pub expected_delivery_date: NaiveDate,
    pub advance_payment_percent: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub status: QuotationStatus,
    /// Set when acceptance came through a negotiated counter; its terms govern
    pub accepted_counter_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A quoted line. Omitted prices, taxes and discount fall back to the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedItem {
    pub component_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub cgst_percent: Option<Decimal>,
    pub sgst_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuotation {
    pub enquiry_id: Uuid,
    pub items: Vec<QuotedItem>,
    pub valid_till: String,
    pub expected_delivery_date: String,
    #[serde(default)]
    pub advance_payment_percent: Decimal,
    pub notes: Option<String>,
}

/// Everything `Quotation::create` reads besides its input
pub struct QuotationContext<'a> {
    pub enquiry: &'a Enquiry,
    /// Catalog entries for the quoted components
    pub catalog: &'a [Component],
    /// Quotations already filed against the enquiry
    pub existing: &'a [Quotation],
}

/// Validated commercial terms shared by quotations and counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Terms {
    pub valid_till: NaiveDate,
    pub expected_delivery_date: NaiveDate,
    pub advance_payment_percent: Decimal,
}

pub(crate) fn validate_terms(
    valid_till: &str,
    expected_delivery_date: &str,
    advance_payment_percent: Decimal,
    today: NaiveDate,
) -> WorkflowResult<Terms> {
    validate_percent("advancePaymentPercent", advance_payment_percent)?;
    Ok(Terms {
        valid_till: parse_calendar_date("validTill", valid_till)?,
        expected_delivery_date: parse_delivery_date(
            "expectedDeliveryDate",
            expected_delivery_date,
            today,
        )?,
        advance_payment_percent,
    })
}

fn price_items(
    vendor_id: Uuid,
    items: &[QuotedItem],
    catalog: &[Component],
) -> WorkflowResult<Vec<LineItem>> {
    items
        .iter()
        .map(|item| {
            let component = catalog
                .iter()
                .find(|c| c.id == item.component_id)
                .ok_or_else(|| WorkflowError::not_found(EntityKind::Component, item.component_id))?;

            if component.vendor_id != vendor_id {
                return Err(WorkflowError::validation(
                    "items",
                    format!("component {} belongs to another vendor", component.id),
                ));
            }
            if component.status != ComponentStatus::Approved {
                return Err(WorkflowError::precondition(
                    EntityKind::Component,
                    component.id,
                    ComponentStatus::Approved.as_str(),
                    component.status.as_str(),
                ));
            }

            Ok(LineItem {
                component_id: component.id,
                quantity: item.quantity,
                unit_price: item.unit_price.unwrap_or(component.price_per_unit),
                discount_percent: item.discount_percent.unwrap_or(component.discount_percent),
                cgst_percent: item.cgst_percent.unwrap_or(component.cgst_percent),
                sgst_percent: item.sgst_percent.unwrap_or(component.sgst_percent),
            })
        })
        .collect()
}

pub fn open_quotation_key(enquiry_id: Uuid) -> String {
    format!("quotation-open:{}", enquiry_id)
}

impl Quotation {
    /// Quote against an enquiry; returns the quotation and the enquiry marked `quoted`
    pub fn create(
        vendor_id: Uuid,
        ctx: QuotationContext<'_>,
        input: NewQuotation,
        now: DateTime<Utc>,
    ) -> WorkflowResult<(Self, Enquiry)> {
        let enquiry = ctx.enquiry;
        if !enquiry.status.allows(EnquiryAction::Quote) {
            return Err(WorkflowError::precondition(
                EntityKind::Enquiry,
                enquiry.id,
                "raised or quoted",
                enquiry.status.as_str(),
            ));
        }
        if let Some(open) = ctx
            .existing
            .iter()
            .find(|q| q.enquiry_id == enquiry.id && q.status.is_open())
        {
            return Err(WorkflowError::conflict(
                EntityKind::Quotation,
                Some(open.id),
                format!("quotation {} on this enquiry is still {}", open.id, open.status),
            ));
        }

        if input.items.is_empty() {
            return Err(WorkflowError::validation("items", "At least one line item is required"));
        }
        let items = price_items(vendor_id, &input.items, ctx.catalog)?;
        validate_line_items("items", &items)?;
        let terms = validate_terms(
            &input.valid_till,
            &input.expected_delivery_date,
            input.advance_payment_percent,
            now.date_naive(),
        )?;

        let total_amount = compute_totals(&items)?.total_amount;
        let quotation = Self {
            id: Uuid::new_v4(),
            enquiry_id: enquiry.id,
            vendor_id,
            items,
            valid_till: terms.valid_till,
            expected_delivery_date: terms.expected_delivery_date,
            advance_payment_percent: terms.advance_payment_percent,
            total_amount,
            notes: input.notes,
            status: QuotationStatus::Sent,
            accepted_counter_id: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let enquiry = enquiry.mark_quoted(now)?;
        Ok((quotation, enquiry))
    }

    /// Move the quotation along its table; a repeated acceptance is a conflict
    pub(crate) fn apply(&self, action: QuotationAction, now: DateTime<Utc>) -> WorkflowResult<Self> {
        if self.status == QuotationStatus::Accepted && action == QuotationAction::Accept {
            return Err(WorkflowError::conflict(
                EntityKind::Quotation,
                Some(self.id),
                "quotation has already been accepted",
            ));
        }
        let status = transition(self.id, self.status, action)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn recomputed_total(&self) -> WorkflowResult<Decimal> {
        Ok(compute_totals(&self.items)?.total_amount)
    }
}

/// The enquiry follows its quotation into `accepted`
pub(crate) fn accept_enquiry(enquiry: &Enquiry, now: DateTime<Utc>) -> WorkflowResult<Enquiry> {
    if enquiry.status == EnquiryStatus::Accepted {
        return Ok(enquiry.clone());
    }
    enquiry.mark_accepted(now)
}

impl Document for Quotation {
    const KIND: EntityKind = EntityKind::Quotation;

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
        Some(self.enquiry_id)
    }

    /// One open quotation per enquiry; a decided quotation frees the slot
    fn unique_key(&self) -> Option<String> {
        self.status.is_open().then(|| open_quotation_key(self.enquiry_id))
    }
}
