//! Buyer-side enquiries addressed to a vendor

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::lifecycle::{transition, Lifecycle};
use crate::types::EntityKind;
use crate::validation::{not_blank, parse_calendar_date, require_text, validate_input};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    Raised,
    Quoted,
    Accepted,
    Rejected,
}

impl EnquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnquiryStatus::Raised => "raised",
            EnquiryStatus::Quoted => "quoted",
            EnquiryStatus::Accepted => "accepted",
            EnquiryStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for EnquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnquiryAction {
    Update,
    Quote,
    Accept,
    Reject,
}

impl std::fmt::Display for EnquiryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EnquiryAction::Update => "update",
            EnquiryAction::Quote => "quote",
            EnquiryAction::Accept => "accept",
            EnquiryAction::Reject => "reject",
        })
    }
}

impl Lifecycle for EnquiryStatus {
    type Action = EnquiryAction;

    const ENTITY: EntityKind = EntityKind::Enquiry;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (EnquiryStatus::Raised, EnquiryAction::Update, EnquiryStatus::Raised),
        (EnquiryStatus::Quoted, EnquiryAction::Update, EnquiryStatus::Quoted),
        (EnquiryStatus::Raised, EnquiryAction::Quote, EnquiryStatus::Quoted),
        (EnquiryStatus::Quoted, EnquiryAction::Quote, EnquiryStatus::Quoted),
        (EnquiryStatus::Quoted, EnquiryAction::Accept, EnquiryStatus::Accepted),
        (EnquiryStatus::Raised, EnquiryAction::Reject, EnquiryStatus::Rejected),
        (EnquiryStatus::Quoted, EnquiryAction::Reject, EnquiryStatus::Rejected),
    ];
}

/// A requested line on an enquiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    pub component_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: Uuid,
    /// Vendor the enquiry is addressed to
    pub vendor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub items: Vec<RequestedItem>,
    pub required_delivery_date: NaiveDate,
    pub status: EnquiryStatus,
    pub rejection_reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEnquiry {
    pub vendor_id: Uuid,
    #[validate(custom = "not_blank", length(max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "At least one line item is required"))]
    pub items: Vec<RequestedItem>,
    pub required_delivery_date: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryPatch {
    #[validate(custom = "not_blank", length(max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "At least one line item is required"))]
    pub items: Option<Vec<RequestedItem>>,
    pub required_delivery_date: Option<String>,
}

fn validate_requested_items(items: &[RequestedItem]) -> WorkflowResult<()> {
    for (index, item) in items.iter().enumerate() {
        if item.quantity <= Decimal::ZERO {
            return Err(WorkflowError::validation(
                format!("items[{}].quantity", index),
                "Quantity must be greater than 0",
            ));
        }
        if item.unit.trim().is_empty() {
            return Err(WorkflowError::validation(
                format!("items[{}].unit", index),
                "is required",
            ));
        }
    }
    Ok(())
}

impl Enquiry {
    /// Raise an enquiry. Component existence is checked by the caller,
    /// which holds the catalog.
    pub fn create(created_by: Uuid, input: NewEnquiry, now: DateTime<Utc>) -> WorkflowResult<Self> {
        validate_input(&input)?;
        validate_requested_items(&input.items)?;
        let required_delivery_date =
            parse_calendar_date("requiredDeliveryDate", &input.required_delivery_date)?;

        Ok(Self {
            id: Uuid::new_v4(),
            vendor_id: input.vendor_id,
            title: input.title.trim().to_string(),
            description: input.description,
            items: input.items,
            required_delivery_date,
            status: EnquiryStatus::Raised,
            rejection_reason: None,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&self, patch: EnquiryPatch, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, EnquiryAction::Update)?;
        validate_input(&patch)?;

        let mut next = self.clone();
        if let Some(title) = patch.title {
            next.title = title.trim().to_string();
        }
        if patch.description.is_some() {
            next.description = patch.description;
        }
        if let Some(items) = patch.items {
            validate_requested_items(&items)?;
            next.items = items;
        }
        if let Some(date) = patch.required_delivery_date {
            next.required_delivery_date = parse_calendar_date("requiredDeliveryDate", &date)?;
        }
        next.status = status;
        next.updated_at = now;
        Ok(next)
    }

    /// Vendor declines the enquiry
    pub fn reject(&self, reason: Option<&str>, now: DateTime<Utc>) -> WorkflowResult<Self> {
        if self.status == EnquiryStatus::Accepted {
            return Err(WorkflowError::conflict(
                EntityKind::Enquiry,
                Some(self.id),
                "enquiry already has an accepted quotation",
            ));
        }
        let reason = require_text("rejectionReason", reason)?;
        let status = transition(self.id, self.status, EnquiryAction::Reject)?;
        Ok(Self {
            status,
            rejection_reason: Some(reason),
            updated_at: now,
            ..self.clone()
        })
    }

    /// A quotation now references this enquiry
    pub fn mark_quoted(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, EnquiryAction::Quote)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    /// A quotation on this enquiry was accepted
    pub fn mark_accepted(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, EnquiryAction::Accept)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Deleting is refused once any quotation references the enquiry
    pub fn ensure_deletable(&self, quotation_count: usize) -> WorkflowResult<()> {
        if quotation_count > 0 {
            return Err(WorkflowError::conflict(
                EntityKind::Enquiry,
                Some(self.id),
                format!("{} quotation(s) reference this enquiry", quotation_count),
            ));
        }
        Ok(())
    }

    pub fn component_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.items.iter().map(|item| item.component_id)
    }
}

impl Document for Enquiry {
    const KIND: EntityKind = EntityKind::Enquiry;

    fn id(&self) -> Uuid {
        self.id
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn vendor_id(&self) -> Uuid {
        self.vendor_id
    }
}
