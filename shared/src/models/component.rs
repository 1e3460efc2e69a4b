//! Catalog components and their approval lifecycle

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::document::Document;
use crate::error::{WorkflowError, WorkflowResult};
use crate::lifecycle::{transition, Lifecycle};
use crate::types::EntityKind;
use crate::validation::{
    not_blank, require_text, validate_input, validate_non_negative, validate_percent,
    validate_positive,
};

/// Approval status of a catalog component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Pending,
    Approved,
    Rejected,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Pending => "pending",
            ComponentStatus::Approved => "approved",
            ComponentStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentAction {
    Edit,
    Resubmit,
    Approve,
    Reject,
}

impl std::fmt::Display for ComponentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ComponentAction::Edit => "edit",
            ComponentAction::Resubmit => "resubmit",
            ComponentAction::Approve => "approve",
            ComponentAction::Reject => "reject",
        })
    }
}

impl Lifecycle for ComponentStatus {
    type Action = ComponentAction;

    const ENTITY: EntityKind = EntityKind::Component;
    const TABLE: &'static [(Self, Self::Action, Self)] = &[
        (ComponentStatus::Pending, ComponentAction::Edit, ComponentStatus::Pending),
        (ComponentStatus::Approved, ComponentAction::Edit, ComponentStatus::Approved),
        (ComponentStatus::Rejected, ComponentAction::Resubmit, ComponentStatus::Pending),
        (ComponentStatus::Pending, ComponentAction::Approve, ComponentStatus::Approved),
        (ComponentStatus::Pending, ComponentAction::Reject, ComponentStatus::Rejected),
    ];
}

/// A vendor-submitted catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measurement: String,
    pub price_per_unit: Decimal,
    pub cgst_percent: Decimal,
    pub sgst_percent: Decimal,
    pub discount_percent: Decimal,
    pub stock: Decimal,
    pub min_order_qty: Decimal,
    pub lead_time_days: u32,
    pub status: ComponentStatus,
    pub rejection_reason: Option<String>,
    pub submission_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for submitting a component
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComponent {
    #[validate(custom = "not_blank", length(max = 64))]
    pub code: String,
    #[validate(custom = "not_blank", length(max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "not_blank")]
    pub unit_of_measurement: String,
    pub price_per_unit: Decimal,
    #[serde(default)]
    pub cgst_percent: Decimal,
    #[serde(default)]
    pub sgst_percent: Decimal,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub stock: Decimal,
    #[serde(default)]
    pub min_order_qty: Decimal,
    #[serde(default)]
    pub lead_time_days: u32,
}

/// Partial update of a component
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPatch {
    #[validate(custom = "not_blank", length(max = 64))]
    pub code: Option<String>,
    #[validate(custom = "not_blank", length(max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "not_blank")]
    pub unit_of_measurement: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub cgst_percent: Option<Decimal>,
    pub sgst_percent: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub stock: Option<Decimal>,
    pub min_order_qty: Option<Decimal>,
    pub lead_time_days: Option<u32>,
}

impl ComponentPatch {
    /// True when the patch touches a field frozen by approval
    fn touches_identity(&self) -> bool {
        self.code.is_some() || self.name.is_some() || self.unit_of_measurement.is_some()
    }
}

/// Result of an edit; `resubmitted` is set when a rejected component went back to review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEdit {
    pub component: Component,
    pub resubmitted: bool,
}

fn validate_commercials(
    price_per_unit: Decimal,
    cgst_percent: Decimal,
    sgst_percent: Decimal,
    discount_percent: Decimal,
    stock: Decimal,
    min_order_qty: Decimal,
) -> WorkflowResult<()> {
    validate_positive("pricePerUnit", price_per_unit)?;
    validate_non_negative("cgstPercent", cgst_percent)?;
    validate_non_negative("sgstPercent", sgst_percent)?;
    validate_percent("discountPercent", discount_percent)?;
    validate_non_negative("stock", stock)?;
    validate_non_negative("minOrderQty", min_order_qty)?;
    Ok(())
}

impl Component {
    /// Create a component in `pending` with its first submission
    pub fn submit(vendor_id: Uuid, input: NewComponent, now: DateTime<Utc>) -> WorkflowResult<Self> {
        validate_input(&input)?;
        validate_commercials(
            input.price_per_unit,
            input.cgst_percent,
            input.sgst_percent,
            input.discount_percent,
            input.stock,
            input.min_order_qty,
        )?;

        Ok(Self {
            id: Uuid::new_v4(),
            vendor_id,
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            unit_of_measurement: input.unit_of_measurement.trim().to_string(),
            price_per_unit: input.price_per_unit,
            cgst_percent: input.cgst_percent,
            sgst_percent: input.sgst_percent,
            discount_percent: input.discount_percent,
            stock: input.stock,
            min_order_qty: input.min_order_qty,
            lead_time_days: input.lead_time_days,
            status: ComponentStatus::Pending,
            rejection_reason: None,
            submission_count: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a vendor edit. Editing a rejected component resubmits it.
    pub fn edit(&self, patch: ComponentPatch, now: DateTime<Utc>) -> WorkflowResult<ComponentEdit> {
        validate_input(&patch)?;

        let resubmitted = self.status == ComponentStatus::Rejected;
        let action = if resubmitted {
            ComponentAction::Resubmit
        } else {
            ComponentAction::Edit
        };
        let status = transition(self.id, self.status, action)?;

        if self.status == ComponentStatus::Approved && patch.touches_identity() {
            return Err(WorkflowError::InvalidState {
                entity: EntityKind::Component,
                id: self.id,
                current: self.status.to_string(),
                action: "change code, name or unit of an approved component".to_string(),
            });
        }

        let mut next = self.clone();
        if let Some(code) = patch.code {
            next.code = code.trim().to_string();
        }
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(unit) = patch.unit_of_measurement {
            next.unit_of_measurement = unit.trim().to_string();
        }
        if patch.description.is_some() {
            next.description = patch.description;
        }
        next.price_per_unit = patch.price_per_unit.unwrap_or(next.price_per_unit);
        next.cgst_percent = patch.cgst_percent.unwrap_or(next.cgst_percent);
        next.sgst_percent = patch.sgst_percent.unwrap_or(next.sgst_percent);
        next.discount_percent = patch.discount_percent.unwrap_or(next.discount_percent);
        next.stock = patch.stock.unwrap_or(next.stock);
        next.min_order_qty = patch.min_order_qty.unwrap_or(next.min_order_qty);
        next.lead_time_days = patch.lead_time_days.unwrap_or(next.lead_time_days);

        validate_commercials(
            next.price_per_unit,
            next.cgst_percent,
            next.sgst_percent,
            next.discount_percent,
            next.stock,
            next.min_order_qty,
        )?;

        next.status = status;
        if resubmitted {
            next.rejection_reason = None;
            next.submission_count += 1;
        }
        next.updated_at = now;

        Ok(ComponentEdit {
            component: next,
            resubmitted,
        })
    }

    pub fn approve(&self, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let status = transition(self.id, self.status, ComponentAction::Approve)?;
        Ok(Self {
            status,
            rejection_reason: None,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Reject with a mandatory reason
    pub fn reject(&self, reason: Option<&str>, now: DateTime<Utc>) -> WorkflowResult<Self> {
        let reason = require_text("rejectionReason", reason)?;
        let status = transition(self.id, self.status, ComponentAction::Reject)?;
        Ok(Self {
            status,
            rejection_reason: Some(reason),
            updated_at: now,
            ..self.clone()
        })
    }
}

impl Document for Component {
    const KIND: EntityKind = EntityKind::Component;

    fn id(&self) -> Uuid {
        self.id
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn vendor_id(&self) -> Uuid {
        self.vendor_id
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!(
            "component:{}:{}",
            self.vendor_id,
            self.code.to_lowercase()
        ))
    }
}
