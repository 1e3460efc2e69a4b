//! Enquiries raised by the purchasing side

use chrono::Utc;
use shared::{Actor, Component, EntityKind, Enquiry, EnquiryPatch, NewEnquiry, Quotation, WorkflowError};
use tracing::info;
use uuid::Uuid;

use super::component::RejectInput;
use super::{changed, created, removed, ListParams, Workflow};
use crate::error::AppResult;
use crate::middleware::auth::{require_purchasing_manager, require_vendor};
use crate::store::{DocumentFilter, UnitOfWork};

#[derive(Clone)]
pub struct EnquiryService {
    flow: Workflow,
}

impl EnquiryService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    /// Every requested component must exist in the addressed vendor's catalog
    async fn check_components(&self, enquiry: &Enquiry) -> AppResult<()> {
        for (index, component_id) in enquiry.component_ids().enumerate() {
            let component: Component = self
                .flow
                .repo
                .find(component_id)
                .await?
                .ok_or_else(|| WorkflowError::not_found(EntityKind::Component, component_id))?;
            if component.vendor_id != enquiry.vendor_id {
                return Err(WorkflowError::validation(
                    format!("items[{}].componentId", index),
                    "component is not offered by this vendor",
                )
                .into());
            }
        }
        Ok(())
    }

    pub async fn create(&self, actor: &Actor, input: NewEnquiry) -> AppResult<Enquiry> {
        require_purchasing_manager(actor)?;
        let enquiry = Enquiry::create(actor.user_id, input, Utc::now())?;
        self.check_components(&enquiry).await?;

        self.flow
            .repo
            .commit(UnitOfWork::new().insert(&enquiry)?)
            .await?;
        info!("Enquiry {} raised for vendor {}", enquiry.id, enquiry.vendor_id);
        self.flow
            .events
            .publish(vec![created("create", &enquiry, actor)]);
        Ok(enquiry)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, patch: EnquiryPatch) -> AppResult<Enquiry> {
        require_purchasing_manager(actor)?;
        let current: Enquiry = self.flow.repo.get(id).await?;
        let updated = current.update(patch, Utc::now())?;
        self.check_components(&updated).await?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &updated)?)
            .await?;
        self.flow
            .events
            .publish(vec![changed("update", &current, &updated, actor)]);
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        require_purchasing_manager(actor)?;
        let current: Enquiry = self.flow.repo.get(id).await?;
        let quotations: Vec<Quotation> = self.flow.repo.list(&DocumentFilter::by_parent(id)).await?;
        current.ensure_deletable(quotations.len())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().delete(&current))
            .await?;
        info!("Enquiry {} deleted", id);
        self.flow
            .events
            .publish(vec![removed("delete", &current, actor)]);
        Ok(())
    }

    /// The addressed vendor declines the enquiry
    pub async fn reject(&self, actor: &Actor, id: Uuid, input: RejectInput) -> AppResult<Enquiry> {
        require_vendor(actor)?;
        let current: Enquiry = self.flow.visible(actor, id).await?;
        let rejected = current.reject(input.rejection_reason.as_deref(), Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &rejected)?)
            .await?;
        info!("Enquiry {} rejected by vendor {}", id, current.vendor_id);
        self.flow
            .events
            .publish(vec![changed("reject", &current, &rejected, actor)]);
        Ok(rejected)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Enquiry> {
        self.flow.visible(actor, id).await
    }

    pub async fn list(&self, actor: &Actor, params: &ListParams) -> AppResult<Vec<Enquiry>> {
        self.flow.list(actor, params).await
    }
}
