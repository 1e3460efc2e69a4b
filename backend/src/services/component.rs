//! Catalog component submission and approval

use chrono::Utc;
use shared::{Actor, Component, ComponentEdit, ComponentPatch, Document, NewComponent, WorkflowError};
use tracing::info;
use uuid::Uuid;

use super::{changed, created, ListParams, Workflow};
use crate::error::AppResult;
use crate::middleware::auth::{require_purchasing_manager, require_vendor};
use crate::store::{DocumentFilter, UnitOfWork};

/// Component service for the vendor catalog
#[derive(Clone)]
pub struct ComponentService {
    flow: Workflow,
}

/// Body of a rejection
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectInput {
    pub rejection_reason: Option<String>,
}

impl ComponentService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    async fn ensure_code_free(&self, component: &Component) -> AppResult<()> {
        let key = component.unique_key();
        let siblings: Vec<Component> = self
            .flow
            .repo
            .list(&DocumentFilter::default().vendor(Some(component.vendor_id)))
            .await?;
        if let Some(other) = siblings
            .iter()
            .find(|c| c.id != component.id && c.unique_key() == key)
        {
            return Err(WorkflowError::conflict(
                Component::KIND,
                Some(other.id),
                format!("component code '{}' is already in your catalog", component.code),
            )
            .into());
        }
        Ok(())
    }

    pub async fn submit(&self, actor: &Actor, input: NewComponent) -> AppResult<Component> {
        let vendor_id = require_vendor(actor)?;
        let component = Component::submit(vendor_id, input, Utc::now())?;
        self.ensure_code_free(&component).await?;

        self.flow
            .repo
            .commit(UnitOfWork::new().insert(&component)?)
            .await?;
        info!("Component {} ({}) submitted for approval", component.id, component.code);
        self.flow
            .events
            .publish(vec![created("submit", &component, actor)]);
        Ok(component)
    }

    /// Vendor edit; a rejected component goes back to review
    pub async fn edit(&self, actor: &Actor, id: Uuid, patch: ComponentPatch) -> AppResult<ComponentEdit> {
        require_vendor(actor)?;
        let current: Component = self.flow.visible(actor, id).await?;

        let edit = current.edit(patch, Utc::now())?;
        if edit.component.code != current.code {
            self.ensure_code_free(&edit.component).await?;
        }

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &edit.component)?)
            .await?;
        let action = if edit.resubmitted { "resubmit" } else { "edit" };
        if edit.resubmitted {
            info!(
                "Component {} resubmitted (submission {})",
                id, edit.component.submission_count
            );
        }
        self.flow
            .events
            .publish(vec![changed(action, &current, &edit.component, actor)]);
        Ok(edit)
    }

    pub async fn approve(&self, actor: &Actor, id: Uuid) -> AppResult<Component> {
        require_purchasing_manager(actor)?;
        let current: Component = self.flow.repo.get(id).await?;
        let approved = current.approve(Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &approved)?)
            .await?;
        info!("Component {} approved", id);
        self.flow
            .events
            .publish(vec![changed("approve", &current, &approved, actor)]);
        Ok(approved)
    }

    pub async fn reject(&self, actor: &Actor, id: Uuid, input: RejectInput) -> AppResult<Component> {
        require_purchasing_manager(actor)?;
        let current: Component = self.flow.repo.get(id).await?;
        let rejected = current.reject(input.rejection_reason.as_deref(), Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &rejected)?)
            .await?;
        info!("Component {} rejected", id);
        self.flow
            .events
            .publish(vec![changed("reject", &current, &rejected, actor)]);
        Ok(rejected)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Component> {
        self.flow.visible(actor, id).await
    }

    pub async fn list(&self, actor: &Actor, params: &ListParams) -> AppResult<Vec<Component>> {
        self.flow.list(actor, params).await
    }
}
