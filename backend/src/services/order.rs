//! Orders: confirmation from an LOI through completion

use chrono::Utc;
use shared::{Actor, ConfirmOrder, Invoice, Loi, Order};
use tracing::info;
use uuid::Uuid;

use super::{changed, created, ListParams, Workflow};
use crate::error::AppResult;
use crate::middleware::auth::{require_purchasing_manager, require_vendor};
use crate::store::{DocumentFilter, UnitOfWork};

#[derive(Clone)]
pub struct OrderService {
    flow: Workflow,
}

impl OrderService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    /// Create the order and confirm the LOI in one commit
    pub async fn confirm_from_loi(&self, actor: &Actor, loi_id: Uuid, input: ConfirmOrder) -> AppResult<Order> {
        require_purchasing_manager(actor)?;
        let loi: Loi = self.flow.repo.get(loi_id).await?;
        let existing: Vec<Order> = self.flow.repo.list(&DocumentFilter::by_parent(loi_id)).await?;

        let (order, confirmed) =
            Order::confirm_from_loi(&loi, existing.first(), actor.user_id, input, Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().insert(&order)?.update(&loi, &confirmed)?)
            .await?;
        info!(
            "Order {} created from LOI {} (advance {})",
            order.id, loi_id, order.advance_amount
        );
        self.flow.events.publish(vec![
            created("confirm_from_loi", &order, actor),
            changed("confirm", &loi, &confirmed, actor),
        ]);
        Ok(order)
    }

    pub async fn acknowledge(&self, actor: &Actor, id: Uuid) -> AppResult<Order> {
        require_vendor(actor)?;
        let current: Order = self.flow.visible(actor, id).await?;
        let confirmed = current.acknowledge(Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &confirmed)?)
            .await?;
        info!("Order {} acknowledged by vendor {}", id, current.vendor_id);
        self.flow
            .events
            .publish(vec![changed("acknowledge", &current, &confirmed, actor)]);
        Ok(confirmed)
    }

    pub async fn complete(&self, actor: &Actor, id: Uuid) -> AppResult<Order> {
        require_purchasing_manager(actor)?;
        let current: Order = self.flow.repo.get(id).await?;
        let invoices: Vec<Invoice> = self.flow.repo.list(&DocumentFilter::by_parent(id)).await?;
        let invoice = invoices.iter().find(|i| i.status.is_open());

        let completed = current.complete(invoice, Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &completed)?)
            .await?;
        info!("Order {} completed", id);
        self.flow
            .events
            .publish(vec![changed("complete", &current, &completed, actor)]);
        Ok(completed)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Order> {
        self.flow.visible(actor, id).await
    }

    pub async fn list(&self, actor: &Actor, params: &ListParams) -> AppResult<Vec<Order>> {
        self.flow.list(actor, params).await
    }
}
