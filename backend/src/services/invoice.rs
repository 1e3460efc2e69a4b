//! Invoice lifecycle

use chrono::Utc;
use shared::{Actor, Invoice, NewInvoice, Order, PaidFlagMismatch, PaidInvoice, Payment};
use tracing::{info, warn};
use uuid::Uuid;

use super::component::RejectInput;
use super::{changed, created, ListParams, Workflow};
use crate::error::AppResult;
use crate::middleware::auth::{require_purchasing_manager, require_vendor};
use crate::store::{DocumentFilter, UnitOfWork};

#[derive(Clone)]
pub struct InvoiceService {
    flow: Workflow,
}

impl InvoiceService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    /// Vendor invoices a confirmed order
    pub async fn create(&self, actor: &Actor, input: NewInvoice) -> AppResult<Invoice> {
        require_vendor(actor)?;
        let order: Order = self.flow.visible(actor, input.order_id).await?;
        let existing: Vec<Invoice> = self.flow.repo.list(&DocumentFilter::by_parent(order.id)).await?;

        let invoice = Invoice::create(&order, &existing, actor.user_id, input, Utc::now())?;

        self.flow.repo.commit(UnitOfWork::new().insert(&invoice)?).await?;
        info!(
            "Invoice {} raised for order {} (total {})",
            invoice.invoice_number, order.id, invoice.total_amount
        );
        self.flow
            .events
            .publish(vec![created("create", &invoice, actor)]);
        Ok(invoice)
    }

    async fn step(
        &self,
        actor: &Actor,
        id: Uuid,
        action: &str,
        apply: impl FnOnce(&Invoice) -> shared::WorkflowResult<Invoice>,
    ) -> AppResult<Invoice> {
        require_purchasing_manager(actor)?;
        let current: Invoice = self.flow.repo.get(id).await?;
        let next = apply(&current)?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &next)?)
            .await?;
        info!("Invoice {} {} -> {}", id, current.status, next.status);
        self.flow
            .events
            .publish(vec![changed(action, &current, &next, actor)]);
        Ok(next)
    }

    pub async fn mark_received(&self, actor: &Actor, id: Uuid) -> AppResult<Invoice> {
        self.step(actor, id, "receive", |i| i.mark_received(Utc::now()))
            .await
    }

    pub async fn accept(&self, actor: &Actor, id: Uuid) -> AppResult<Invoice> {
        self.step(actor, id, "accept", |i| i.accept(Utc::now())).await
    }

    pub async fn reject(&self, actor: &Actor, id: Uuid, input: RejectInput) -> AppResult<Invoice> {
        self.step(actor, id, "reject", |i| {
            i.reject(input.rejection_reason.as_deref(), Utc::now())
        })
        .await
    }

    /// Manual paid flag; the ledger is reported alongside and any
    /// disagreement is logged, not corrected
    pub async fn mark_paid(&self, actor: &Actor, id: Uuid) -> AppResult<PaidInvoice> {
        require_purchasing_manager(actor)?;
        let current: Invoice = self.flow.repo.get(id).await?;
        let order: Order = self.flow.repo.get(current.order_id).await?;
        let payments: Vec<Payment> = self.flow.repo.list(&DocumentFilter::by_parent(order.id)).await?;

        let paid = current.mark_paid(&order, &payments, Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &paid.invoice)?)
            .await?;
        match &paid.mismatch {
            Some(PaidFlagMismatch::MarkedPaidWithBalance { pending }) => warn!(
                "Invoice {} marked paid but payments leave {} pending on order {}",
                id, pending, order.id
            ),
            Some(PaidFlagMismatch::SettledButNotMarkedPaid) => {
                warn!("Invoice {} paid flag disagrees with the payment log", id)
            }
            None => info!("Invoice {} marked paid; ledger settled", id),
        }
        self.flow
            .events
            .publish(vec![changed("mark_paid", &current, &paid.invoice, actor)]);
        Ok(paid)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Invoice> {
        self.flow.visible(actor, id).await
    }

    pub async fn list(&self, actor: &Actor, params: &ListParams) -> AppResult<Vec<Invoice>> {
        self.flow.list(actor, params).await
    }
}
