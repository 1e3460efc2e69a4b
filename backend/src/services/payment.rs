//! Payment tracking against an order

use chrono::Utc;
use serde::Deserialize;
use shared::{
    summarize, Actor, CompletePayment, Invoice, NewPayment, Order, Payment, Standing, WorkflowResult,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{changed, created, Workflow};
use crate::error::AppResult;
use crate::middleware::auth::require_purchasing_manager;
use crate::store::{DocumentFilter, UnitOfWork};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailPaymentInput {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptInput {
    pub reference_number: Option<String>,
}

#[derive(Clone)]
pub struct PaymentService {
    flow: Workflow,
}

impl PaymentService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    /// Log a payment; over-payment is allowed and reported
    pub async fn record(&self, actor: &Actor, order_id: Uuid, input: NewPayment) -> AppResult<Payment> {
        require_purchasing_manager(actor)?;
        let order: Order = self.flow.repo.get(order_id).await?;
        let payment = Payment::record(&order, actor.user_id, input, Utc::now())?;

        self.flow.repo.commit(UnitOfWork::new().insert(&payment)?).await?;
        info!(
            "Payment {} of {} ({}) recorded on order {}",
            payment.id,
            payment.amount,
            payment.phase.as_str(),
            order_id
        );
        // The payment is committed; a failed follow-up read must not fail the request
        if let Err(e) = self.warn_if_overpaid(&order).await {
            warn!("Could not check order {} for over-payment: {}", order_id, e);
        }
        self.flow
            .events
            .publish(vec![created("record", &payment, actor)]);
        Ok(payment)
    }

    async fn warn_if_overpaid(&self, order: &Order) -> AppResult<()> {
        let invoices: Vec<Invoice> = self.flow.repo.list(&DocumentFilter::by_parent(order.id)).await?;
        let payments: Vec<Payment> = self.flow.repo.list(&DocumentFilter::by_parent(order.id)).await?;
        let summary = summarize(order, &invoices, &payments);
        if summary.standing == Standing::Overpaid {
            warn!(
                "Order {} is overpaid by {} against {} {}",
                order.id,
                summary.surplus,
                summary.basis.as_str(),
                summary.amount_due
            );
        }
        Ok(())
    }

    async fn step(
        &self,
        actor: &Actor,
        id: Uuid,
        action: &str,
        apply: impl FnOnce(&Payment) -> WorkflowResult<Payment>,
    ) -> AppResult<Payment> {
        require_purchasing_manager(actor)?;
        let current: Payment = self.flow.repo.get(id).await?;
        let next = apply(&current)?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &next)?)
            .await?;
        info!("Payment {} {} -> {}", id, current.status, next.status);
        self.flow
            .events
            .publish(vec![changed(action, &current, &next, actor)]);
        Ok(next)
    }

    pub async fn complete(&self, actor: &Actor, id: Uuid, input: CompletePayment) -> AppResult<Payment> {
        self.step(actor, id, "complete", |p| p.complete(input, Utc::now()))
            .await
    }

    pub async fn fail(&self, actor: &Actor, id: Uuid, input: FailPaymentInput) -> AppResult<Payment> {
        self.step(actor, id, "fail", |p| p.fail(input.reason.as_deref(), Utc::now()))
            .await
    }

    pub async fn send_receipt(&self, actor: &Actor, id: Uuid, input: ReceiptInput) -> AppResult<Payment> {
        self.step(actor, id, "send_receipt", |p| {
            p.send_receipt(input.reference_number.as_deref(), Utc::now())
        })
        .await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Payment> {
        self.flow.visible(actor, id).await
    }

    pub async fn list_for_order(&self, actor: &Actor, order_id: Uuid) -> AppResult<Vec<Payment>> {
        let _: Order = self.flow.visible(actor, order_id).await?;
        self.flow.repo.list(&DocumentFilter::by_parent(order_id)).await
    }
}
