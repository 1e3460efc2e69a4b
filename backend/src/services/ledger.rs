//! Ledger views and the settlement report

use serde::Serialize;
use shared::{summarize, Actor, Invoice, LedgerSummary, Order, Payment};
use uuid::Uuid;

use super::{ListParams, Workflow};
use crate::error::{AppError, AppResult};
use crate::store::DocumentFilter;

/// One line of the settlement report
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub order_status: String,
    pub invoice_id: Option<Uuid>,
    pub invoice_status: Option<String>,
    pub basis: String,
    pub amount_due: String,
    pub paid_to_date: String,
    pub pending: String,
    pub surplus: String,
    pub standing: String,
}

impl LedgerRow {
    fn new(order: &Order, summary: &LedgerSummary) -> Self {
        Self {
            order_id: order.id,
            vendor_id: order.vendor_id,
            order_status: order.status.as_str().to_string(),
            invoice_id: summary.invoice_id,
            invoice_status: summary.invoice_status.map(|s| s.as_str().to_string()),
            basis: summary.basis.as_str().to_string(),
            amount_due: summary.amount_due.to_string(),
            paid_to_date: summary.paid_to_date.to_string(),
            pending: summary.pending.to_string(),
            surplus: summary.surplus.to_string(),
            standing: summary.standing.as_str().to_string(),
        }
    }
}

#[derive(Clone)]
pub struct LedgerService {
    flow: Workflow,
}

impl LedgerService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    async fn summarize_order(&self, order: &Order) -> AppResult<LedgerSummary> {
        let invoices: Vec<Invoice> = self.flow.repo.list(&DocumentFilter::by_parent(order.id)).await?;
        let payments: Vec<Payment> = self.flow.repo.list(&DocumentFilter::by_parent(order.id)).await?;
        Ok(summarize(order, &invoices, &payments))
    }

    pub async fn order_ledger(&self, actor: &Actor, order_id: Uuid) -> AppResult<LedgerSummary> {
        let order: Order = self.flow.visible(actor, order_id).await?;
        self.summarize_order(&order).await
    }

    /// One row per order visible to the actor
    pub async fn report(&self, actor: &Actor) -> AppResult<Vec<LedgerRow>> {
        let orders: Vec<Order> = self.flow.list(actor, &ListParams::default()).await?;
        let mut rows = Vec::with_capacity(orders.len());
        for order in &orders {
            let summary = self.summarize_order(order).await?;
            rows.push(LedgerRow::new(order, &summary));
        }
        Ok(rows)
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
