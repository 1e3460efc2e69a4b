//! Letter of intent issuance and vendor response

use chrono::Utc;
use shared::{Actor, CounterQuotation, Loi, LoiSource, LoiSourceType, NewLoi, Quotation};
use tracing::info;
use uuid::Uuid;

use super::component::RejectInput;
use super::{changed, created, ListParams, Workflow};
use crate::error::AppResult;
use crate::middleware::auth::{require_purchasing_manager, require_vendor};
use crate::store::{DocumentFilter, UnitOfWork};

#[derive(Clone)]
pub struct LoiService {
    flow: Workflow,
}

impl LoiService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    pub async fn issue(&self, actor: &Actor, input: NewLoi) -> AppResult<Loi> {
        require_purchasing_manager(actor)?;

        let (counter, quotation) = match input.source_type {
            LoiSourceType::Quotation => {
                let quotation: Quotation = self.flow.repo.get(input.source_id).await?;
                (None, quotation)
            }
            LoiSourceType::CounterQuotation => {
                let counter: CounterQuotation = self.flow.repo.get(input.source_id).await?;
                let quotation: Quotation = self.flow.repo.get(counter.quotation_id).await?;
                (Some(counter), quotation)
            }
        };
        let source = match &counter {
            Some(counter) => LoiSource::Counter {
                counter,
                quotation: &quotation,
            },
            None => LoiSource::Quotation(&quotation),
        };

        let issued: Vec<Loi> = self
            .flow
            .repo
            .list(&DocumentFilter::by_parent(quotation.id))
            .await?;
        let loi = Loi::issue(source, issued.first(), actor.user_id, input, Utc::now())?;

        self.flow.repo.commit(UnitOfWork::new().insert(&loi)?).await?;
        info!(
            "LOI {} issued for quotation {} (total {})",
            loi.id, quotation.id, loi.total_amount
        );
        self.flow.events.publish(vec![created("issue", &loi, actor)]);
        Ok(loi)
    }

    pub async fn accept(&self, actor: &Actor, id: Uuid) -> AppResult<Loi> {
        require_vendor(actor)?;
        let current: Loi = self.flow.visible(actor, id).await?;
        let accepted = current.accept(Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &accepted)?)
            .await?;
        info!("LOI {} accepted by vendor {}", id, current.vendor_id);
        self.flow
            .events
            .publish(vec![changed("accept", &current, &accepted, actor)]);
        Ok(accepted)
    }

    pub async fn reject(&self, actor: &Actor, id: Uuid, input: RejectInput) -> AppResult<Loi> {
        require_vendor(actor)?;
        let current: Loi = self.flow.visible(actor, id).await?;
        let rejected = current.reject(input.rejection_reason.as_deref(), Utc::now())?;

        self.flow
            .repo
            .commit(UnitOfWork::new().update(&current, &rejected)?)
            .await?;
        info!("LOI {} rejected by vendor {}", id, current.vendor_id);
        self.flow
            .events
            .publish(vec![changed("reject", &current, &rejected, actor)]);
        Ok(rejected)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Loi> {
        self.flow.visible(actor, id).await
    }

    pub async fn list(&self, actor: &Actor, params: &ListParams) -> AppResult<Vec<Loi>> {
        self.flow.list(actor, params).await
    }
}
