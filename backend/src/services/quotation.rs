//! Quotations and the counter-quotation negotiation loop

use chrono::Utc;
use shared::{
    Actor, Component, CounterFiling, CounterInput, CounterQuotation, CounterResolution, CounterStatus,
    Enquiry, NewQuotation, Quotation, QuotationContext, ResolveCounterInput,
};
use tracing::info;
use uuid::Uuid;

use super::{changed, created, ListParams, Workflow};
use crate::error::AppResult;
use crate::events::TransitionEvent;
use crate::middleware::auth::{require_purchasing_manager, require_vendor};
use crate::store::{DocumentFilter, UnitOfWork};

#[derive(Clone)]
pub struct QuotationService {
    flow: Workflow,
}

impl QuotationService {
    pub fn new(flow: Workflow) -> Self {
        Self { flow }
    }

    /// Vendor quotes against an enquiry addressed to them
    pub async fn create(&self, actor: &Actor, input: NewQuotation) -> AppResult<Quotation> {
        let vendor_id = require_vendor(actor)?;
        let enquiry: Enquiry = self.flow.visible(actor, input.enquiry_id).await?;

        let mut catalog: Vec<Component> = Vec::with_capacity(input.items.len());
        for item in &input.items {
            if let Some(component) = self.flow.repo.find::<Component>(item.component_id).await? {
                catalog.push(component);
            }
        }
        let existing: Vec<Quotation> = self
            .flow
            .repo
            .list(&DocumentFilter::by_parent(enquiry.id))
            .await?;

        let (quotation, quoted) = Quotation::create(
            vendor_id,
            QuotationContext {
                enquiry: &enquiry,
                catalog: &catalog,
                existing: &existing,
            },
            input,
            Utc::now(),
        )?;

        self.flow
            .repo
            .commit(
                UnitOfWork::new()
                    .insert(&quotation)?
                    .update(&enquiry, &quoted)?,
            )
            .await?;
        info!(
            "Quotation {} sent for enquiry {} (total {})",
            quotation.id, enquiry.id, quotation.total_amount
        );

        let mut events = vec![created("create", &quotation, actor)];
        if quoted.status != enquiry.status {
            events.push(changed("quote", &enquiry, &quoted, actor));
        }
        self.flow.events.publish(events);
        Ok(quotation)
    }

    /// Purchasing manager accepts, rejects or negotiates
    pub async fn file_counter(
        &self,
        actor: &Actor,
        quotation_id: Uuid,
        input: CounterInput,
    ) -> AppResult<CounterFiling> {
        require_purchasing_manager(actor)?;
        let quotation: Quotation = self.flow.repo.get(quotation_id).await?;
        let enquiry: Enquiry = self.flow.repo.get(quotation.enquiry_id).await?;
        let counters = self.counters_of(quotation_id).await?;
        let outstanding = counters.iter().find(|c| c.status == CounterStatus::Pending);

        let filing = quotation.file_counter(&enquiry, outstanding, actor.user_id, input, Utc::now())?;

        let action = action_name(&filing.counter);
        let mut work = UnitOfWork::new()
            .update(&quotation, &filing.quotation)?
            .insert(&filing.counter)?;
        let mut events = vec![
            changed(action, &quotation, &filing.quotation, actor),
            created(action, &filing.counter, actor),
        ];
        if let (Some(previous), Some(superseded)) = (outstanding, filing.superseded.as_ref()) {
            work = work.update(previous, superseded)?;
            events.push(changed("supersede", previous, superseded, actor));
        }
        if let Some(accepted) = &filing.enquiry {
            work = work.update(&enquiry, accepted)?;
            if accepted.status != enquiry.status {
                events.push(changed("accept", &enquiry, accepted, actor));
            }
        }

        self.flow.repo.commit(work).await?;
        info!(
            "Counter {} ({}) filed on quotation {}; quotation is now {}",
            filing.counter.id, action, quotation_id, filing.quotation.status
        );
        self.flow.events.publish(events);
        Ok(filing)
    }

    /// Vendor answers a pending negotiation counter
    pub async fn resolve_counter(
        &self,
        actor: &Actor,
        counter_id: Uuid,
        input: ResolveCounterInput,
    ) -> AppResult<CounterResolution> {
        require_vendor(actor)?;
        let counter: CounterQuotation = self.flow.visible(actor, counter_id).await?;
        let quotation: Quotation = self.flow.repo.get(counter.quotation_id).await?;
        let enquiry: Enquiry = self.flow.repo.get(quotation.enquiry_id).await?;

        let resolution = counter.resolve(&quotation, &enquiry, input, Utc::now())?;

        let mut work = UnitOfWork::new()
            .update(&counter, &resolution.counter)?
            .update(&quotation, &resolution.quotation)?;
        let mut events: Vec<TransitionEvent> = vec![
            changed("resolve", &counter, &resolution.counter, actor),
            changed("resolve", &quotation, &resolution.quotation, actor),
        ];
        if let Some(accepted) = &resolution.enquiry {
            work = work.update(&enquiry, accepted)?;
            if accepted.status != enquiry.status {
                events.push(changed("accept", &enquiry, accepted, actor));
            }
        }

        self.flow.repo.commit(work).await?;
        info!(
            "Counter {} resolved as {} by vendor; quotation {} is now {}",
            counter_id, resolution.counter.status, quotation.id, resolution.quotation.status
        );
        self.flow.events.publish(events);
        Ok(resolution)
    }

    async fn counters_of(&self, quotation_id: Uuid) -> AppResult<Vec<CounterQuotation>> {
        self.flow
            .repo
            .list(&DocumentFilter::by_parent(quotation_id))
            .await
    }

    /// Negotiation history, oldest first
    pub async fn list_counters(&self, actor: &Actor, quotation_id: Uuid) -> AppResult<Vec<CounterQuotation>> {
        let _: Quotation = self.flow.visible(actor, quotation_id).await?;
        self.counters_of(quotation_id).await
    }

    pub async fn get_counter(&self, actor: &Actor, id: Uuid) -> AppResult<CounterQuotation> {
        self.flow.visible(actor, id).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> AppResult<Quotation> {
        self.flow.visible(actor, id).await
    }

    pub async fn list(&self, actor: &Actor, params: &ListParams) -> AppResult<Vec<Quotation>> {
        self.flow.list(actor, params).await
    }
}

fn action_name(counter: &CounterQuotation) -> &'static str {
    match counter.action {
        shared::ResponseAction::Accept => "accept",
        shared::ResponseAction::Reject => "reject",
        shared::ResponseAction::Negotiate => "negotiate",
    }
}
