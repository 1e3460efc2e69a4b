//! Shared harness for workflow tests: an in-memory store, a recording
//! event sink, and helpers that walk documents down the chain.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use procurement_backend::{
    events::{EventPublisher, EventSink, MemorySink, TransitionEvent},
    services::{
        component::ComponentService, enquiry::EnquiryService, invoice::InvoiceService,
        ledger::LedgerService, loi::LoiService, order::OrderService, payment::PaymentService,
        quotation::QuotationService,
    },
    store::Repository,
    AppState, Config,
};
use rust_decimal::Decimal;
use shared::{
    Actor, Component, CompletePayment, Enquiry, Invoice, Loi, LoiSourceType, NewComponent,
    NewEnquiry, NewInvoice, NewLoi, NewPayment, NewQuotation, Order, Payment, PaymentPhase,
    QuotedItem, Quotation, RequestedItem, DATE_FORMAT,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

/// A `YYYY-MM-DD` date `days` from today
pub fn future(days: i64) -> String {
    (Utc::now().date_naive() + chrono::Duration::days(days))
        .format(DATE_FORMAT)
        .to_string()
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub struct Harness {
    pub state: AppState,
    pub sink: Arc<MemorySink>,
    pub manager: Actor,
    pub vendor: Actor,
    pub vendor_id: Uuid,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_repo(Repository::in_memory())
    }

    pub fn with_repo(repo: Repository) -> Self {
        let sink = Arc::new(MemorySink::new());
        let recorder: Arc<dyn EventSink> = sink.clone();
        let events = EventPublisher::new(Vec::new()).with_sink(recorder);
        let state = AppState::new(repo, events, Config::in_memory(JWT_SECRET));
        let vendor_id = Uuid::new_v4();

        Self {
            state,
            sink,
            manager: Actor::purchasing_manager(Uuid::new_v4()),
            vendor: Actor::vendor(Uuid::new_v4(), vendor_id),
            vendor_id,
        }
    }

    /// A second vendor with no documents of its own
    pub fn other_vendor(&self) -> Actor {
        Actor::vendor(Uuid::new_v4(), Uuid::new_v4())
    }

    pub fn components(&self) -> ComponentService {
        ComponentService::new(self.state.workflow())
    }

    pub fn enquiries(&self) -> EnquiryService {
        EnquiryService::new(self.state.workflow())
    }

    pub fn quotations(&self) -> QuotationService {
        QuotationService::new(self.state.workflow())
    }

    pub fn lois(&self) -> LoiService {
        LoiService::new(self.state.workflow())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.state.workflow())
    }

    pub fn invoices(&self) -> InvoiceService {
        InvoiceService::new(self.state.workflow())
    }

    pub fn payments(&self) -> PaymentService {
        PaymentService::new(self.state.workflow())
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.state.workflow())
    }

    /// Wait for fire-and-forget delivery to reach the recording sink
    pub async fn events(&self, at_least: usize) -> Vec<TransitionEvent> {
        for _ in 0..50 {
            let events = self.sink.events();
            if events.len() >= at_least {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sink.events()
    }

    /// Wait until an event with `action` has been delivered
    pub async fn event_for(&self, action: &str) -> Option<TransitionEvent> {
        for _ in 0..50 {
            if let Some(event) = self.sink.events().into_iter().find(|e| e.action == action) {
                return Some(event);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    pub fn new_component(code: &str) -> NewComponent {
        NewComponent {
            code: code.to_string(),
            name: format!("Component {}", code),
            description: None,
            unit_of_measurement: "pcs".to_string(),
            price_per_unit: dec(100),
            cgst_percent: dec(9),
            sgst_percent: dec(9),
            discount_percent: Decimal::ZERO,
            stock: dec(500),
            min_order_qty: dec(1),
            lead_time_days: 7,
        }
    }

    /// Submitted by the vendor and approved by the manager; priced at 100 + 18% tax
    pub async fn approved_component(&self) -> Component {
        let code = format!("CMP-{}", &Uuid::new_v4().simple().to_string()[..6]);
        let component = self
            .components()
            .submit(&self.vendor, Self::new_component(&code))
            .await
            .unwrap();
        self.components()
            .approve(&self.manager, component.id)
            .await
            .unwrap()
    }

    pub fn new_enquiry(&self, component: &Component, quantity: i64) -> NewEnquiry {
        NewEnquiry {
            vendor_id: self.vendor_id,
            title: "Quarterly restock".to_string(),
            description: None,
            items: vec![RequestedItem {
                component_id: component.id,
                quantity: dec(quantity),
                unit: "pcs".to_string(),
            }],
            required_delivery_date: future(60),
        }
    }

    pub async fn raised_enquiry(&self, component: &Component) -> Enquiry {
        self.enquiries()
            .create(&self.manager, self.new_enquiry(component, 10))
            .await
            .unwrap()
    }

    pub fn new_quotation(enquiry: &Enquiry, component: &Component, advance_percent: i64) -> NewQuotation {
        NewQuotation {
            enquiry_id: enquiry.id,
            items: vec![QuotedItem {
                component_id: component.id,
                quantity: dec(10),
                unit_price: None,
                discount_percent: None,
                cgst_percent: None,
                sgst_percent: None,
            }],
            valid_till: future(30),
            expected_delivery_date: future(45),
            advance_payment_percent: dec(advance_percent),
            notes: None,
        }
    }

    /// Ten units at catalog price: a total of 1180
    pub async fn sent_quotation(&self) -> (Component, Enquiry, Quotation) {
        let component = self.approved_component().await;
        let enquiry = self.raised_enquiry(&component).await;
        let quotation = self
            .quotations()
            .create(&self.vendor, Self::new_quotation(&enquiry, &component, 20))
            .await
            .unwrap();
        (component, enquiry, quotation)
    }

    pub async fn accepted_quotation(&self) -> Quotation {
        let (_, _, quotation) = self.sent_quotation().await;
        let filing = self
            .quotations()
            .file_counter(&self.manager, quotation.id, accept_counter())
            .await
            .unwrap();
        filing.quotation
    }

    pub fn new_loi(source_id: Uuid, source_type: LoiSourceType) -> NewLoi {
        NewLoi {
            source_id,
            source_type,
            terms_and_conditions: "Net 30; delivery to plant 2".to_string(),
            expected_delivery_date: None,
        }
    }

    pub async fn accepted_loi(&self) -> Loi {
        let quotation = self.accepted_quotation().await;
        let loi = self
            .lois()
            .issue(&self.manager, Self::new_loi(quotation.id, LoiSourceType::Quotation))
            .await
            .unwrap();
        self.lois().accept(&self.vendor, loi.id).await.unwrap()
    }

    /// Confirmed by the vendor, ready for invoicing
    pub async fn confirmed_order(&self) -> Order {
        let loi = self.accepted_loi().await;
        let order = self
            .orders()
            .confirm_from_loi(&self.manager, loi.id, Default::default())
            .await
            .unwrap();
        self.orders().acknowledge(&self.vendor, order.id).await.unwrap()
    }

    pub async fn accepted_invoice(&self, order: &Order) -> Invoice {
        let invoice = self
            .invoices()
            .create(
                &self.vendor,
                NewInvoice {
                    order_id: order.id,
                    items: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        self.invoices()
            .mark_received(&self.manager, invoice.id)
            .await
            .unwrap();
        self.invoices().accept(&self.manager, invoice.id).await.unwrap()
    }

    pub async fn completed_payment(&self, order: &Order, phase: PaymentPhase, amount: Decimal) -> Payment {
        let payment = self
            .payments()
            .record(
                &self.manager,
                order.id,
                NewPayment {
                    phase,
                    amount,
                    due_date: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        self.payments()
            .complete(&self.manager, payment.id, CompletePayment::default())
            .await
            .unwrap()
    }
}

pub fn accept_counter() -> shared::CounterInput {
    shared::CounterInput {
        action: shared::ResponseAction::Accept,
        items: Vec::new(),
        valid_till: None,
        expected_delivery_date: None,
        advance_payment_percent: None,
        rejection_reason: None,
        negotiation_notes: None,
    }
}
