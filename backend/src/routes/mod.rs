//! Route definitions for the procurement marketplace

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes; every route requires a bearer token
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/components", component_routes(&state))
        .nest("/enquiries", enquiry_routes(&state))
        .nest("/quotations", quotation_routes(&state))
        .nest("/counter-quotations", counter_routes(&state))
        .nest("/lois", loi_routes(&state))
        .nest("/orders", order_routes(&state))
        .nest("/invoices", invoice_routes(&state))
        .nest("/payments", payment_routes(&state))
        .nest("/reports", report_routes(&state))
}

/// Component catalog routes (protected)
fn component_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_components).post(handlers::submit_component))
        .route(
            "/:component_id",
            get(handlers::get_component).patch(handlers::edit_component),
        )
        .route("/:component_id/approve", post(handlers::approve_component))
        .route("/:component_id/reject", post(handlers::reject_component))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Enquiry routes (protected)
fn enquiry_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_enquiries).post(handlers::create_enquiry))
        .route(
            "/:enquiry_id",
            get(handlers::get_enquiry)
                .patch(handlers::update_enquiry)
                .delete(handlers::delete_enquiry),
        )
        .route("/:enquiry_id/reject", post(handlers::reject_enquiry))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Quotation and negotiation routes (protected)
fn quotation_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_quotations).post(handlers::create_quotation))
        .route("/:quotation_id", get(handlers::get_quotation))
        .route(
            "/:quotation_id/counters",
            get(handlers::list_counters).post(handlers::file_counter),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Counter-quotation routes (protected)
fn counter_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:counter_id", get(handlers::get_counter))
        .route("/:counter_id/resolve", post(handlers::resolve_counter))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Letter of intent routes (protected)
fn loi_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lois).post(handlers::issue_loi))
        .route("/:loi_id", get(handlers::get_loi))
        .route("/:loi_id/accept", post(handlers::accept_loi))
        .route("/:loi_id/reject", post(handlers::reject_loi))
        .route("/:loi_id/order", post(handlers::confirm_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Order routes (protected)
fn order_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders))
        .route("/:order_id", get(handlers::get_order))
        .route("/:order_id/acknowledge", post(handlers::acknowledge_order))
        .route("/:order_id/complete", post(handlers::complete_order))
        .route("/:order_id/ledger", get(handlers::get_order_ledger))
        .route(
            "/:order_id/payments",
            get(handlers::list_order_payments).post(handlers::record_payment),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Invoice routes (protected)
fn invoice_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::create_invoice))
        .route("/:invoice_id", get(handlers::get_invoice))
        .route("/:invoice_id/received", patch(handlers::mark_invoice_received))
        .route("/:invoice_id/accept", patch(handlers::accept_invoice))
        .route("/:invoice_id/reject", patch(handlers::reject_invoice))
        .route("/:invoice_id/paid", patch(handlers::mark_invoice_paid))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Payment routes (protected)
fn payment_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:payment_id", get(handlers::get_payment))
        .route("/:payment_id/complete", patch(handlers::complete_payment))
        .route("/:payment_id/fail", patch(handlers::fail_payment))
        .route("/:payment_id/receipt", patch(handlers::send_payment_receipt))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Reporting routes (protected)
fn report_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/ledger", get(handlers::get_ledger_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}
