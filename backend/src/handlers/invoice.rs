//! Invoice HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use shared::NewInvoice;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::component::RejectInput;
use crate::services::invoice::InvoiceService;
use crate::services::ListParams;
use crate::AppState;

pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.workflow());

    match service.list(&current_user.0, &params).await {
        Ok(invoices) => (StatusCode::OK, Json(params.pagination().paginate(invoices))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.workflow());

    match service.get(&current_user.0, invoice_id).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Vendor raises an invoice against a confirmed order
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(input): Json<NewInvoice>,
) -> impl IntoResponse {
    let service = InvoiceService::new(state.workflow());

    match service.create(&current_user.0, input).await {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn mark_invoice_received(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.workflow());
    let invoice = service.mark_received(&current_user.0, invoice_id).await?;
    Ok(Json(invoice))
}

pub async fn accept_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.workflow());
    let invoice = service.accept(&current_user.0, invoice_id).await?;
    Ok(Json(invoice))
}

pub async fn reject_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<RejectInput>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.workflow());
    let invoice = service.reject(&current_user.0, invoice_id, input).await?;
    Ok(Json(invoice))
}

/// Mark an invoice paid; the response carries the ledger and any flag mismatch
pub async fn mark_invoice_paid(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = InvoiceService::new(state.workflow());
    let paid = service.mark_paid(&current_user.0, invoice_id).await?;
    Ok(Json(paid))
}
