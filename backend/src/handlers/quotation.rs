//! Quotation and negotiation HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use shared::{CounterInput, NewQuotation, ResolveCounterInput};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::quotation::QuotationService;
use crate::services::ListParams;
use crate::AppState;

pub async fn list_quotations(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.workflow());

    match service.list(&current_user.0, &params).await {
        Ok(quotations) => (StatusCode::OK, Json(params.pagination().paginate(quotations))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_quotation(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(quotation_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.workflow());

    match service.get(&current_user.0, quotation_id).await {
        Ok(quotation) => (StatusCode::OK, Json(quotation)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Vendor quotes against an enquiry
pub async fn create_quotation(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(input): Json<NewQuotation>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.workflow());

    match service.create(&current_user.0, input).await {
        Ok(quotation) => (StatusCode::CREATED, Json(quotation)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Negotiation history of a quotation
pub async fn list_counters(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(quotation_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.workflow());

    match service.list_counters(&current_user.0, quotation_id).await {
        Ok(counters) => (StatusCode::OK, Json(serde_json::json!({ "counterQuotations": counters }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Purchasing manager accepts, rejects or counters a quotation
pub async fn file_counter(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(quotation_id): Path<Uuid>,
    Json(input): Json<CounterInput>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.workflow());

    match service.file_counter(&current_user.0, quotation_id, input).await {
        Ok(filing) => (StatusCode::CREATED, Json(filing)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_counter(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(counter_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.workflow());

    match service.get_counter(&current_user.0, counter_id).await {
        Ok(counter) => (StatusCode::OK, Json(counter)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Vendor accepts or rejects a negotiation counter
pub async fn resolve_counter(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(counter_id): Path<Uuid>,
    Json(input): Json<ResolveCounterInput>,
) -> impl IntoResponse {
    let service = QuotationService::new(state.workflow());

    match service.resolve_counter(&current_user.0, counter_id, input).await {
        Ok(resolution) => (StatusCode::OK, Json(resolution)).into_response(),
        Err(e) => e.into_response(),
    }
}
