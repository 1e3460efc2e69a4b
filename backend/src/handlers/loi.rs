//! Letter of intent HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use shared::{ConfirmOrder, NewLoi};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::component::RejectInput;
use crate::services::loi::LoiService;
use crate::services::order::OrderService;
use crate::services::ListParams;
use crate::AppState;

pub async fn list_lois(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let service = LoiService::new(state.workflow());

    match service.list(&current_user.0, &params).await {
        Ok(lois) => (StatusCode::OK, Json(params.pagination().paginate(lois))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_loi(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(loi_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LoiService::new(state.workflow());

    match service.get(&current_user.0, loi_id).await {
        Ok(loi) => (StatusCode::OK, Json(loi)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Purchasing manager issues an LOI from an accepted quotation or counter
pub async fn issue_loi(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(input): Json<NewLoi>,
) -> impl IntoResponse {
    let service = LoiService::new(state.workflow());

    match service.issue(&current_user.0, input).await {
        Ok(loi) => (StatusCode::CREATED, Json(loi)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn accept_loi(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(loi_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LoiService::new(state.workflow());

    match service.accept(&current_user.0, loi_id).await {
        Ok(loi) => (StatusCode::OK, Json(loi)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn reject_loi(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(loi_id): Path<Uuid>,
    Json(input): Json<RejectInput>,
) -> impl IntoResponse {
    let service = LoiService::new(state.workflow());

    match service.reject(&current_user.0, loi_id, input).await {
        Ok(loi) => (StatusCode::OK, Json(loi)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Confirm an accepted LOI into an order; the body is optional
pub async fn confirm_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(loi_id): Path<Uuid>,
    input: Option<Json<ConfirmOrder>>,
) -> impl IntoResponse {
    let service = OrderService::new(state.workflow());
    let input = input.map(|Json(input)| input).unwrap_or_default();

    match service.confirm_from_loi(&current_user.0, loi_id, input).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}
