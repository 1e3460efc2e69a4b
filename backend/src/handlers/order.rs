//! Order HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::order::OrderService;
use crate::services::ListParams;
use crate::AppState;

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let service = OrderService::new(state.workflow());

    match service.list(&current_user.0, &params).await {
        Ok(orders) => (StatusCode::OK, Json(params.pagination().paginate(orders))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = OrderService::new(state.workflow());

    match service.get(&current_user.0, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Vendor acknowledges a pending order
pub async fn acknowledge_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = OrderService::new(state.workflow());

    match service.acknowledge(&current_user.0, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Close out an order whose invoice is paid
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = OrderService::new(state.workflow());

    match service.complete(&current_user.0, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}
