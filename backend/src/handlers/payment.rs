//! Payment HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use shared::{CompletePayment, NewPayment};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::payment::{FailPaymentInput, PaymentService, ReceiptInput};
use crate::AppState;

/// Payments recorded against an order
pub async fn list_order_payments(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PaymentService::new(state.workflow());

    match service.list_for_order(&current_user.0, order_id).await {
        Ok(payments) => (StatusCode::OK, Json(serde_json::json!({ "payments": payments }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Record an advance or final payment
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<NewPayment>,
) -> impl IntoResponse {
    let service = PaymentService::new(state.workflow());

    match service.record(&current_user.0, order_id, input).await {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PaymentService::new(state.workflow());

    match service.get(&current_user.0, payment_id).await {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn complete_payment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(payment_id): Path<Uuid>,
    input: Option<Json<CompletePayment>>,
) -> AppResult<impl IntoResponse> {
    let service = PaymentService::new(state.workflow());
    let input = input.map(|Json(input)| input).unwrap_or_default();
    let payment = service.complete(&current_user.0, payment_id, input).await?;
    Ok(Json(payment))
}

pub async fn fail_payment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(payment_id): Path<Uuid>,
    Json(input): Json<FailPaymentInput>,
) -> AppResult<impl IntoResponse> {
    let service = PaymentService::new(state.workflow());
    let payment = service.fail(&current_user.0, payment_id, input).await?;
    Ok(Json(payment))
}

pub async fn send_payment_receipt(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(payment_id): Path<Uuid>,
    Json(input): Json<ReceiptInput>,
) -> AppResult<impl IntoResponse> {
    let service = PaymentService::new(state.workflow());
    let payment = service.send_receipt(&current_user.0, payment_id, input).await?;
    Ok(Json(payment))
}
