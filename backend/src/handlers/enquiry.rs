//! Enquiry HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use shared::{EnquiryPatch, NewEnquiry};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::component::RejectInput;
use crate::services::enquiry::EnquiryService;
use crate::services::ListParams;
use crate::AppState;

/// List enquiries; vendors see only those addressed to them
pub async fn list_enquiries(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let service = EnquiryService::new(state.workflow());

    match service.list(&current_user.0, &params).await {
        Ok(enquiries) => (StatusCode::OK, Json(params.pagination().paginate(enquiries))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_enquiry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(enquiry_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = EnquiryService::new(state.workflow());

    match service.get(&current_user.0, enquiry_id).await {
        Ok(enquiry) => (StatusCode::OK, Json(enquiry)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Purchasing manager raises an enquiry to one vendor
pub async fn create_enquiry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(input): Json<NewEnquiry>,
) -> impl IntoResponse {
    let service = EnquiryService::new(state.workflow());

    match service.create(&current_user.0, input).await {
        Ok(enquiry) => (StatusCode::CREATED, Json(enquiry)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_enquiry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(enquiry_id): Path<Uuid>,
    Json(patch): Json<EnquiryPatch>,
) -> impl IntoResponse {
    let service = EnquiryService::new(state.workflow());

    match service.update(&current_user.0, enquiry_id, patch).await {
        Ok(enquiry) => (StatusCode::OK, Json(enquiry)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete an enquiry that has not been quoted
pub async fn delete_enquiry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(enquiry_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = EnquiryService::new(state.workflow());

    match service.delete(&current_user.0, enquiry_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Vendor declines an enquiry
pub async fn reject_enquiry(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(enquiry_id): Path<Uuid>,
    Json(input): Json<RejectInput>,
) -> impl IntoResponse {
    let service = EnquiryService::new(state.workflow());

    match service.reject(&current_user.0, enquiry_id, input).await {
        Ok(enquiry) => (StatusCode::OK, Json(enquiry)).into_response(),
        Err(e) => e.into_response(),
    }
}
