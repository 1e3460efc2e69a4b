//! Component catalog HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use shared::{ComponentPatch, NewComponent};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::component::{ComponentService, RejectInput};
use crate::services::ListParams;
use crate::AppState;

/// List components visible to the caller
pub async fn list_components(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let service = ComponentService::new(state.workflow());

    match service.list(&current_user.0, &params).await {
        Ok(components) => (StatusCode::OK, Json(params.pagination().paginate(components))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific component
pub async fn get_component(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ComponentService::new(state.workflow());

    match service.get(&current_user.0, component_id).await {
        Ok(component) => (StatusCode::OK, Json(component)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Vendor submits a component for approval
pub async fn submit_component(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(input): Json<NewComponent>,
) -> impl IntoResponse {
    let service = ComponentService::new(state.workflow());

    match service.submit(&current_user.0, input).await {
        Ok(component) => (StatusCode::CREATED, Json(component)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Vendor edits a component; a rejected one goes back to review
pub async fn edit_component(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
    Json(patch): Json<ComponentPatch>,
) -> impl IntoResponse {
    let service = ComponentService::new(state.workflow());

    match service.edit(&current_user.0, component_id, patch).await {
        Ok(edit) => (StatusCode::OK, Json(edit)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn approve_component(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ComponentService::new(state.workflow());

    match service.approve(&current_user.0, component_id).await {
        Ok(component) => (StatusCode::OK, Json(component)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn reject_component(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
    Json(input): Json<RejectInput>,
) -> impl IntoResponse {
    let service = ComponentService::new(state.workflow());

    match service.reject(&current_user.0, component_id, input).await {
        Ok(component) => (StatusCode::OK, Json(component)).into_response(),
        Err(e) => e.into_response(),
    }
}
