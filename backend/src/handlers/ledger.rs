//! Ledger HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ledger::LedgerService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

/// Ledger summary of one order
pub async fn get_order_ledger(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.workflow());
    let summary = service.order_ledger(&current_user.0, order_id).await?;
    Ok(Json(summary))
}

/// Ledger of every visible order, as JSON or CSV
pub async fn get_ledger_report(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.workflow());
    let data = service.report(&current_user.0).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = LedgerService::export_to_csv(&data)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"ledger.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(data).into_response())
    }
}
