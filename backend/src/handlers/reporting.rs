//! Reporting handlers for settlement summaries and data export

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use shared::OrderForm;

use crate::error::{AppError, AppResult};
use crate::services::reporting::ReportingService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>, // "json" or "csv"
}

/// Settle a batch of orders and return the rows with totals
pub async fn get_settlement_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    body: Result<Json<Vec<Value>>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(values) = body?;
    let records = values
        .into_iter()
        .map(|value| OrderForm::from_value(value).map(|form| form.record))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::BadRequest(format!("Invalid order record: {}", e)))?;
    let report = state.reporting.settlement_report(&records);

    match query.format.as_deref() {
        Some("csv") => {
            let csv = ReportingService::export_to_csv(&report.rows)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"settlements.csv\"",
                    ),
                ],
                csv,
            )
                .into_response())
        }
        None | Some("json") => Ok(Json(report).into_response()),
        Some(other) => Err(AppError::BadRequest(format!("Unsupported report format: {}", other))),
    }
}
