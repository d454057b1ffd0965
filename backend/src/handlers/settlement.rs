//! HTTP handlers for settlement preview and order confirmation

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use shared::OrderForm;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::settlement::{ConfirmedOrder, SettlementPreview};
use crate::AppState;

/// Settle an order without persisting it
pub async fn preview_settlement(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<SettlementPreview>> {
    let form = order_form(body)?;
    Ok(Json(state.settlements.preview(form)))
}

/// Validate, settle and persist a confirmed order
pub async fn confirm_order(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ConfirmedOrder>> {
    let order = state.settlements.confirm(order_form(body)?).await?;
    Ok(Json(order))
}

/// Re-settle and replace a persisted order
pub async fn amend_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ConfirmedOrder>> {
    let order = state
        .settlements
        .amend(order_id, order_form(body)?)
        .await?;
    Ok(Json(order))
}

/// Decode a request body as an order form; non-numeric decimals become
/// validation errors, anything else malformed is a bad request
pub(crate) fn order_form(body: Result<Json<Value>, JsonRejection>) -> AppResult<OrderForm> {
    let Json(value) = body?;
    OrderForm::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid order record: {}", e)))
}
