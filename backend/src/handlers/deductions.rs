//! Quality deduction suggestions

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{normalize_parameter, Commodity, OrderSide};

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Deserialize)]
pub struct SuggestQuery {
    pub commodity: String,
    pub parameter: String,
    pub value: Decimal,
    pub gross_amount: Decimal,
    pub side: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeductionSuggestion {
    pub commodity: Commodity,
    pub side: Option<OrderSide>,
    pub parameter: String,
    pub value: Decimal,
    pub gross_amount: Decimal,
    pub deduction_amount: Decimal,
}

/// Suggest a quality deduction from the threshold table
pub async fn suggest_deduction(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> AppResult<Json<DeductionSuggestion>> {
    let commodity: Commodity = query
        .commodity
        .parse()
        .map_err(|e: shared::ParseCommodityError| AppError::BadRequest(e.to_string()))?;
    let side = query
        .side
        .as_deref()
        .map(str::parse::<OrderSide>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let table = state.settlements.calculator().table();
    let deduction_amount = match side {
        Some(side) => table.lookup_deduction_for(
            side,
            commodity,
            &query.parameter,
            query.value,
            query.gross_amount,
        ),
        None => table.lookup_deduction(commodity, &query.parameter, query.value, query.gross_amount),
    };

    Ok(Json(DeductionSuggestion {
        commodity,
        side,
        parameter: normalize_parameter(&query.parameter),
        value: query.value,
        gross_amount: query.gross_amount,
        deduction_amount,
    }))
}
