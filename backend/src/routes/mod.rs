//! Route definitions for the settlement server

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/settlements", settlement_routes())
        .nest("/orders", order_routes())
        .nest("/reports", report_routes())
        .route("/deductions/suggest", get(handlers::suggest_deduction))
}

/// Settlement calculation routes
fn settlement_routes() -> Router<AppState> {
    Router::new().route("/preview", post(handlers::preview_settlement))
}

/// Confirmed order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/confirm", post(handlers::confirm_order))
        .route("/:order_id", put(handlers::amend_order))
}

/// Report routes
fn report_routes() -> Router<AppState> {
    Router::new().route("/settlements", post(handlers::get_settlement_report))
}
