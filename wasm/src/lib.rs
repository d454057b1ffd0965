//! WebAssembly module for the Agri Trade Console
//!
//! Provides client-side computation for:
//! - Net weight reconciliation on weighbridge entry
//! - Quality deduction suggestions
//! - Live settlement preview while an order form is edited
//! - Offline order validation
//!
//! Decimal values cross the JS boundary as strings.

use std::sync::OnceLock;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::{
    reconcile_str, DeductionTableError, OrderForm, OrderSide, QualityDeductionTable,
    SettlementCalculator,
};

static CALCULATOR: OnceLock<SettlementCalculator> = OnceLock::new();

/// Calculator over the bundled deduction table, parsed on first use
fn calculator() -> &'static SettlementCalculator {
    CALCULATOR.get_or_init(|| {
        let table = table_or_empty(QualityDeductionTable::bundled(), |message| {
            web_sys::console::error_1(&JsValue::from_str(message));
        });
        SettlementCalculator::new(table)
    })
}

fn table_or_empty(
    loaded: Result<QualityDeductionTable, DeductionTableError>,
    report: impl FnOnce(&str),
) -> QualityDeductionTable {
    loaded.unwrap_or_else(|e| {
        report(&format!("Deduction table unavailable, suggesting nothing: {}", e));
        QualityDeductionTable::empty()
    })
}

/// Calculate net weight (MT) from form input
#[wasm_bindgen]
pub fn reconcile_net_weight(gross: &str, tare: &str, manual_net: &str) -> String {
    reconcile_str(gross, tare, manual_net).to_string()
}

/// Suggest a quality deduction amount.
/// Unknown commodities and parameters suggest nothing.
#[wasm_bindgen]
pub fn suggest_deduction(
    commodity: &str,
    side: &str,
    parameter: &str,
    value: &str,
    gross_amount: &str,
) -> String {
    let Ok(commodity) = commodity.parse::<Commodity>() else {
        return round_money(Decimal::ZERO).to_string();
    };
    let value = coerce_decimal(value);
    let gross_amount = coerce_decimal(gross_amount);

    let table = calculator().table();
    let amount = match side.parse::<OrderSide>() {
        Ok(side) => table.lookup_deduction_for(side, commodity, parameter, value, gross_amount),
        Err(_) => table.lookup_deduction(commodity, parameter, value, gross_amount),
    };
    amount.to_string()
}

/// Settle an order record given as JSON; returns the settlement as JSON
#[wasm_bindgen]
pub fn compute_settlement_json(record_json: &str) -> Result<String, JsValue> {
    let settlement = settle_record(record_json).map_err(js_error)?;
    for warning in &settlement.warnings {
        web_sys::console::warn_1(&JsValue::from_str(&warning.to_string()));
    }
    serde_json::to_string(&settlement).map_err(|e| js_error(e.to_string()))
}

/// Validate an order record given as JSON; returns the error list as JSON
#[wasm_bindgen]
pub fn validate_order_json(record_json: &str) -> Result<String, JsValue> {
    let errors = validate_record(record_json).map_err(js_error)?;
    serde_json::to_string(&errors).map_err(|e| js_error(e.to_string()))
}

/// Combined MOI + BDOI/BDDI excess
#[wasm_bindgen]
pub fn moi_plus_broken(excess_moisture: &str, excess_broken: &str) -> String {
    let quality = GrainQuality {
        excess_moisture: coerce_optional_decimal(excess_moisture),
        excess_broken: coerce_optional_decimal(excess_broken),
        ..Default::default()
    };
    quality.moi_plus_broken().to_string()
}

fn settle_record(record_json: &str) -> Result<OrderSettlement, String> {
    let form = parse_record(record_json)?;
    Ok(calculator().settle(&form.record))
}

/// Non-numeric decimals are reported as `InvalidValue` rather than thrown
fn validate_record(record_json: &str) -> Result<Vec<ValidationError>, String> {
    Ok(parse_record(record_json)?.validate())
}

fn parse_record(record_json: &str) -> Result<OrderForm, String> {
    OrderForm::from_json(record_json).map_err(|e| format!("Invalid order JSON: {}", e))
}

fn js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}
