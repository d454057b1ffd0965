//! Quality report models for grain commodities

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Commodity, OrderSide};

/// Canonical quality parameter names
pub const PARAM_HLW: &str = "hlw";
pub const PARAM_MOISTURE: &str = "moisture";
pub const PARAM_FOREIGN_MATTER: &str = "foreign_matter";
pub const PARAM_DAMAGE_DISCOLOR: &str = "damage_discolor";

/// One deduction line derived from a quality parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityReading {
    pub parameter: String,
    pub actual_value: Option<Decimal>,
    pub deduction_amount: Decimal,
}

impl QualityReading {
    pub fn new(
        parameter: impl Into<String>,
        actual_value: Option<Decimal>,
        deduction_amount: Decimal,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            actual_value,
            deduction_amount,
        }
    }
}

/// Measured wheat parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WheatQuality {
    pub hlw: Option<Decimal>,
    pub excess_hlw: Option<Decimal>,
    pub moisture: Option<Decimal>,
    pub excess_moisture: Option<Decimal>,
    /// Admin-entered amount; `None` falls back to the deduction table
    pub hlw_deduction: Option<Decimal>,
    pub moisture_deduction: Option<Decimal>,
}

/// Measured paddy/maize parameters.
///
/// `broken` is the BDOI reading on sales and BDDI on purchases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GrainQuality {
    pub moisture: Option<Decimal>,
    pub excess_moisture: Option<Decimal>,
    #[serde(alias = "bdoi", alias = "bddi")]
    pub broken: Option<Decimal>,
    #[serde(alias = "excess_bdoi", alias = "excess_bddi")]
    pub excess_broken: Option<Decimal>,
    #[serde(alias = "moi_plus_bdoi_deduction", alias = "moi_plus_bddi_deduction")]
    pub moi_plus_broken_deduction: Option<Decimal>,
}

impl GrainQuality {
    /// Combined MOI + BDOI/BDDI excess, never entered by hand
    pub fn moi_plus_broken(&self) -> Decimal {
        self.excess_moisture
            .unwrap_or(Decimal::ZERO)
            .saturating_add(self.excess_broken.unwrap_or(Decimal::ZERO))
    }
}

/// Commodity-dependent quality report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "commodity", rename_all = "lowercase")]
pub enum QualityReport {
    Paddy(GrainQuality),
    Wheat(WheatQuality),
    Maize(GrainQuality),
}

impl QualityReport {
    pub fn commodity(&self) -> Commodity {
        match self {
            QualityReport::Paddy(_) => Commodity::Paddy,
            QualityReport::Wheat(_) => Commodity::Wheat,
            QualityReport::Maize(_) => Commodity::Maize,
        }
    }

    /// Every measured value with its field name, for range checks
    pub fn measured_values(&self) -> Vec<(&'static str, Option<Decimal>)> {
        match self {
            QualityReport::Wheat(q) => vec![
                ("hlw", q.hlw),
                ("excess_hlw", q.excess_hlw),
                ("moisture", q.moisture),
                ("excess_moisture", q.excess_moisture),
                ("hlw_deduction", q.hlw_deduction),
                ("moisture_deduction", q.moisture_deduction),
            ],
            QualityReport::Paddy(q) | QualityReport::Maize(q) => vec![
                ("moisture", q.moisture),
                ("excess_moisture", q.excess_moisture),
                ("broken", q.broken),
                ("excess_broken", q.excess_broken),
                ("moi_plus_broken_deduction", q.moi_plus_broken_deduction),
            ],
        }
    }

    /// Render the report with the field names each side of the trade uses
    pub fn to_wire_fields(&self, side: OrderSide) -> Value {
        let mut fields = Map::new();
        let mut put = |key: String, value: Option<Decimal>| {
            fields.insert(
                key,
                value.map_or(Value::Null, |v| Value::String(v.to_string())),
            );
        };

        match self {
            QualityReport::Wheat(q) => {
                put("hlw".into(), q.hlw);
                put("excess_hlw".into(), q.excess_hlw);
                put("moisture".into(), q.moisture);
                put("excess_moisture".into(), q.excess_moisture);
                put("hlw_deduction".into(), q.hlw_deduction);
                put("moisture_deduction".into(), q.moisture_deduction);
            }
            QualityReport::Paddy(q) | QualityReport::Maize(q) => {
                let broken = side.broken_grain_field();
                put("moisture".into(), q.moisture);
                put("excess_moisture".into(), q.excess_moisture);
                put(broken.to_string(), q.broken);
                put(format!("excess_{}", broken), q.excess_broken);
                put(format!("moi_plus_{}", broken), Some(q.moi_plus_broken()));
                put(
                    format!("moi_plus_{}_deduction", broken),
                    q.moi_plus_broken_deduction,
                );
            }
        }

        fields.insert(
            "commodity".into(),
            Value::String(self.commodity().as_str().to_string()),
        );
        Value::Object(fields)
    }
}
