//! Common types used across the settlement engine

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places kept on monetary amounts
pub const MONEY_DP: u32 = 2;

/// Decimal places kept on weights in metric tons
pub const WEIGHT_DP: u32 = 3;

/// Traded commodities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Commodity {
    Paddy,
    Wheat,
    Maize,
}

impl Commodity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commodity::Paddy => "paddy",
            Commodity::Wheat => "wheat",
            Commodity::Maize => "maize",
        }
    }
}

impl std::fmt::Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Commodity::Paddy => write!(f, "Paddy"),
            Commodity::Wheat => write!(f, "Wheat"),
            Commodity::Maize => write!(f, "Maize"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown commodity: {0}")]
pub struct ParseCommodityError(pub String);

impl FromStr for Commodity {
    type Err = ParseCommodityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paddy" => Ok(Commodity::Paddy),
            "wheat" => Ok(Commodity::Wheat),
            "maize" => Ok(Commodity::Maize),
            _ => Err(ParseCommodityError(s.to_string())),
        }
    }
}

/// Which side of the trade the order sits on.
///
/// `Purchase` orders are bought from a seller/supplier, `Sale` orders are
/// sold to a buyer/customer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    #[default]
    Purchase,
    Sale,
}

impl OrderSide {
    /// Field name used for the broken/damaged/discolored/immature reading
    pub fn broken_grain_field(&self) -> &'static str {
        match self {
            OrderSide::Purchase => "bddi",
            OrderSide::Sale => "bdoi",
        }
    }

    /// Collection name on the persistence backend
    pub fn endpoint(&self) -> &'static str {
        match self {
            OrderSide::Purchase => "confirmed-purchase-orders",
            OrderSide::Sale => "confirmed-sales-orders",
        }
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purchase" | "supplier" | "seller" => Ok(OrderSide::Purchase),
            "sale" | "sales" | "customer" | "buyer" => Ok(OrderSide::Sale),
            other => Err(format!("unknown order side: {}", other)),
        }
    }
}

/// Round a monetary amount to paise. The result always carries two places.
pub fn round_money(value: Decimal) -> Decimal {
    round_fixed(value, MONEY_DP)
}

/// Round a weight to kilogram precision (3 dp of a metric ton)
pub fn round_weight(value: Decimal) -> Decimal {
    round_fixed(value, WEIGHT_DP)
}

fn round_fixed(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

/// Parse a form field the way a numeric input does: anything that is not a
/// number becomes zero.
pub fn coerce_decimal(raw: &str) -> Decimal {
    coerce_optional_decimal(raw).unwrap_or(Decimal::ZERO)
}

/// Like [`coerce_decimal`], but an empty field means "not supplied".
pub fn coerce_optional_decimal(raw: &str) -> Option<Decimal> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(parse_decimal(raw).unwrap_or(Decimal::ZERO))
}

/// Strict parse of decimal text, plain or scientific. `None` for empty or
/// non-numeric text.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
