//! Quality deduction table
//!
//! Maps a measured quality parameter to a suggested deduction expressed as
//! a percentage of the gross amount. The bands are data, loaded from JSON,
//! and an admin-entered amount always wins over a suggestion.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PARAM_DAMAGE_DISCOLOR, PARAM_FOREIGN_MATTER, PARAM_HLW, PARAM_MOISTURE};
use crate::types::{round_money, Commodity, OrderSide};

const BUNDLED_TABLE: &str = include_str!("../data/default_deductions.json");

/// A single threshold band.
///
/// `above` bands catch readings over a threshold (moisture, foreign matter);
/// `below` bands catch readings under one (hectolitre weight). A band with
/// both bounds covers the range between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeductionBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<Decimal>,
    /// Whether a value equal to a bound falls into the band
    #[serde(default)]
    pub inclusive: bool,
    pub percent_of_gross: Decimal,
}

impl DeductionBand {
    /// Band for readings over `threshold`
    pub fn above(threshold: Decimal, percent_of_gross: Decimal) -> Self {
        Self {
            above: Some(threshold),
            below: None,
            inclusive: false,
            percent_of_gross,
        }
    }

    /// Band for readings under `threshold`
    pub fn below(threshold: Decimal, percent_of_gross: Decimal) -> Self {
        Self {
            above: None,
            below: Some(threshold),
            inclusive: false,
            percent_of_gross,
        }
    }

    pub fn inclusive(mut self) -> Self {
        self.inclusive = true;
        self
    }

    pub fn matches(&self, value: Decimal) -> bool {
        let over = self
            .above
            .map_or(true, |t| value > t || (self.inclusive && value == t));
        let under = self
            .below
            .map_or(true, |t| value < t || (self.inclusive && value == t));
        over && under
    }

    fn is_bounded(&self) -> bool {
        self.above.is_some() || self.below.is_some()
    }
}

/// Most severe band first: `above` bands from the highest threshold down,
/// then `below` bands from the lowest threshold up. Strict bands go before
/// inclusive ones on the same threshold.
fn band_order(a: &DeductionBand, b: &DeductionBand) -> Ordering {
    match (a.above, b.above) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.below.cmp(&b.below),
    }
    .then_with(|| a.inclusive.cmp(&b.inclusive))
}

/// Bands for one parameter of one commodity, optionally for one side only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeductionRule {
    pub commodity: Commodity,
    #[serde(default)]
    pub side: Option<OrderSide>,
    pub parameter: String,
    pub bands: Vec<DeductionBand>,
}

#[derive(Debug, Deserialize)]
struct TableDocument {
    rules: Vec<DeductionRule>,
}

#[derive(Debug, Error)]
pub enum DeductionTableError {
    #[error("invalid deduction table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("deduction rule for {commodity} has an empty parameter name")]
    EmptyParameter { commodity: Commodity },

    #[error("deduction band for {parameter} has a negative percentage")]
    NegativePercent { parameter: String },

    #[error("deduction band for {parameter} has neither an above nor a below threshold")]
    UnboundedBand { parameter: String },
}

/// Configurable lookup of suggested quality deductions
#[derive(Debug, Clone, PartialEq)]
pub struct QualityDeductionTable {
    rules: Vec<DeductionRule>,
}

impl QualityDeductionTable {
    /// A table that suggests nothing
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The bands shipped with the crate
    pub fn bundled() -> Result<Self, DeductionTableError> {
        Self::from_json(BUNDLED_TABLE)
    }

    pub fn from_json(json: &str) -> Result<Self, DeductionTableError> {
        let document: TableDocument = serde_json::from_str(json)?;
        Self::from_rules(document.rules)
    }

    /// Build a table, normalizing parameter names and ordering bands from
    /// the most severe down.
    pub fn from_rules(rules: Vec<DeductionRule>) -> Result<Self, DeductionTableError> {
        let mut normalized = Vec::with_capacity(rules.len());
        for mut rule in rules {
            rule.parameter = normalize_parameter(&rule.parameter);
            if rule.parameter.is_empty() {
                return Err(DeductionTableError::EmptyParameter {
                    commodity: rule.commodity,
                });
            }
            if rule.bands.iter().any(|b| b.percent_of_gross < Decimal::ZERO) {
                return Err(DeductionTableError::NegativePercent {
                    parameter: rule.parameter,
                });
            }
            if !rule.bands.iter().all(DeductionBand::is_bounded) {
                return Err(DeductionTableError::UnboundedBand {
                    parameter: rule.parameter,
                });
            }
            rule.bands.sort_by(band_order);
            normalized.push(rule);
        }
        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[DeductionRule] {
        &self.rules
    }

    /// Suggested deduction for a parameter, regardless of trade side
    pub fn lookup_deduction(
        &self,
        commodity: Commodity,
        parameter_name: &str,
        actual_value: Decimal,
        gross_amount: Decimal,
    ) -> Decimal {
        let parameter = normalize_parameter(parameter_name);
        let rule = self
            .find_rule(commodity, None, &parameter)
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|r| r.commodity == commodity && r.parameter == parameter)
            });
        apply_rule(rule, actual_value, gross_amount)
    }

    /// Suggested deduction for a parameter on one side of the trade.
    /// Side-specific rules take precedence over side-agnostic ones.
    pub fn lookup_deduction_for(
        &self,
        side: OrderSide,
        commodity: Commodity,
        parameter_name: &str,
        actual_value: Decimal,
        gross_amount: Decimal,
    ) -> Decimal {
        let parameter = normalize_parameter(parameter_name);
        let rule = self
            .find_rule(commodity, Some(side), &parameter)
            .or_else(|| self.find_rule(commodity, None, &parameter));
        apply_rule(rule, actual_value, gross_amount)
    }

    fn find_rule(
        &self,
        commodity: Commodity,
        side: Option<OrderSide>,
        parameter: &str,
    ) -> Option<&DeductionRule> {
        self.rules
            .iter()
            .find(|r| r.commodity == commodity && r.side == side && r.parameter == parameter)
    }
}

impl Default for QualityDeductionTable {
    /// The bundled table. Callers that need to report a broken bundle use
    /// [`QualityDeductionTable::bundled`] instead.
    fn default() -> Self {
        Self::bundled().unwrap_or_else(|_| Self::empty())
    }
}

fn apply_rule(rule: Option<&DeductionRule>, value: Decimal, gross_amount: Decimal) -> Decimal {
    let percent = rule
        .and_then(|r| r.bands.iter().find(|band| band.matches(value)))
        .map(|band| band.percent_of_gross)
        .unwrap_or(Decimal::ZERO);

    let share = percent / Decimal::ONE_HUNDRED;
    round_money(gross_amount.checked_mul(share).unwrap_or(Decimal::ZERO))
}

/// Canonical form of a parameter name as typed on a form
pub fn normalize_parameter(name: &str) -> String {
    let key: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    match key.as_str() {
        "moi" | "moisture_percent" => PARAM_MOISTURE.to_string(),
        "fm" | "foreign_matter_percent" => PARAM_FOREIGN_MATTER.to_string(),
        "damage" | "discolor" | "damage_discolour" | "damaged_discolored" => {
            PARAM_DAMAGE_DISCOLOR.to_string()
        }
        "hectolitre_weight" | "hectoliter_weight" => PARAM_HLW.to_string(),
        _ => key,
    }
}
