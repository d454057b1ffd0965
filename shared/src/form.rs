//! Order records as typed on a form
//!
//! Decimal fields may arrive as JSON numbers or as text. Text that is not a
//! number is read as zero, the way a numeric input does, and reported as an
//! `InvalidValue` problem on that field instead of failing the whole record.

use serde_json::{Map, Value};

use crate::models::ConfirmedOrderRecord;
use crate::types::parse_decimal;
use crate::validation::{validate_order, ErrorKind, ValidationError};

const RECORD_DECIMALS: &[&str] = &["rate_per_mt"];

const MEASUREMENT_DECIMALS: &[&str] = &[
    "gross_weight_mt",
    "tare_weight_mt",
    "manual_net_weight_mt",
    "net_weight_mt",
];

const QUALITY_DECIMALS: &[&str] = &[
    "hlw",
    "excess_hlw",
    "moisture",
    "excess_moisture",
    "hlw_deduction",
    "moisture_deduction",
    "broken",
    "bdoi",
    "bddi",
    "excess_broken",
    "excess_bdoi",
    "excess_bddi",
    "moi_plus_broken_deduction",
    "moi_plus_bdoi_deduction",
    "moi_plus_bddi_deduction",
];

/// A decoded order record and the input problems found while decoding it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderForm {
    pub record: ConfirmedOrderRecord,
    /// Fields whose value was not a number
    pub input_errors: Vec<ValidationError>,
}

impl From<ConfirmedOrderRecord> for OrderForm {
    fn from(record: ConfirmedOrderRecord) -> Self {
        Self {
            record,
            input_errors: Vec::new(),
        }
    }
}

impl OrderForm {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Decode a record leniently. Only structural problems (wrong shapes,
    /// unknown commodity or side, bad dates) fail.
    pub fn from_value(mut value: Value) -> Result<Self, serde_json::Error> {
        let mut input_errors = Vec::new();

        if let Value::Object(record) = &mut value {
            normalize_fields(record, "", RECORD_DECIMALS, &mut input_errors);
            if let Some(Value::Object(measurement)) = record.get_mut("measurement") {
                normalize_fields(measurement, "", MEASUREMENT_DECIMALS, &mut input_errors);
            }
            if let Some(Value::Object(quality)) = record.get_mut("quality") {
                normalize_fields(quality, "quality.", QUALITY_DECIMALS, &mut input_errors);
            }
            if let Some(Value::Array(deductions)) = record.get_mut("other_deductions") {
                for (index, deduction) in deductions.iter_mut().enumerate() {
                    if let Value::Object(deduction) = deduction {
                        if let Some(amount) = deduction.get_mut("amount") {
                            let field = format!("other_deductions[{}].amount", index);
                            normalize_decimal(amount, &field, true, &mut input_errors);
                        }
                    }
                }
            }
        }

        let record = serde_json::from_value(value)?;
        Ok(Self {
            record,
            input_errors,
        })
    }

    /// Input problems followed by the record's own validation problems.
    /// A field already reported as non-numeric is not reported again.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.input_errors.clone();
        errors.extend(
            validate_order(&self.record)
                .into_iter()
                .filter(|e| !self.input_errors.iter().any(|i| i.field == e.field)),
        );
        errors
    }
}

fn normalize_fields(
    object: &mut Map<String, Value>,
    prefix: &str,
    keys: &[&str],
    errors: &mut Vec<ValidationError>,
) {
    for key in keys {
        if let Some(value) = object.get_mut(*key) {
            let name = if *key == "manual_net_weight_mt" {
                "net_weight_mt"
            } else {
                key
            };
            normalize_decimal(value, &format!("{}{}", prefix, name), false, errors);
        }
    }
}

/// Rewrite a decimal field as canonical decimal text. Empty text means
/// "not supplied" (zero when the field is required).
fn normalize_decimal(
    value: &mut Value,
    field: &str,
    required: bool,
    errors: &mut Vec<ValidationError>,
) {
    let is_text = value.is_string();
    let raw = match value {
        Value::Null => return,
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    };

    *value = match parse_decimal(&raw) {
        Some(decimal) => Value::String(decimal.to_string()),
        None if is_text && raw.trim().is_empty() => {
            if required {
                Value::String("0".to_string())
            } else {
                Value::Null
            }
        }
        None => {
            errors.push(ValidationError::new(
                ErrorKind::InvalidValue,
                field,
                "Value must be a number",
            ));
            Value::String("0".to_string())
        }
    };
}
