//! Validation of confirmed-order records
//!
//! Validation is advisory: it reports every problem it finds and never
//! touches the record. Callers decide whether to block submission.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{ConfirmedOrderRecord, OtherDeduction};
use crate::settlement::checked_gross_amount;

/// Category of a validation problem
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A positive other-deduction without a remark
    MissingRemark,
    /// A mandatory commercial or logistics field is absent
    MissingRequiredField,
    /// A number is negative where it must not be, or otherwise unusable
    InvalidValue,
    /// Rate per MT is zero or negative
    RateNotPositive,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingRemark => "MISSING_REMARK",
            ErrorKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorKind::InvalidValue => "INVALID_VALUE",
            ErrorKind::RateNotPositive => "RATE_NOT_POSITIVE",
        }
    }
}

/// One problem found on a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

// ============================================================================
// Order Record Validation
// ============================================================================

/// Check a record against the submission rules
pub fn validate_order(record: &ConfirmedOrderRecord) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    require_text(&mut errors, "invoice_number", record.invoice_number.as_deref());
    require_text(&mut errors, "vehicle_number", record.vehicle_number.as_deref());

    if record.commodity.is_none() {
        errors.push(ValidationError::new(
            ErrorKind::MissingRequiredField,
            "commodity",
            "Commodity is required",
        ));
    }

    match record.rate_per_mt {
        None => errors.push(ValidationError::new(
            ErrorKind::MissingRequiredField,
            "rate_per_mt",
            "Rate per MT is required",
        )),
        Some(rate) => {
            if validate_rate_per_mt(rate).is_err() {
                errors.push(ValidationError::new(
                    ErrorKind::RateNotPositive,
                    "rate_per_mt",
                    "Rate per MT must be greater than zero",
                ));
            }
        }
    }

    let measurement = &record.measurement;
    if let Some(rate) = record.rate_per_mt {
        if checked_gross_amount(measurement.net_weight_mt(), rate).is_none() {
            errors.push(ValidationError::new(
                ErrorKind::InvalidValue,
                "rate_per_mt",
                "Net weight times rate is too large to settle",
            ));
        }
    }
    if !measurement.has_net_weight() {
        errors.push(ValidationError::new(
            ErrorKind::MissingRequiredField,
            "net_weight_mt",
            "Net weight is required",
        ));
    }
    check_non_negative(&mut errors, "gross_weight_mt", measurement.gross_weight_mt);
    check_non_negative(&mut errors, "tare_weight_mt", measurement.tare_weight_mt);
    check_non_negative(&mut errors, "net_weight_mt", measurement.manual_net_weight_mt);

    if let Some(quality) = &record.quality {
        if let Some(commodity) = record.commodity {
            if quality.commodity() != commodity {
                errors.push(ValidationError::new(
                    ErrorKind::InvalidValue,
                    "quality",
                    format!(
                        "Quality report is for {} but the order is for {}",
                        quality.commodity(),
                        commodity
                    ),
                ));
            }
        }
        for (name, value) in quality.measured_values() {
            check_non_negative(&mut errors, &format!("quality.{}", name), value);
        }
    }

    for (index, deduction) in record.other_deductions.iter().enumerate() {
        errors.extend(validate_other_deduction(index, deduction));
    }

    errors
}

/// Whether a record with these errors may be submitted
pub fn is_submittable(errors: &[ValidationError]) -> bool {
    errors.is_empty()
}

fn validate_other_deduction(index: usize, deduction: &OtherDeduction) -> Option<ValidationError> {
    if deduction.amount < Decimal::ZERO {
        return Some(ValidationError::new(
            ErrorKind::InvalidValue,
            format!("other_deductions[{}].amount", index),
            "Deduction amount cannot be negative",
        ));
    }
    validate_remark(deduction.amount, &deduction.remarks)
        .err()
        .map(|message| {
            ValidationError::new(
                ErrorKind::MissingRemark,
                format!("other_deductions[{}].remarks", index),
                message,
            )
        })
}

fn require_text(errors: &mut Vec<ValidationError>, field: &str, value: Option<&str>) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.push(ValidationError::new(
            ErrorKind::MissingRequiredField,
            field,
            format!("{} is required", field),
        ));
    }
}

fn check_non_negative(errors: &mut Vec<ValidationError>, field: &str, value: Option<Decimal>) {
    if let Some(value) = value {
        if let Err(message) = validate_non_negative(value) {
            errors.push(ValidationError::new(ErrorKind::InvalidValue, field, message));
        }
    }
}

// ============================================================================
// Field Validations
// ============================================================================

/// A positive deduction must say what it is for
pub fn validate_remark(amount: Decimal, remarks: &str) -> Result<(), &'static str> {
    if amount > Decimal::ZERO && remarks.trim().is_empty() {
        return Err("Remarks are required when a deduction amount is entered");
    }
    Ok(())
}

/// Validate rate per MT is usable for a gross amount
pub fn validate_rate_per_mt(rate: Decimal) -> Result<(), &'static str> {
    if rate <= Decimal::ZERO {
        return Err("Rate per MT must be greater than zero");
    }
    Ok(())
}

/// Validate a weight, percentage or amount is not negative
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

/// Canonical vehicle registration: uppercase, no spaces or dashes.
/// Accepts: "mh 12 ab 1234", "MH-12-AB-1234"
pub fn normalize_vehicle_number(vehicle_number: &str) -> String {
    vehicle_number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}
