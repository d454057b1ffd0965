//! Itemized deductions outside the quality parameters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A free-form deduction (short weight, gunny cost, unloading, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OtherDeduction {
    pub amount: Decimal,
    #[serde(default)]
    pub remarks: String,
}

impl OtherDeduction {
    pub fn new(amount: Decimal, remarks: impl Into<String>) -> Self {
        Self {
            amount,
            remarks: remarks.into(),
        }
    }

    /// Only positive amounts take part in a settlement
    pub fn is_used(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn has_remark(&self) -> bool {
        !self.remarks.trim().is_empty()
    }
}

/// Drop the entries that were left at zero
pub fn used_deductions(deductions: &[OtherDeduction]) -> Vec<OtherDeduction> {
    deductions.iter().filter(|d| d.is_used()).cloned().collect()
}
