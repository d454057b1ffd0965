//! Settlement result models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Computed financial result of one order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSettlement {
    pub net_weight_mt: Decimal,
    pub rate_per_mt: Decimal,
    pub gross_amount: Decimal,
    /// Sum of the quality-parameter deductions
    pub quality_deduction: Decimal,
    /// Sum of the itemized other deductions that were used
    pub other_deduction: Decimal,
    pub total_deduction: Decimal,
    /// May be negative; see [`SettlementWarning::NegativeNetAmount`]
    pub net_amount: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SettlementWarning>,
}

impl OrderSettlement {
    pub fn has_warning(&self, warning: SettlementWarning) -> bool {
        self.warnings.contains(&warning)
    }
}

/// Conditions the calculator flags instead of failing on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettlementWarning {
    /// Rate per MT was zero or negative; gross amount was zeroed
    RateNotPositive,
    /// Deductions exceed the gross amount
    NegativeNetAmount,
    /// Figures too large to represent; every amount was zeroed
    AmountOverflow,
}

impl std::fmt::Display for SettlementWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementWarning::RateNotPositive => write!(f, "Rate per MT must be greater than zero"),
            SettlementWarning::NegativeNetAmount => {
                write!(f, "Total deduction exceeds the gross amount")
            }
            SettlementWarning::AmountOverflow => write!(f, "Amounts are too large to settle"),
        }
    }
}

/// Running totals over a set of settlements
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettlementTotals {
    pub order_count: u64,
    pub net_weight_mt: Decimal,
    pub gross_amount: Decimal,
    pub total_deduction: Decimal,
    pub net_amount: Decimal,
    /// Set when a settlement could not be added without overflowing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SettlementWarning>,
}

impl SettlementTotals {
    /// Add one settlement. If any running figure would overflow, the
    /// settlement's amounts are left out and the totals are flagged.
    pub fn add(&mut self, settlement: &OrderSettlement) {
        self.order_count += 1;
        let sums = (
            self.net_weight_mt.checked_add(settlement.net_weight_mt),
            self.gross_amount.checked_add(settlement.gross_amount),
            self.total_deduction.checked_add(settlement.total_deduction),
            self.net_amount.checked_add(settlement.net_amount),
        );
        match sums {
            (Some(net_weight_mt), Some(gross_amount), Some(total_deduction), Some(net_amount)) => {
                self.net_weight_mt = net_weight_mt;
                self.gross_amount = gross_amount;
                self.total_deduction = total_deduction;
                self.net_amount = net_amount;
            }
            _ => {
                if !self.warnings.contains(&SettlementWarning::AmountOverflow) {
                    self.warnings.push(SettlementWarning::AmountOverflow);
                }
            }
        }
    }

    pub fn from_settlements<'a>(settlements: impl IntoIterator<Item = &'a OrderSettlement>) -> Self {
        let mut totals = Self::default();
        for settlement in settlements {
            totals.add(settlement);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement(amount: Decimal) -> OrderSettlement {
        OrderSettlement {
            net_weight_mt: Decimal::ONE,
            rate_per_mt: amount,
            gross_amount: amount,
            quality_deduction: Decimal::ZERO,
            other_deduction: Decimal::ZERO,
            total_deduction: Decimal::ZERO,
            net_amount: amount,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_totals_skip_overflowing_settlement() {
        let big = settlement(Decimal::MAX);
        let small = settlement(Decimal::ONE_HUNDRED);
        let totals = SettlementTotals::from_settlements([&big, &big, &small]);

        assert_eq!(totals.order_count, 3);
        assert_eq!(totals.gross_amount, Decimal::MAX);
        assert_eq!(totals.warnings, vec![SettlementWarning::AmountOverflow]);
    }

    #[test]
    fn test_overflow_warning_text() {
        assert_eq!(
            SettlementWarning::AmountOverflow.to_string(),
            "Amounts are too large to settle"
        );
    }
}
