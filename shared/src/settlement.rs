//! Order settlement calculation
//!
//! Turns a measurement, quality deduction lines, itemized deductions and a
//! rate into gross amount, total deduction and net amount. Everything here
//! is a pure function of its inputs, so recomputing on every form change
//! always lands on the same figures.

use rust_decimal::Decimal;

use crate::deduction_table::QualityDeductionTable;
use crate::models::{
    ConfirmedOrderRecord, OrderMeasurement, OrderSettlement, OtherDeduction, QualityReading,
    QualityReport, SettlementWarning, PARAM_DAMAGE_DISCOLOR, PARAM_HLW, PARAM_MOISTURE,
};
use crate::types::{round_money, OrderSide};

/// Gross amount for a net weight at a rate, zero when the rate is not positive
/// or the product does not fit a decimal.
pub fn gross_amount(net_weight_mt: Decimal, rate_per_mt: Decimal) -> Decimal {
    checked_gross_amount(net_weight_mt, rate_per_mt).unwrap_or_else(|| round_money(Decimal::ZERO))
}

/// Gross amount, or `None` when the product overflows
pub fn checked_gross_amount(net_weight_mt: Decimal, rate_per_mt: Decimal) -> Option<Decimal> {
    if rate_per_mt <= Decimal::ZERO {
        return Some(round_money(Decimal::ZERO));
    }
    net_weight_mt.checked_mul(rate_per_mt).map(round_money)
}

fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .map(round_money)
}

/// Compute the settlement of one order.
///
/// Quality deductions below zero count as zero and other deductions only
/// count when their amount is positive. A negative net amount is kept as
/// is and flagged. Figures too large for a decimal zero every amount and
/// raise [`SettlementWarning::AmountOverflow`].
pub fn compute_settlement(
    measurement: &OrderMeasurement,
    quality_readings: &[QualityReading],
    other_deductions: &[OtherDeduction],
    rate_per_mt: Decimal,
) -> OrderSettlement {
    let mut warnings = Vec::new();
    let net_weight_mt = measurement.net_weight_mt();

    if rate_per_mt <= Decimal::ZERO {
        warnings.push(SettlementWarning::RateNotPositive);
    }
    let Some(figures) = settle_amounts(
        net_weight_mt,
        rate_per_mt,
        quality_readings,
        other_deductions,
    ) else {
        let zero = round_money(Decimal::ZERO);
        warnings.push(SettlementWarning::AmountOverflow);
        return OrderSettlement {
            net_weight_mt,
            rate_per_mt,
            gross_amount: zero,
            quality_deduction: zero,
            other_deduction: zero,
            total_deduction: zero,
            net_amount: zero,
            warnings,
        };
    };
    let (gross_amount, quality_deduction, other_deduction, total_deduction, net_amount) = figures;

    if net_amount < Decimal::ZERO {
        warnings.push(SettlementWarning::NegativeNetAmount);
    }

    OrderSettlement {
        net_weight_mt,
        rate_per_mt,
        gross_amount,
        quality_deduction,
        other_deduction,
        total_deduction,
        net_amount,
        warnings,
    }
}

/// Gross, quality, other, total and net amounts with checked arithmetic
fn settle_amounts(
    net_weight_mt: Decimal,
    rate_per_mt: Decimal,
    quality_readings: &[QualityReading],
    other_deductions: &[OtherDeduction],
) -> Option<(Decimal, Decimal, Decimal, Decimal, Decimal)> {
    let gross_amount = checked_gross_amount(net_weight_mt, rate_per_mt)?;
    let quality_deduction = checked_sum(
        quality_readings
            .iter()
            .map(|r| r.deduction_amount.max(Decimal::ZERO)),
    )?;
    let other_deduction = checked_sum(
        other_deductions
            .iter()
            .filter(|d| d.is_used())
            .map(|d| d.amount),
    )?;
    let total_deduction = quality_deduction.checked_add(other_deduction)?;
    let net_amount = gross_amount.checked_sub(total_deduction)?;
    Some((
        gross_amount,
        quality_deduction,
        other_deduction,
        total_deduction,
        net_amount,
    ))
}

/// Settlement calculator shared by every order form, parameterized by
/// commodity and trade side.
#[derive(Debug, Clone, Default)]
pub struct SettlementCalculator {
    table: QualityDeductionTable,
}

impl SettlementCalculator {
    pub fn new(table: QualityDeductionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &QualityDeductionTable {
        &self.table
    }

    /// Build the quality deduction lines for a report. Admin-entered amounts
    /// are taken as is; missing ones are filled from the deduction table.
    pub fn resolve_quality_readings(
        &self,
        side: OrderSide,
        quality: &QualityReport,
        gross_amount: Decimal,
    ) -> Vec<QualityReading> {
        let commodity = quality.commodity();
        let suggest = |parameter: &str, value: Option<Decimal>| match value {
            Some(value) => {
                self.table
                    .lookup_deduction_for(side, commodity, parameter, value, gross_amount)
            }
            None => Decimal::ZERO,
        };

        match quality {
            QualityReport::Wheat(q) => vec![
                QualityReading::new(
                    PARAM_HLW,
                    q.hlw,
                    q.hlw_deduction.unwrap_or_else(|| suggest(PARAM_HLW, q.hlw)),
                ),
                QualityReading::new(
                    PARAM_MOISTURE,
                    q.moisture,
                    q.moisture_deduction
                        .unwrap_or_else(|| suggest(PARAM_MOISTURE, q.moisture)),
                ),
            ],
            QualityReport::Paddy(q) | QualityReport::Maize(q) => {
                let amount = q.moi_plus_broken_deduction.unwrap_or_else(|| {
                    suggest(PARAM_MOISTURE, q.moisture)
                        .saturating_add(suggest(PARAM_DAMAGE_DISCOLOR, q.broken))
                });
                vec![QualityReading::new(
                    format!("moi_plus_{}", side.broken_grain_field()),
                    Some(q.moi_plus_broken()),
                    amount,
                )]
            }
        }
    }

    /// Settle a whole order record
    pub fn settle(&self, record: &ConfirmedOrderRecord) -> OrderSettlement {
        let rate_per_mt = record.rate_per_mt.unwrap_or(Decimal::ZERO);
        let gross = gross_amount(record.measurement.net_weight_mt(), rate_per_mt);
        let readings = record
            .quality
            .as_ref()
            .map(|quality| self.resolve_quality_readings(record.side, quality, gross))
            .unwrap_or_default();

        compute_settlement(
            &record.measurement,
            &readings,
            &record.other_deductions,
            rate_per_mt,
        )
    }
}
