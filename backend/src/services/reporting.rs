//! Reporting service for settlement summaries and data export

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{Commodity, ConfirmedOrderRecord, OrderSide, SettlementCalculator, SettlementTotals};

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    calculator: Arc<SettlementCalculator>,
}

/// One line of the settlement report. Amounts are written as decimal text.
#[derive(Debug, Serialize)]
pub struct SettlementReportRow {
    pub invoice_number: Option<String>,
    pub vehicle_number: Option<String>,
    pub side: OrderSide,
    pub commodity: Option<Commodity>,
    pub party_name: Option<String>,
    pub sauda_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::str")]
    pub net_weight_mt: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub rate_per_mt: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub gross_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quality_deduction: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub other_deduction: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_deduction: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub net_amount: Decimal,
    /// Settlement warnings joined with "; "
    pub warnings: String,
}

/// Settlement report with totals
#[derive(Debug, Serialize)]
pub struct SettlementReport {
    pub rows: Vec<SettlementReportRow>,
    pub totals: SettlementTotals,
}

impl ReportingService {
    pub fn new(calculator: Arc<SettlementCalculator>) -> Self {
        Self { calculator }
    }

    /// Settle each record and summarize
    pub fn settlement_report(&self, records: &[ConfirmedOrderRecord]) -> SettlementReport {
        let mut totals = SettlementTotals::default();
        let rows = records
            .iter()
            .map(|record| {
                let settlement = self.calculator.settle(record);
                totals.add(&settlement);
                SettlementReportRow {
                    invoice_number: record.invoice_number.clone(),
                    vehicle_number: record.vehicle_number.clone(),
                    side: record.side,
                    commodity: record.commodity,
                    party_name: record.party_name.clone(),
                    sauda_date: record.sauda_date,
                    net_weight_mt: settlement.net_weight_mt,
                    rate_per_mt: settlement.rate_per_mt,
                    gross_amount: settlement.gross_amount,
                    quality_deduction: settlement.quality_deduction,
                    other_deduction: settlement.other_deduction,
                    total_deduction: settlement.total_deduction,
                    net_amount: settlement.net_amount,
                    warnings: settlement
                        .warnings
                        .iter()
                        .map(|w| w.to_string())
                        .collect::<Vec<_>>()
                        .join("; "),
                }
            })
            .collect();

        SettlementReport { rows, totals }
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
