//! Confirmed purchase/sales order records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::{used_deductions, OrderMeasurement, OrderSettlement, OtherDeduction, QualityReport};
use crate::types::{Commodity, OrderSide};

/// An order as assembled by a confirm-order form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedOrderRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub side: OrderSide,
    pub invoice_number: Option<String>,
    pub vehicle_number: Option<String>,
    pub commodity: Option<Commodity>,
    pub variety: Option<String>,
    /// Supplier on purchases, customer on sales
    pub party_name: Option<String>,
    pub warehouse: Option<String>,
    pub sauda_date: Option<NaiveDate>,
    #[serde(default)]
    pub measurement: OrderMeasurement,
    pub quality: Option<QualityReport>,
    #[serde(default)]
    pub other_deductions: Vec<OtherDeduction>,
    pub rate_per_mt: Option<Decimal>,
    #[serde(default)]
    pub stage: OrderStage,
}

/// Lifecycle of an order record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    #[default]
    Draft,
    Validated,
    Settled,
    Persisted,
}

impl OrderStage {
    /// Stages only move forward one step at a time. A persisted order may
    /// be settled again, which replaces its settlement.
    pub fn can_transition_to(&self, next: OrderStage) -> bool {
        matches!(
            (self, next),
            (OrderStage::Draft, OrderStage::Validated)
                | (OrderStage::Validated, OrderStage::Settled)
                | (OrderStage::Settled, OrderStage::Persisted)
                | (OrderStage::Persisted, OrderStage::Settled)
        )
    }

    pub fn transition_to(self, next: OrderStage) -> Result<OrderStage, StageTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StageTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for OrderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStage::Draft => write!(f, "Draft"),
            OrderStage::Validated => write!(f, "Validated"),
            OrderStage::Settled => write!(f, "Settled"),
            OrderStage::Persisted => write!(f, "Persisted"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot move order from {from} to {to}")]
pub struct StageTransitionError {
    pub from: OrderStage,
    pub to: OrderStage,
}

/// Document handed to the persistence backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedOrderPayload {
    /// Assigned before the first write so a repeated write hits the same row
    pub id: Uuid,
    pub invoice_number: Option<String>,
    pub vehicle_number: Option<String>,
    pub commodity: Option<Commodity>,
    pub variety: Option<String>,
    pub party_name: Option<String>,
    pub warehouse: Option<String>,
    pub sauda_date: Option<NaiveDate>,
    pub gross_weight_mt: Option<Decimal>,
    pub tare_weight_mt: Option<Decimal>,
    pub no_of_bags: u32,
    pub net_weight_mt: Decimal,
    pub rate_per_mt: Decimal,
    pub gross_amount: Decimal,
    pub total_deduction: Decimal,
    pub net_amount: Decimal,
    pub other_deductions: Vec<OtherDeduction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Value>,
}

impl ConfirmedOrderPayload {
    /// Freeze a record and its settlement into the persisted shape.
    /// Zero-amount other deductions are left out.
    pub fn from_settled(
        id: Uuid,
        record: &ConfirmedOrderRecord,
        settlement: &OrderSettlement,
    ) -> Self {
        Self {
            id,
            invoice_number: record.invoice_number.clone(),
            vehicle_number: record
                .vehicle_number
                .as_deref()
                .map(crate::validation::normalize_vehicle_number),
            commodity: record.commodity,
            variety: record.variety.clone(),
            party_name: record.party_name.clone(),
            warehouse: record.warehouse.clone(),
            sauda_date: record.sauda_date,
            gross_weight_mt: record.measurement.gross_weight_mt,
            tare_weight_mt: record.measurement.tare_weight_mt,
            no_of_bags: record.measurement.no_of_bags,
            net_weight_mt: settlement.net_weight_mt,
            rate_per_mt: settlement.rate_per_mt,
            gross_amount: settlement.gross_amount,
            total_deduction: settlement.total_deduction,
            net_amount: settlement.net_amount,
            other_deductions: used_deductions(&record.other_deductions),
            quality: record.quality.as_ref().map(|q| q.to_wire_fields(record.side)),
        }
    }
}
