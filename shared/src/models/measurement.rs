//! Physical measurement of a consignment

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::weight::reconcile;

/// Per-transaction weighbridge facts, all weights in MT
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderMeasurement {
    pub gross_weight_mt: Option<Decimal>,
    pub tare_weight_mt: Option<Decimal>,
    /// Net weight typed in by the operator; only used when gross or tare is missing
    #[serde(default, alias = "net_weight_mt")]
    pub manual_net_weight_mt: Option<Decimal>,
    #[serde(default)]
    pub no_of_bags: u32,
}

impl OrderMeasurement {
    /// Measurement with the net weight entered directly
    pub fn with_net_weight(net_weight_mt: Decimal) -> Self {
        Self {
            manual_net_weight_mt: Some(net_weight_mt),
            ..Default::default()
        }
    }

    /// Measurement derived from weighbridge gross and tare
    pub fn from_weighbridge(gross_weight_mt: Decimal, tare_weight_mt: Decimal) -> Self {
        Self {
            gross_weight_mt: Some(gross_weight_mt),
            tare_weight_mt: Some(tare_weight_mt),
            ..Default::default()
        }
    }

    pub fn net_weight_mt(&self) -> Decimal {
        reconcile(
            self.gross_weight_mt,
            self.tare_weight_mt,
            self.manual_net_weight_mt,
        )
    }

    /// Whether a net weight can be determined at all
    pub fn has_net_weight(&self) -> bool {
        (self.gross_weight_mt.is_some() && self.tare_weight_mt.is_some())
            || self.manual_net_weight_mt.is_some()
    }
}
