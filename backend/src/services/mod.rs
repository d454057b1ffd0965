//! Business logic services for the settlement server

pub mod reporting;
pub mod settlement;

pub use reporting::ReportingService;
pub use settlement::{RetryPolicy, SettlementService};
