//! Settlement engine for the agricultural commodity trading console
//!
//! This crate holds the order settlement core shared between the backend
//! service and browser frontends (via WASM): weight reconciliation, the
//! quality deduction table, the settlement calculator, lenient decoding of
//! order forms and order validation.

pub mod deduction_table;
pub mod form;
pub mod models;
pub mod settlement;
pub mod types;
pub mod validation;
pub mod weight;

pub use deduction_table::*;
pub use form::*;
pub use models::*;
pub use settlement::*;
pub use types::*;
pub use validation::*;
pub use weight::*;
