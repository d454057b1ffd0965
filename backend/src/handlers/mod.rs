//! HTTP handlers

pub mod deductions;
pub mod health;
pub mod reporting;
pub mod settlement;

#[cfg(test)]
mod tests;

pub use deductions::*;
pub use health::*;
pub use reporting::*;
pub use settlement::*;
