//! Domain models for order settlement

mod deduction;
mod measurement;
mod order;
mod quality;
mod settlement;

pub use deduction::*;
pub use measurement::*;
pub use order::*;
pub use quality::*;
pub use settlement::*;
