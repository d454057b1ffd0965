//! External API integrations

pub mod order_store;

pub use order_store::{OrderStore, OrderStoreClient};
