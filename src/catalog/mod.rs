pub mod client;
pub mod record;
mod retry;
pub mod sign;
pub mod types;

pub use client::CatalogClient;
pub use record::{Money, ProductRecord, Seller, ShippingEstimate};
