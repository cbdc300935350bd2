pub mod schema;

pub use schema::{CatalogConfig, Config, ReliabilityConfig, ResolverConfig, TelegramConfig};
