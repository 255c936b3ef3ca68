// Service exports
pub mod airtable;
pub mod cache;
pub mod geocode;
pub mod schema;
pub mod store;

pub use airtable::{AirtableClient, AirtableTables};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use geocode::{GeocodeClient, GeocodeError};
pub use store::{MatchStore, StoreError};
