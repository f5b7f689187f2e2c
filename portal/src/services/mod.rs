//! Data-fetching services that sit between feature code and the typed API.
//!
//! `query_cache` keeps results per key and deduplicates concurrent fetches;
//! `hooks` pairs each query with its key and wires mutations to invalidation.

pub mod hooks;
pub mod query_cache;

pub use hooks::{keys, PortalQueries};
pub use query_cache::{QueryClient, QueryKey};
