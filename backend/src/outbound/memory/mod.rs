//! In-process adapters for the scan store and identity provider.
//!
//! Both keep state for the lifetime of the process only; they back local
//! runs and tests, and give the HTTP and WebSocket adapters a live feed.

mod identity_provider;
mod scan_store;

pub use identity_provider::InMemoryIdentityProvider;
pub use scan_store::InMemoryScanStore;
