//! Rally Storage Library
//!
//! Persistence for the signed-in profile's avatar and banner references. The
//! backend (`RemoteProfileStore` in `rally-api-client`) is the source of truth;
//! this crate adds a JSON file store for offline use and a wrapper that falls
//! back to it when the backend cannot be reached.

pub mod factory;
pub mod fallback;
#[cfg(feature = "storage-local")]
pub mod local;

pub use factory::create_profile_store;
pub use fallback::ProfileStore;
#[cfg(feature = "storage-local")]
pub use local::LocalProfileStore;
pub use rally_core::{DataMode, ProfileMediaStore, StoreError};
