//! Per-machine preference cache.
//!
//! - `model`: the bundle stored under each fingerprint and the partial update
//!   merged into it
//! - `store`: the storage trait

mod model;
mod store;

pub use model::{BundleUpdate, CacheBundle};
pub use store::PreferenceStore;
