pub mod cache_store;
pub mod config;
pub mod fingerprint;
pub mod logging;
pub mod paths;
pub mod storage;

pub use crate::cache_store::JsonCacheStore;
pub use crate::config::AppConfig;
pub use crate::fingerprint::MachineIdentity;
pub use crate::paths::DuetPaths;
