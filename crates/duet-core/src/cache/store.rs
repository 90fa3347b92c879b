//! Preference store trait.

use super::model::{BundleUpdate, CacheBundle};

/// Durable key-value store for the current user's [`CacheBundle`].
///
/// Implementations never fail loudly: a read error is logged and reported as
/// "nothing cached", a write error is logged and dropped. Front-ends can always
/// fall back to asking the user again.
pub trait PreferenceStore: Send + Sync {
    /// The key under which the current machine/user is stored.
    fn fingerprint(&self) -> &str;

    /// Returns the bundle for the current fingerprint, if any.
    fn load(&self) -> Option<CacheBundle>;

    /// Merges `update` into the stored bundle. Returns whether the write landed.
    fn save(&self, update: BundleUpdate) -> bool;
}
