//! User domain module.
//!
//! - `model`: the conversational preferences a user fills in once and reuses

mod model;

pub use model::{UNSET_TOKEN, UserPreferences};
