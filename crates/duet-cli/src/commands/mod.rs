pub mod escape;
pub mod speak;
pub mod upload;
pub mod utils;
pub mod voices;
