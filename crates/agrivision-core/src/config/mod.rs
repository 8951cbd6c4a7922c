//! Configuration system for the chat proxy
//!
//! YAML-backed settings for the upstream model, the retention policy and the
//! session lifecycle, with environment resolution for the API key.

pub mod loader;
pub mod types;


pub use loader::ConfigLoader;
pub use types::*;
