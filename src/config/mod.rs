//! Configuration types and loading

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_str};
pub use types::{Config, PolicyMode, RuleRecord, TagOptions};
