//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment: programmatic defaults, YAML
//! project files, and MAGELLAN_* environment overrides, validated into the
//! typed `Config` tree.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
