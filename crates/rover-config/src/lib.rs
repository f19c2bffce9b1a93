//! # rover-config
//!
//! Robot configuration documents: the snapshot schema, one-time validation
//! and normalization, and the JSON loader used for file-sourced configs.

pub mod loader;
pub mod schema;

pub use loader::{from_bytes, read_config, resolve_path};
pub use schema::{CloudConfig, Config, ResourceConfig};
