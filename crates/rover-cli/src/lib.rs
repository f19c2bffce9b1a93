//! # rover-cli
//!
//! Command-line interface for Rover.
//!
//! ## Commands
//!
//! - `rover watch` — Follow the configured source and log every new config
//! - `rover validate` — Check a config file
//! - `rover config` — Show the loaded configuration

pub mod commands;

pub use commands::Cli;
