//! # rover-core
//!
//! Shared vocabulary for the Rover workspace: the unified error type and the
//! debug-state reporting capability that configuration watchers write to.

pub mod debug;
pub mod error;

pub use debug::{DebugReporter, ProcessDebugFlags};
pub use error::{Result, RoverError};
