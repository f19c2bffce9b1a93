//! # rover-watch
//!
//! Background watchers that observe a robot configuration from exactly one
//! source (the cloud, a local file, or nothing) and stream validated
//! snapshots to a consumer so the process can reconfigure without restart.
//!
//! Each non-noop watcher owns one task. Deliveries are rendezvous handoffs:
//! a slow consumer stalls the watcher instead of building a backlog.
//!
//! ```rust,no_run
//! # async fn run(config: rover_config::Config) -> rover_core::Result<()> {
//! use std::sync::Arc;
//! use rover_core::ProcessDebugFlags;
//! use rover_watch::{HttpCloudReader, new_watcher};
//!
//! let mut watcher = new_watcher(
//!     config,
//!     Arc::new(HttpCloudReader::new()),
//!     Arc::new(ProcessDebugFlags),
//! )?;
//! while let Some(next) = watcher.config().recv().await {
//!     println!("{} components", next.components.len());
//! }
//! watcher.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod cloud;
pub mod debounce;
pub mod file;
pub mod mock;
pub mod noop;
pub mod reader;
pub mod stream;
pub mod watcher;

pub use cloud::CloudWatcher;
pub use debounce::Debouncer;
pub use file::FileWatcher;
pub use noop::NoopWatcher;
pub use reader::{CloudReader, HttpCloudReader};
pub use stream::ConfigStream;
pub use watcher::{ConfigSource, Watcher, new_watcher, select_source};
