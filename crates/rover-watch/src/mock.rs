//! Test doubles for the watcher collaborators.
//!
//! No network or process-wide state: [`MockCloudReader`] replays queued
//! results and records every call, [`RecordingReporter`] records debug flags.

use async_trait::async_trait;
use parking_lot::Mutex;
use rover_config::Config;
use rover_core::{DebugReporter, Result, RoverError};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::time::Instant;

use crate::reader::CloudReader;

/// A recorded call to [`MockCloudReader::read`].
#[derive(Debug, Clone)]
pub struct ReadCall {
    pub at: Instant,
    pub previous: Option<Config>,
    pub check_cert: bool,
}

/// A cloud reader that returns pre-configured results.
///
/// Queued results are returned in order; once the queue is empty every read
/// returns the fallback config.
pub struct MockCloudReader {
    queued: Mutex<VecDeque<std::result::Result<Config, String>>>,
    fallback: Config,
    /// Every read received, for assertions in tests.
    pub calls: Arc<Mutex<Vec<ReadCall>>>,
}

impl MockCloudReader {
    pub fn new(fallback: Config) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful read.
    pub fn with_config(self, config: Config) -> Self {
        self.queued.lock().push_back(Ok(config));
        self
    }

    /// Queue a failed read.
    pub fn with_error(self, msg: &str) -> Self {
        self.queued.lock().push_back(Err(msg.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CloudReader for MockCloudReader {
    async fn read(
        &self,
        _config: &Config,
        previous: Option<&Config>,
        check_cert: bool,
    ) -> Result<Config> {
        self.calls.lock().push(ReadCall {
            at: Instant::now(),
            previous: previous.cloned(),
            check_cert,
        });
        match self.queued.lock().pop_front() {
            Some(Ok(config)) => Ok(config),
            Some(Err(msg)) => Err(RoverError::Cloud(msg)),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Records every debug flag a watcher reports.
#[derive(Default)]
pub struct RecordingReporter {
    pub cloud: Mutex<Vec<bool>>,
    pub file: Mutex<Vec<bool>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_cloud_debug(&self) -> Option<bool> {
        self.cloud.lock().last().copied()
    }

    pub fn last_file_debug(&self) -> Option<bool> {
        self.file.lock().last().copied()
    }
}

impl DebugReporter for RecordingReporter {
    fn set_cloud_debug(&self, debug: bool) {
        self.cloud.lock().push(debug);
    }

    fn set_file_debug(&self, debug: bool) {
        self.file.lock().push(debug);
    }
}
