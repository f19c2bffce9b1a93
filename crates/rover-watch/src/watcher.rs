use async_trait::async_trait;
use rover_config::Config;
use rover_core::{DebugReporter, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cloud::CloudWatcher;
use crate::file::FileWatcher;
use crate::noop::NoopWatcher;
use crate::reader::CloudReader;
use crate::stream::ConfigStream;

/// Watches one configuration source and streams new snapshots.
#[async_trait]
pub trait Watcher: Send {
    /// Which source this watcher observes.
    fn source(&self) -> ConfigSource;

    /// The delivery stream. The same stream for the watcher's whole life.
    fn config(&mut self) -> &mut ConfigStream;

    /// Cancel the background task and wait for it to exit, then release any
    /// OS subscription. A pending delivery is abandoned, not completed.
    async fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cloud,
    File,
    None,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Cloud => write!(f, "cloud"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::None => write!(f, "none"),
        }
    }
}

/// Pick the source to watch: cloud beats a local file beats nothing.
pub fn select_source(config: &Config) -> ConfigSource {
    if config.cloud.is_some() {
        ConfigSource::Cloud
    } else if config.config_file_path.is_some() {
        ConfigSource::File
    } else {
        ConfigSource::None
    }
}

/// Build the watcher for `config`'s source.
///
/// Validates `config` once before dispatching. Must be called from within a
/// Tokio runtime since non-noop watchers spawn their task immediately.
pub fn new_watcher(
    mut config: Config,
    reader: Arc<dyn CloudReader>,
    reporter: Arc<dyn DebugReporter>,
) -> Result<Box<dyn Watcher>> {
    config.ensure()?;
    let source = select_source(&config);
    info!(%source, "starting config watcher");
    match source {
        ConfigSource::Cloud => Ok(Box::new(CloudWatcher::new(config, reader, reporter)?)),
        ConfigSource::File => match config.config_file_path.take() {
            Some(path) => Ok(Box::new(FileWatcher::new(path, reporter)?)),
            None => Ok(Box::new(NoopWatcher::new())),
        },
        ConfigSource::None => Ok(Box::new(NoopWatcher::new())),
    }
}

/// The single background task of a watcher and its cancellation signal.
///
/// Dropping it cancels the task without waiting.
pub(crate) struct Background {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Background {
    pub(crate) fn spawn<F, Fut>(run: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(cancel.clone()));
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Cancel and wait until the task has fully unwound.
    pub(crate) async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "config watcher task ended abnormally");
            }
        }
    }
}

impl Drop for Background {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
