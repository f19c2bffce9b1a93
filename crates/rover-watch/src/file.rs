use async_trait::async_trait;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use rover_core::{DebugReporter, Result, RoverError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::debounce::Debouncer;
use crate::stream::{ConfigSender, ConfigStream};
use crate::watcher::{Background, ConfigSource, Watcher};

const EVENT_BUFFER: usize = 16;

/// Fetches new configs from a local file as soon as it is written to.
///
/// Bursts of writes are debounced, and a write that leaves the file's bytes
/// unchanged since the last delivery is ignored.
pub struct FileWatcher {
    stream: ConfigStream,
    background: Background,
    /// Taken and dropped by `close`, which tears down the OS watcher instance.
    fs_watcher: Option<RecommendedWatcher>,
    path: PathBuf,
}

impl FileWatcher {
    /// Subscribe to changes of `path`. Fails if the path cannot be watched,
    /// e.g. because it does not exist.
    pub fn new(path: PathBuf, reporter: Arc<dyn DebugReporter>) -> Result<Self> {
        // Bridge the sync notify callback into the async task.
        let (event_tx, events) = mpsc::channel::<notify::Result<Event>>(EVENT_BUFFER);
        let mut fs_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // A full buffer already holds a pending trigger for the debouncer.
            let _ = event_tx.try_send(res);
        })
        .map_err(|e| RoverError::Watch(format!("failed to create file watcher: {e}")))?;
        fs_watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| RoverError::Watch(format!("failed to watch {}: {e}", path.display())))?;

        info!(path = %path.display(), "watching config file");

        let (sender, stream) = ConfigStream::rendezvous();
        let task_path = path.clone();
        let background = Background::spawn(move |cancel| {
            let reloader = Reloader {
                path: task_path,
                events,
                reporter,
                sender,
                cancel,
                last_raw: None,
            };
            reloader.run()
        });

        Ok(Self {
            stream,
            background,
            fs_watcher: Some(fs_watcher),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Watcher for FileWatcher {
    fn source(&self) -> ConfigSource {
        ConfigSource::File
    }

    fn config(&mut self) -> &mut ConfigStream {
        &mut self.stream
    }

    async fn close(&mut self) -> Result<()> {
        self.background.shutdown().await;
        let Some(mut fs_watcher) = self.fs_watcher.take() else {
            return Ok(());
        };
        let unwatched = fs_watcher.unwatch(&self.path);
        drop(fs_watcher);
        match unwatched {
            Ok(()) => Ok(()),
            // Already released by the OS when the file went away.
            Err(e) if matches!(e.kind, notify::ErrorKind::WatchNotFound) => Ok(()),
            Err(e) => Err(RoverError::Watch(format!(
                "failed to unwatch {}: {e}",
                self.path.display()
            ))),
        }
    }
}

fn is_write(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any))
}

struct Reloader {
    path: PathBuf,
    events: mpsc::Receiver<notify::Result<Event>>,
    reporter: Arc<dyn DebugReporter>,
    sender: ConfigSender,
    cancel: CancellationToken,
    /// Raw bytes of the last delivered document.
    last_raw: Option<Vec<u8>>,
}

impl Reloader {
    async fn run(mut self) {
        let mut debouncer = Debouncer::default();
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                event = self.events.recv() => match event {
                    Some(Ok(event)) if is_write(&event.kind) => debouncer.arm(),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => warn!(error = %e, "file watcher error"),
                    None => return,
                },
                _ = debouncer.settled() => {
                    if !self.reload().await {
                        return;
                    }
                }
            }
        }
    }

    /// Re-read and deliver the file. Returns `false` if cancelled mid-delivery.
    async fn reload(&mut self) -> bool {
        info!(path = %self.path.display(), "on-disk config file changed, reloading");
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "error reading config file after write");
                return true;
            }
        };
        if self.last_raw.as_deref() == Some(raw.as_slice()) {
            debug!("config file content unchanged, skipping");
            return true;
        }

        let config = match rover_config::from_bytes(&self.path, &raw) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "error reading config after write");
                return true;
            }
        };
        self.last_raw = Some(raw);
        self.reporter.set_file_debug(config.debug);
        self.sender.deliver(config, &self.cancel).await
    }
}
