use async_trait::async_trait;
use rover_config::Config;
use rover_core::{DebugReporter, Result, RoverError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::reader::CloudReader;
use crate::stream::{ConfigSender, ConfigStream};
use crate::watcher::{Background, ConfigSource, Watcher};

/// How often a cloud read also asks for fresh TLS material.
pub const CERT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Periodically fetches new configs from the cloud.
///
/// The first read happens after a fifth of the refresh interval, so a read
/// that timed out at startup is retried quickly. Later reads use the full
/// interval. Failed reads are logged and retried on the next tick.
pub struct CloudWatcher {
    stream: ConfigStream,
    background: Background,
}

impl CloudWatcher {
    pub fn new(
        config: Config,
        reader: Arc<dyn CloudReader>,
        reporter: Arc<dyn DebugReporter>,
    ) -> Result<Self> {
        let refresh = match config.cloud.as_ref() {
            Some(cloud) if !cloud.refresh_interval().is_zero() => cloud.refresh_interval(),
            Some(_) => {
                return Err(RoverError::validation(
                    "cloud.refresh_interval_ms",
                    "refresh interval must be positive",
                ));
            }
            None => return Err(RoverError::Config("cloud watcher requires a cloud section".into())),
        };

        let (sender, stream) = ConfigStream::rendezvous();
        let background = Background::spawn(move |cancel| {
            let poller = Poller {
                config,
                refresh,
                reader,
                reporter,
                sender,
                cancel,
            };
            poller.run()
        });
        Ok(Self { stream, background })
    }
}

#[async_trait]
impl Watcher for CloudWatcher {
    fn source(&self) -> ConfigSource {
        ConfigSource::Cloud
    }

    fn config(&mut self) -> &mut ConfigStream {
        &mut self.stream
    }

    async fn close(&mut self) -> Result<()> {
        self.background.shutdown().await;
        Ok(())
    }
}

struct Poller {
    config: Config,
    refresh: Duration,
    reader: Arc<dyn CloudReader>,
    reporter: Arc<dyn DebugReporter>,
    sender: ConfigSender,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self) {
        let mut first_read = true;
        let mut next_cert_check = Instant::now() + CERT_CHECK_INTERVAL;
        let mut previous: Option<Config> = None;

        loop {
            let mut interval = self.refresh;
            if first_read {
                interval /= 5;
                first_read = false;
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }

            let check_cert = Instant::now() > next_cert_check;
            let read = self.reader.read(&self.config, previous.as_ref(), check_cert);
            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                fetched = read => fetched,
            };
            let snapshot = match fetched {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    debug!(error = %e, "error reading cloud config; will try again");
                    continue;
                }
            };

            match snapshot.copy_only_public_fields() {
                Ok(public) => previous = Some(public),
                Err(e) => debug!(error = %e, "failed to copy cloud config"),
            }
            if check_cert {
                next_cert_check = Instant::now() + CERT_CHECK_INTERVAL;
            }
            self.reporter.set_cloud_debug(snapshot.debug);

            if !self.sender.deliver(snapshot, &self.cancel).await {
                return;
            }
        }
    }
}
