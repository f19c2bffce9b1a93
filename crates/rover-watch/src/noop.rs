use async_trait::async_trait;
use rover_core::Result;

use crate::stream::ConfigStream;
use crate::watcher::{ConfigSource, Watcher};

/// Used when no configuration source is configured. Never delivers.
pub struct NoopWatcher {
    stream: ConfigStream,
}

impl NoopWatcher {
    pub fn new() -> Self {
        Self {
            stream: ConfigStream::never(),
        }
    }
}

impl Default for NoopWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Watcher for NoopWatcher {
    fn source(&self) -> ConfigSource {
        ConfigSource::None
    }

    fn config(&mut self) -> &mut ConfigStream {
        &mut self.stream
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
