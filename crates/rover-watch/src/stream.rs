//! Rendezvous delivery of configuration snapshots.
//!
//! A snapshot only counts as delivered once the consumer has taken it while
//! the producer is still waiting for it. The producer holds at most one
//! snapshot in flight and never reads ahead of the consumer.

use rover_config::Config;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

struct Handoff {
    config: Config,
    ack: oneshot::Sender<()>,
}

/// Read side of a watcher's delivery channel.
pub struct ConfigStream {
    rx: Option<mpsc::Receiver<Handoff>>,
}

impl ConfigStream {
    pub(crate) fn rendezvous() -> (ConfigSender, ConfigStream) {
        let (tx, rx) = mpsc::channel(1);
        (ConfigSender { tx }, ConfigStream { rx: Some(rx) })
    }

    /// A stream with no producer. `recv` never resolves.
    pub(crate) fn never() -> ConfigStream {
        ConfigStream { rx: None }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the producing task has exited. Cancel safe.
    pub async fn recv(&mut self) -> Option<Config> {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        loop {
            let handoff = rx.recv().await?;
            // Acks fail only for snapshots abandoned by a cancelled producer.
            if handoff.ack.send(()).is_ok() {
                return Some(handoff.config);
            }
        }
    }
}

/// Write side, owned by the watcher's background task.
pub(crate) struct ConfigSender {
    tx: mpsc::Sender<Handoff>,
}

impl ConfigSender {
    /// Hand `config` to the consumer, racing against `cancel`.
    ///
    /// Returns `false` if cancellation won or the consumer is gone, in which
    /// case the snapshot was not delivered.
    pub(crate) async fn deliver(&self, config: Config, cancel: &CancellationToken) -> bool {
        let (ack, acked) = oneshot::channel();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            sent = self.tx.send(Handoff { config, ack }) => {
                if sent.is_err() {
                    return false;
                }
            }
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            acked = acked => acked.is_ok(),
        }
    }
}
