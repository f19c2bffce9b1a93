use anyhow::Context;
use rover_config::Config;
use rover_core::ProcessDebugFlags;
use rover_watch::{HttpCloudReader, new_watcher};
use std::sync::Arc;
use tracing::{info, warn};

pub(super) async fn cmd_watch(config: Config) -> rover_core::Result<()> {
    println!("Rover v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config.config_file_path {
        println!("   Config: {}", path.display());
    }
    println!("   Components: {}", config.components.len());

    let mut watcher = new_watcher(
        config,
        Arc::new(HttpCloudReader::new()),
        Arc::new(ProcessDebugFlags),
    )?;
    println!("   Source: {}", watcher.source());
    println!();

    let mut generation = 0u64;
    loop {
        tokio::select! {
            next = watcher.config().recv() => match next {
                Some(next) => {
                    generation += 1;
                    info!(
                        generation,
                        components = next.components.len(),
                        services = next.services.len(),
                        debug = next.debug,
                        "new configuration received"
                    );
                }
                None => {
                    warn!("config watcher stopped unexpectedly");
                    break;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("shutting down config watcher");
                break;
            }
        }
    }

    watcher.close().await
}
