use clap::{Parser, Subcommand, ValueEnum};
use rover_config::Config;
use std::path::PathBuf;
use tracing::{Subscriber, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

mod watch;

/// Rover — live robot configuration watcher
#[derive(Parser)]
#[command(name = "rover", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the robot config file (JSON). Defaults to $ROVER_CONFIG, then ~/.rover/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the configured source and log each new configuration until Ctrl-C
    Watch,
    /// Validate the config file and exit
    Validate,
    /// Show the loaded configuration (secrets redacted)
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> rover_core::Result<()> {
        // Tracing comes up before the config is read so loader and validation
        // logs are not lost. RUST_LOG > --verbose > --quiet > --log-level.
        let from_env = EnvFilter::try_from_default_env().ok();
        let pinned = from_env.is_some() || self.log_level_override().is_some();
        let filter = from_env
            .unwrap_or_else(|| EnvFilter::new(self.log_level_override().unwrap_or("info")));
        let handle = init_tracing(filter, self.log_format);

        let path = rover_config::resolve_path(self.config.as_deref());
        let config = rover_config::read_config(&path)?;

        // Config debug flag applies only when nothing else chose a level.
        if !pinned && config.debug {
            if let Err(e) = handle.reload(EnvFilter::new("debug")) {
                warn!(error = %e, "failed to raise log level from config debug flag");
            }
        }

        match self.command {
            Commands::Watch => watch::cmd_watch(config).await,
            Commands::Validate => Self::cmd_validate(&config),
            Commands::Config { json } => Self::cmd_config(&config, json),
        }
    }

    fn log_level_override(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            self.log_level.as_deref()
        }
    }

    fn cmd_validate(config: &Config) -> rover_core::Result<()> {
        let path = config
            .config_file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("{path}: ok");
        println!("   Source: {}", rover_watch::select_source(config));
        println!("   Components: {}", config.components.len());
        println!("   Services: {}", config.services.len());
        Ok(())
    }

    fn cmd_config(config: &Config, json: bool) -> rover_core::Result<()> {
        let public = config.copy_only_public_fields()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&public)?);
            return Ok(());
        }
        match &public.cloud {
            Some(cloud) => {
                println!("cloud:");
                println!("   id: {}", cloud.id);
                println!("   app_address: {}", cloud.app_address);
                println!("   refresh_interval: {:?}", cloud.refresh_interval());
            }
            None => println!("cloud: (none)"),
        }
        println!("debug: {}", public.debug);
        for resource in &public.components {
            println!("component {} ({}/{})", resource.name, resource.kind, resource.model);
        }
        for resource in &public.services {
            println!("service {} ({}/{})", resource.name, resource.kind, resource.model);
        }
        Ok(())
    }
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn subscriber(
    filter: EnvFilter,
    format: LogFormat,
) -> (impl Subscriber + Send + Sync + 'static, FilterHandle) {
    let (filter, handle) = reload::Layer::new(filter);
    let json = (format == LogFormat::Json).then(|| fmt::layer().json().with_target(true));
    let pretty = (format == LogFormat::Pretty).then(|| fmt::layer().with_target(false));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty);
    (subscriber, handle)
}

fn init_tracing(filter: EnvFilter, format: LogFormat) -> FilterHandle {
    let (subscriber, handle) = subscriber(filter, format);
    subscriber.init();
    handle
}
