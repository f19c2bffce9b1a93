use rover_core::{Result, RoverError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Default cloud refresh interval (10s).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 10_000;
/// Default timeout for a single cloud request (10s).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Root configuration snapshot for a robot process.
///
/// Produced by [`crate::loader::from_bytes`] or by a cloud read and never
/// mutated after it has been handed to a consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cloud connection info. When present the configuration is sourced remotely.
    pub cloud: Option<CloudConfig>,
    /// Enables verbose logging for the process.
    pub debug: bool,
    pub components: Vec<ResourceConfig>,
    pub services: Vec<ResourceConfig>,
    /// Path the document was read from. Set by the loader, never serialized.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

// ── Cloud ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Robot part ID as registered with the control plane.
    pub id: String,
    /// Robot secret. Never serialized, so public-field copies drop it.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Base URL of the control plane, e.g. "https://app.example.com".
    pub app_address: String,
    /// Interval between cloud config reads in milliseconds.
    pub refresh_interval_ms: u64,
    /// Timeout for a single cloud request in milliseconds.
    pub request_timeout_ms: u64,
    /// PEM certificate issued by the control plane.
    pub tls_certificate: Option<String>,
    /// PEM private key matching `tls_certificate`.
    pub tls_private_key: Option<String>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            secret: String::new(),
            app_address: String::new(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            tls_certificate: None,
            tls_private_key: None,
        }
    }
}

impl CloudConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ── Resources ──────────────────────────────────────────────────

/// A component or service entry. Attributes are opaque to Rover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub model: String,
    pub depends_on: Vec<String>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Config {
    /// Validate and normalize the configuration in place.
    ///
    /// Run once before a configuration is used to pick a watcher, and on
    /// every freshly parsed or fetched snapshot.
    pub fn ensure(&mut self) -> Result<()> {
        if let Some(cloud) = self.cloud.as_mut() {
            cloud.ensure()?;
        }

        let mut names = HashSet::new();
        for (section, resources) in [("components", &self.components), ("services", &self.services)] {
            for (i, resource) in resources.iter().enumerate() {
                if resource.name.is_empty() {
                    return Err(RoverError::validation(
                        format!("{section}[{i}].name"),
                        "name is required",
                    ));
                }
                if !names.insert(resource.name.as_str()) {
                    return Err(RoverError::validation(
                        format!("{section}[{i}].name"),
                        format!("duplicate resource name '{}'", resource.name),
                    ));
                }
            }
        }

        for (section, resources) in [("components", &self.components), ("services", &self.services)] {
            for resource in resources {
                if let Some(missing) = resource
                    .depends_on
                    .iter()
                    .find(|dep| !names.contains(dep.as_str()))
                {
                    return Err(RoverError::validation(
                        format!("{section}.{}.depends_on", resource.name),
                        format!("unknown dependency '{missing}'"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// A copy without the robot secret or the local file path.
    pub fn copy_only_public_fields(&self) -> Result<Config> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl CloudConfig {
    fn ensure(&mut self) -> Result<()> {
        if self.id.is_empty() {
            return Err(RoverError::validation("cloud.id", "id is required"));
        }
        if self.secret.is_empty() {
            return Err(RoverError::validation("cloud.secret", "secret is required"));
        }
        let address = url::Url::parse(&self.app_address)
            .map_err(|e| RoverError::validation("cloud.app_address", e.to_string()))?;
        match address.scheme() {
            "https" => {}
            "http" => warn!(app_address = %self.app_address, "cloud app address is not using TLS"),
            other => {
                return Err(RoverError::validation(
                    "cloud.app_address",
                    format!("unsupported scheme '{other}'"),
                ));
            }
        }
        if self.refresh_interval_ms == 0 {
            self.refresh_interval_ms = DEFAULT_REFRESH_INTERVAL_MS;
        }
        if self.request_timeout_ms == 0 {
            self.request_timeout_ms = DEFAULT_REQUEST_TIMEOUT_MS;
        }
        if self.tls_certificate.is_some() != self.tls_private_key.is_some() {
            return Err(RoverError::validation(
                "cloud.tls_certificate",
                "certificate and private key must be set together",
            ));
        }
        Ok(())
    }
}
