use async_trait::async_trait;
use reqwest::Client;
use rover_config::{CloudConfig, Config};
use rover_core::{Result, RoverError};
use tracing::debug;
use url::Url;

/// Fetches the current configuration from the control plane.
///
/// `previous` is the public-fields copy of the last successful read, or
/// `None` before the first one. `check_cert` asks the remote side to issue
/// fresh TLS material. Dropping the returned future abandons the read.
#[async_trait]
pub trait CloudReader: Send + Sync {
    async fn read(
        &self,
        config: &Config,
        previous: Option<&Config>,
        check_cert: bool,
    ) -> Result<Config>;
}

/// [`CloudReader`] over the control plane's HTTP config endpoint.
pub struct HttpCloudReader {
    client: Client,
}

impl HttpCloudReader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// `<app_address>/api/v1/robots/<id>/config`, with the id percent-encoded
    /// as a single path segment.
    fn endpoint(cloud: &CloudConfig) -> Result<Url> {
        let mut url = Url::parse(&cloud.app_address).map_err(|e| {
            RoverError::Cloud(format!("invalid app address {}: {e}", cloud.app_address))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                RoverError::Cloud(format!("app address {} cannot be a base", cloud.app_address))
            })?
            .pop_if_empty()
            .extend(["api", "v1", "robots", cloud.id.as_str(), "config"]);
        Ok(url)
    }
}

impl Default for HttpCloudReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudReader for HttpCloudReader {
    async fn read(
        &self,
        config: &Config,
        previous: Option<&Config>,
        check_cert: bool,
    ) -> Result<Config> {
        let cloud = config
            .cloud
            .as_ref()
            .ok_or_else(|| RoverError::Cloud("config has no cloud section".into()))?;
        let url = Self::endpoint(cloud)?;
        debug!(%url, check_cert, "reading config from cloud");

        let resp = self
            .client
            .get(url.as_str())
            .timeout(cloud.request_timeout())
            .header("x-robot-id", &cloud.id)
            .header("x-robot-secret", &cloud.secret)
            .query(&[("check_cert", check_cert)])
            .send()
            .await
            .map_err(|e| RoverError::Cloud(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RoverError::Cloud(format!("{url} returned {status}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| RoverError::Cloud(format!("failed to read response from {url}: {e}")))?;
        let mut fetched: Config = serde_json::from_slice(&body).map_err(|e| RoverError::Parse {
            path: url.to_string(),
            reason: e.to_string(),
        })?;

        let remote_cloud = fetched.cloud.take();
        fetched.cloud = Some(merge_cloud(cloud, remote_cloud, previous, check_cert));
        fetched.ensure()?;
        Ok(fetched)
    }
}

/// The local connection identity, with TLS material either freshly issued
/// (when a certificate check ran) or carried over from the previous read.
fn merge_cloud(
    local: &CloudConfig,
    remote: Option<CloudConfig>,
    previous: Option<&Config>,
    check_cert: bool,
) -> CloudConfig {
    let mut merged = local.clone();
    let issued = remote.filter(|c| check_cert && c.tls_certificate.is_some());
    if let Some(issued) = issued {
        merged.tls_certificate = issued.tls_certificate;
        merged.tls_private_key = issued.tls_private_key;
    } else if let Some(prev) = previous.and_then(|p| p.cloud.as_ref()) {
        if prev.tls_certificate.is_some() {
            merged.tls_certificate = prev.tls_certificate.clone();
            merged.tls_private_key = prev.tls_private_key.clone();
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> CloudConfig {
        CloudConfig {
            id: "part-1".into(),
            secret: "s3cr3t".into(),
            app_address: "https://app.example.com/".into(),
            ..Default::default()
        }
    }

    fn with_cert(cert: &str) -> CloudConfig {
        CloudConfig {
            tls_certificate: Some(cert.into()),
            tls_private_key: Some(format!("{cert}-key")),
            ..Default::default()
        }
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            HttpCloudReader::endpoint(&local()).unwrap().as_str(),
            "https://app.example.com/api/v1/robots/part-1/config"
        );
    }

    #[test]
    fn endpoint_encodes_id_as_one_segment() {
        let cloud = CloudConfig {
            id: "part/1?x#y".into(),
            ..local()
        };
        let url = HttpCloudReader::endpoint(&cloud).unwrap();
        assert_eq!(url.path(), "/api/v1/robots/part%2F1%3Fx%23y/config");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn endpoint_keeps_app_address_base_path() {
        let cloud = CloudConfig {
            app_address: "https://app.example.com/fleet".into(),
            ..local()
        };
        assert_eq!(
            HttpCloudReader::endpoint(&cloud).unwrap().as_str(),
            "https://app.example.com/fleet/api/v1/robots/part-1/config"
        );
    }

    #[test]
    fn cert_check_takes_issued_material() {
        let merged = merge_cloud(&local(), Some(with_cert("new")), None, true);
        assert_eq!(merged.tls_certificate.as_deref(), Some("new"));
        assert_eq!(merged.tls_private_key.as_deref(), Some("new-key"));
        assert_eq!(merged.secret, "s3cr3t");
    }

    #[test]
    fn without_cert_check_previous_material_is_kept() {
        let previous = Config {
            cloud: Some(with_cert("old")),
            ..Default::default()
        };
        let merged = merge_cloud(&local(), Some(with_cert("new")), Some(&previous), false);
        assert_eq!(merged.tls_certificate.as_deref(), Some("old"));
    }

    #[test]
    fn cert_check_without_issued_cert_falls_back() {
        let previous = Config {
            cloud: Some(with_cert("old")),
            ..Default::default()
        };
        let merged = merge_cloud(&local(), Some(CloudConfig::default()), Some(&previous), true);
        assert_eq!(merged.tls_certificate.as_deref(), Some("old"));
    }
}
