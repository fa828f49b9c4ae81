//! HTTP retrieval of WMS capabilities documents.

use std::time::Duration;

use ows_common::{OwsError, OwsResult};
use tracing::{debug, info};
use wms_protocol::{get_capabilities_url, WmsCapabilities};

use crate::config::CliConfig;

/// Whether `source` names a remote service rather than a local file.
pub fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub struct CapabilitiesClient {
    client: reqwest::Client,
    version: String,
}

impl CapabilitiesClient {
    pub fn new(config: &CliConfig) -> OwsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OwsError::InternalError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            version: config.default_wms_version.clone(),
        })
    }

    /// Request and parse the capabilities of the service at `href`.
    pub async fn fetch(&self, href: &str) -> OwsResult<WmsCapabilities> {
        let url = get_capabilities_url(href, &self.version).map_err(|e| {
            OwsError::InvalidParameter {
                param: "href".to_string(),
                message: format!("{}: {}", href, e),
            }
        })?;
        info!(url = %url, "fetching capabilities");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| OwsError::ServiceUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OwsError::ServiceUnavailable(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OwsError::ServiceUnavailable(format!("{}: {}", url, e)))?;
        debug!(bytes = body.len(), "capabilities received");

        Ok(WmsCapabilities::parse(&body)?)
    }
}
