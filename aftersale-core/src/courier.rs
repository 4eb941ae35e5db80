//! HTTP client for the courier aggregator.
//!
//! Only the return-pickup booking is driven from this service; shipment
//! creation happens at fulfilment time, outside this codebase. Status
//! changes come back through the inbound webhook.

use thiserror::Error;
use url::Url;

/// Courier aggregator endpoint and key, from the `[courier]` config section.
#[derive(Debug, Clone)]
pub struct CourierConfig {
    pub base_url: Url,
    pub api_key: String,
}

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("courier endpoint url invalid: {0}")]
    Url(#[from] url::ParseError),

    #[error("courier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("courier returned status {status}")]
    Status { status: u16, body: String },
}

#[derive(Clone)]
pub struct CourierClient {
    http: reqwest::Client,
    config: CourierConfig,
}

impl CourierClient {
    pub fn new(config: CourierConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    /// Book a reverse pickup for a shipment (replacement resolutions).
    #[tracing::instrument(skip(self))]
    pub async fn schedule_return_pickup(&self, shipment_id: &str) -> Result<(), CourierError> {
        let url = self.config.base_url.join("pickups")?;
        let response = self
            .http
            .post(url)
            .header("X-Api-Key", &self.config.api_key)
            .json(&serde_json::json!({ "shipment_id": shipment_id, "type": "return" }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
