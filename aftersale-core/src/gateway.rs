//! HTTP client for the payment gateway's refund API.
//!
//! Request signing and response interpretation live in
//! [`aftersale_sdk::gateway`]; this module only does the transport.

use aftersale_sdk::gateway::{self, RefundAck};
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Gateway credentials and endpoint, from the `[gateway]` config section.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub merchant_id: String,
    /// Shared secret mixed into the request signature. Never logged.
    pub salt: String,
}

/// Errors from the gateway transport. An `Ambiguous` response body is not
/// an error; it comes back as [`RefundAck::Ambiguous`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway endpoint url invalid: {0}")]
    Url(#[from] url::ParseError),

    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx from the gateway; nothing can be concluded about the
    /// refund, so callers leave the row in `processing`.
    #[error("gateway returned status {status}")]
    Status { status: u16, body: String },
}

/// Client for the gateway's form-encoded command endpoint.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    /// Submit a refund for a captured transaction.
    #[tracing::instrument(skip(self), fields(merchant_id = %self.config.merchant_id))]
    pub async fn refund(
        &self,
        transaction_id: &str,
        amount: Decimal,
    ) -> Result<RefundAck, GatewayError> {
        let form = gateway::refund_form(
            &self.config.merchant_id,
            transaction_id,
            amount,
            &self.config.salt,
        );
        self.post_command(&form).await
    }

    /// Poll the state of a previously submitted refund.
    #[tracing::instrument(skip(self), fields(merchant_id = %self.config.merchant_id))]
    pub async fn refund_status(
        &self,
        transaction_id: &str,
        amount: Decimal,
    ) -> Result<RefundAck, GatewayError> {
        let form = gateway::status_form(
            &self.config.merchant_id,
            transaction_id,
            amount,
            &self.config.salt,
        );
        self.post_command(&form).await
    }

    async fn post_command(
        &self,
        form: &[(&'static str, String)],
    ) -> Result<RefundAck, GatewayError> {
        let url = self.config.base_url.join("merchant/command")?;
        let response = self.http.post(url).form(form).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let ack = gateway::interpret_response(&body);
        if matches!(ack, RefundAck::Ambiguous) {
            tracing::warn!(body = %body, "ambiguous gateway response, leaving refund pending");
        }
        Ok(ack)
    }
}
