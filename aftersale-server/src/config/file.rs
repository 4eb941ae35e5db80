//! TOML file configuration structures.
//!
//! These structs directly map to the `aftersale-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub gateway: GatewayConfig,
    pub courier: CourierConfig,
    pub mail: MailConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Security configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Secret key for the keyed OTP hash. Never logged.
    pub otp_secret: String,
}

/// Payment gateway configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub merchant_id: String,
    /// Shared secret mixed into the gateway request signature.
    pub salt: String,
}

/// Courier aggregator configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    pub base_url: Url,
    pub api_key: String,
}

/// Transactional email provider configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub base_url: Url,
    pub api_key: String,
    /// Sender address, e.g. "support@example.com".
    pub from: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[security]
otp_secret = "change-me"

[gateway]
base_url = "https://gateway.example.com/"
merchant_id = "M-1001"
salt = "gateway-salt"

[courier]
base_url = "https://courier.example.com/"
api_key = "courier-key"

[mail]
base_url = "https://mail.example.com/"
api_key = "mail-key"
from = "support@example.com"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.gateway.merchant_id, "M-1001");
        assert_eq!(config.mail.from, "support@example.com");
    }
}
