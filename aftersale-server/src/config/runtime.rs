//! Runtime configuration shared across handlers.
//!
//! Each section sits behind its own `Arc<RwLock<_>>` so a SIGHUP reload
//! swaps sections independently without blocking unrelated readers. The
//! gateway/courier/mail sections also feed the outbound clients built at
//! startup; those clients keep their startup snapshot until restart.

use aftersale_core::courier::CourierConfig;
use aftersale_core::gateway::GatewayConfig;
use aftersale_core::processors::MailConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Server listen configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Secrets for request-level crypto.
#[derive(Clone)]
pub struct SecurityConfig {
    /// Key for the keyed OTP hash. Never logged.
    pub otp_secret: Box<[u8]>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("otp_secret", &"<redacted>")
            .finish()
    }
}

/// All config sections, individually lockable.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub security: Arc<RwLock<SecurityConfig>>,
    pub gateway: Arc<RwLock<GatewayConfig>>,
    pub courier: Arc<RwLock<CourierConfig>>,
    pub mail: Arc<RwLock<MailConfig>>,
}
