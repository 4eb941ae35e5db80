//! Application state shared across all request handlers.

use aftersale_core::events::EventSenders;
use aftersale_core::workflow::resolution::RefundWorkflow;
use sqlx::PgPool;

use crate::config::runtime::SharedConfig;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc
/// or an internal handle).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (sections reloadable via SIGHUP).
    pub config: SharedConfig,
    /// Event channel senders for the background processors.
    pub event_senders: EventSenders,
    /// The refund saga executor, built once at startup.
    pub refunds: RefundWorkflow,
}

impl AppState {
    /// Snapshot the OTP secret for a single verification.
    pub async fn otp_secret(&self) -> Box<[u8]> {
        self.config.security.read().await.otp_secret.clone()
    }
}
