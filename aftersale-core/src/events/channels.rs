//! Event channel factories and handles.

use super::types::MailEvent;
use tokio::sync::mpsc;

/// Default buffer size for event channels. Enough for a bulk-broadcast
/// burst while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for MailEvent events.
pub type MailEventSender = mpsc::Sender<MailEvent>;
/// Receiver handle for MailEvent events.
pub type MailEventReceiver = mpsc::Receiver<MailEvent>;

/// Create a new MailEvent channel.
pub fn mail_event_channel() -> (MailEventSender, MailEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Container for all event channel senders, cloned into handlers.
#[derive(Clone)]
pub struct EventSenders {
    pub mail: MailEventSender,
}
