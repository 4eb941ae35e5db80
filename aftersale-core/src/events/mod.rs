//! Event channel for the asynchronous mail fan-out.
//!
//! Notification rows are written synchronously by the workflow; email is
//! fire-and-forget. Handlers push a [`MailEvent`] onto the channel and
//! move on; the mailer processor owns delivery, and a failure there is
//! logged, never propagated back to the caller.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, EventSenders, MailEventReceiver, MailEventSender, mail_event_channel,
};
pub use types::{MailEvent, OtpPurpose};
