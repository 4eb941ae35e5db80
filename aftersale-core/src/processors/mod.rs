//! Long-running background processors.
//!
//! - [`mailer::Mailer`] drains the mail event channel and delivers
//!   transactional email, at most once.
//! - [`reconciler::RefundReconciler`] polls the payment gateway for
//!   refunds stuck in `processing` and settles them.

pub mod mailer;
pub mod reconciler;

pub use mailer::{MailConfig, Mailer};
pub use reconciler::RefundReconciler;
