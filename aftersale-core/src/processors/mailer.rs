//! Mailer processor.
//!
//! Drains [`MailEvent`]s from the channel and delivers them through the
//! transactional email provider's send API. Delivery is best-effort and
//! at most once: a failed send is logged and dropped, never retried and
//! never propagated to the workflow that queued it.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info};
use url::Url;

use crate::events::{MailEvent, MailEventReceiver, OtpPurpose};

/// Email provider endpoint and credentials, from the `[mail]` config
/// section.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub base_url: Url,
    pub api_key: String,
    /// Sender address, e.g. `support@example.com`.
    pub from: String,
}

/// JSON body of the provider's send API.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mailer drains the mail event channel and posts to the email provider.
pub struct Mailer {
    config: MailConfig,
    mail_rx: MailEventReceiver,
    shutdown_rx: watch::Receiver<bool>,
    http: reqwest::Client,
}

impl Mailer {
    pub fn new(
        config: MailConfig,
        mail_rx: MailEventReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            mail_rx,
            shutdown_rx,
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Run until shutdown or channel close.
    pub async fn run(mut self) {
        info!("Mailer started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("Mailer received shutdown signal");
                        break;
                    }
                }

                event = self.mail_rx.recv() => {
                    let Some(event) = event else {
                        info!("Mail event channel closed");
                        break;
                    };
                    debug!(event = ?event, "Received MailEvent");
                    // At-most-once: log and drop on failure.
                    if let Err(e) = self.deliver(&event).await {
                        error!(error = %e, "Failed to deliver email");
                    }
                }
            }
        }

        info!("Mailer shutdown complete");
    }

    async fn deliver(&self, event: &MailEvent) -> Result<(), reqwest::Error> {
        let to = recipient(event);
        let subject = render_subject(event);
        let text = render_body(event);

        let url = match self.config.base_url.join("send") {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Invalid mail provider base url");
                return Ok(());
            }
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&SendRequest {
                from: &self.config.from,
                to,
                subject: &subject,
                text: &text,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %to, subject = %subject, "Email accepted by provider");
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(to = %to, status = %status, body = %body, "Email provider rejected send");
        }
        Ok(())
    }
}

fn recipient(event: &MailEvent) -> &str {
    match event {
        MailEvent::OtpCode { to, .. }
        | MailEvent::ComplaintReceived { to, .. }
        | MailEvent::ApologyCredit { to, .. }
        | MailEvent::OrderCancelled { to, .. }
        | MailEvent::RefundCompleted { to, .. }
        | MailEvent::Broadcast { to, .. } => to,
    }
}

fn render_subject(event: &MailEvent) -> String {
    match event {
        MailEvent::OtpCode { purpose, .. } => match purpose {
            OtpPurpose::OrderCancellation => "Your order cancellation code".to_owned(),
            OtpPurpose::PasswordReset => "Your password reset code".to_owned(),
        },
        MailEvent::ComplaintReceived { order_id, .. } => {
            format!("We received your report for order {order_id}")
        }
        MailEvent::ApologyCredit { .. } => "A store credit from us, with apologies".to_owned(),
        MailEvent::OrderCancelled { order_id, .. } => {
            format!("Order {order_id} has been cancelled")
        }
        MailEvent::RefundCompleted { order_id, .. } => {
            format!("Your refund for order {order_id} is complete")
        }
        MailEvent::Broadcast { subject, .. } => subject.clone(),
    }
}

fn render_body(event: &MailEvent) -> String {
    match event {
        MailEvent::OtpCode {
            code,
            purpose,
            expires_minutes,
            ..
        } => {
            let action = match purpose {
                OtpPurpose::OrderCancellation => "confirm your order cancellation",
                OtpPurpose::PasswordReset => "reset your password",
            };
            format!(
                "Use this code to {action}: {code}\n\n\
                 It expires in {expires_minutes} minutes. If you did not request this, \
                 you can ignore this email."
            )
        }
        MailEvent::ComplaintReceived { order_id, .. } => format!(
            "We've recorded your report for order {order_id} and started looking into it. \
             You'll hear from us as soon as the investigation concludes."
        ),
        MailEvent::ApologyCredit { code, amount, .. } => format!(
            "Sorry about the trouble with your delivery. We've added a store credit of \
             {amount} to your account as an apology. Code: {code}. It is valid for one year \
             and is separate from any refund you may be owed."
        ),
        MailEvent::OrderCancelled {
            order_id,
            refund_pending,
            ..
        } => {
            if *refund_pending {
                format!(
                    "Order {order_id} has been cancelled. Since the order was prepaid, \
                     please choose how you'd like to receive your refund from your account page."
                )
            } else {
                format!("Order {order_id} has been cancelled. No payment was captured.")
            }
        }
        MailEvent::RefundCompleted {
            amount,
            store_credit_code,
            ..
        } => match store_credit_code {
            Some(code) => format!(
                "Your refund of {amount} has been issued as store credit. \
                 Code: {code}, valid for one year."
            ),
            None => format!(
                "Your refund of {amount} has been processed and will reach your \
                 account in a few business days."
            ),
        },
        MailEvent::Broadcast { body, .. } => body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn otp_mail_carries_code_and_window() {
        let event = MailEvent::OtpCode {
            to: "a@example.com".to_owned(),
            code: "123456".to_owned(),
            purpose: OtpPurpose::OrderCancellation,
            expires_minutes: 5,
        };
        assert_eq!(recipient(&event), "a@example.com");
        let body = render_body(&event);
        assert!(body.contains("123456"));
        assert!(body.contains("5 minutes"));
        assert!(render_subject(&event).contains("cancellation"));
    }

    #[test]
    fn store_credit_refund_mail_names_the_code() {
        let event = MailEvent::RefundCompleted {
            to: "a@example.com".to_owned(),
            order_id: Uuid::nil(),
            amount: Decimal::new(2000, 0),
            method: crate::entities::RefundMethod::StoreCredit,
            store_credit_code: Some("GC-K7PQ2WXA9MRD".to_owned()),
        };
        let body = render_body(&event);
        assert!(body.contains("GC-K7PQ2WXA9MRD"));
        assert!(body.contains("2000"));
    }

    #[test]
    fn broadcast_uses_the_given_subject_verbatim() {
        let event = MailEvent::Broadcast {
            to: "a@example.com".to_owned(),
            subject: "Scheduled maintenance".to_owned(),
            body: "We'll be down briefly.".to_owned(),
        };
        assert_eq!(render_subject(&event), "Scheduled maintenance");
        assert_eq!(render_body(&event), "We'll be down briefly.");
    }
}
