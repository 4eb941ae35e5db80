//! Complaint intake.
//!
//! Records the report, and for a not-received parcel immediately issues
//! an apology store credit worth 20% of the order total, inside the same
//! transaction. The apology credit is independent of whatever refund the
//! investigation later concludes.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::credit;
use crate::entities::complaints::{NewComplaint, OrderComplaint};
use crate::entities::gift_cards::{GiftCard, NewGiftCard};
use crate::entities::orders::Order;
use crate::entities::{ComplaintKind, GiftCardSource, NotificationKind};
use crate::events::{MailEvent, MailEventSender};
use crate::workflow::notify;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// Also covers orders owned by someone else.
    #[error("order not found")]
    OrderNotFound,

    #[error("an open report already exists for this order")]
    DuplicateComplaint,
}

pub struct IntakeOutcome {
    pub complaint: OrderComplaint,
    /// Code and amount of the apology credit, when one was issued.
    pub apology_credit: Option<(String, Decimal)>,
}

/// Record a new order issue and open the investigation.
pub async fn report_issue(
    pool: &PgPool,
    mail_tx: &MailEventSender,
    order_id: Uuid,
    user_id: Uuid,
    kind: ComplaintKind,
    description: Option<String>,
) -> Result<IntakeOutcome, IntakeError> {
    let mut tx = pool.begin().await?;

    let order = Order::lock_tx(&mut tx, order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or(IntakeError::OrderNotFound)?;

    // One open complaint per order; the partial unique index turns a
    // race into a constraint violation.
    let mut complaint = match OrderComplaint::insert_tx(
        &mut tx,
        NewComplaint {
            order_id,
            user_id,
            kind,
            description,
        },
    )
    .await
    {
        Ok(complaint) => complaint,
        Err(e) if is_unique_violation(&e) => return Err(IntakeError::DuplicateComplaint),
        Err(e) => return Err(e.into()),
    };

    let apology_credit = if kind == ComplaintKind::NotReceived {
        let code = credit::generate_code();
        let amount = credit::apology_credit(order.total);
        GiftCard::insert_tx(
            &mut tx,
            NewGiftCard {
                user_id,
                code: code.clone(),
                amount,
                source: GiftCardSource::Apology,
                complaint_id: Some(complaint.id),
                refund_request_id: None,
                expires_at: credit::expiry_from_now(),
            },
        )
        .await?;
        OrderComplaint::set_apology_credit_tx(&mut tx, complaint.id, &code).await?;
        complaint.apology_credit_code = Some(code.clone());
        Some((code, amount))
    } else {
        None
    };

    tx.commit().await?;

    notify::notify(
        pool,
        user_id,
        "We received your report",
        &format!("Your report for order {order_id} is being investigated."),
        NotificationKind::Complaint,
        None,
    )
    .await?;
    notify::email_user(pool, mail_tx, user_id, |to| MailEvent::ComplaintReceived {
        to,
        order_id,
    })
    .await?;

    if let Some((code, amount)) = &apology_credit {
        notify::notify(
            pool,
            user_id,
            "Store credit added",
            &format!("A store credit of {amount} was added to your account as an apology."),
            NotificationKind::Refund,
            None,
        )
        .await?;
        let (code, amount) = (code.clone(), *amount);
        notify::email_user(pool, mail_tx, user_id, move |to| MailEvent::ApologyCredit {
            to,
            code,
            amount,
        })
        .await?;
    }

    Ok(IntakeOutcome {
        complaint,
        apology_credit,
    })
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
