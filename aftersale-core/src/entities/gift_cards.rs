use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::GiftCardSource;

/// A balance-bearing store-credit code.
///
/// Minted only by the refund and apology flows; redemption (balance
/// decrement) happens elsewhere. Partial unique indexes on
/// `complaint_id`/`refund_request_id` are the database-level backstop
/// against double issuance.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GiftCard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub amount: Decimal,
    pub balance: Decimal,
    pub source: GiftCardSource,
    pub complaint_id: Option<Uuid>,
    pub refund_request_id: Option<Uuid>,
    pub expires_at: time::OffsetDateTime,
    pub created_at: time::OffsetDateTime,
}

const GIFT_CARD_COLUMNS: &str = "id, user_id, code, amount, balance, source, complaint_id, \
     refund_request_id, expires_at, created_at";

/// Fields for a new gift card. Balance starts equal to the amount.
#[derive(Debug, Clone)]
pub struct NewGiftCard {
    pub user_id: Uuid,
    pub code: String,
    pub amount: Decimal,
    pub source: GiftCardSource,
    pub complaint_id: Option<Uuid>,
    pub refund_request_id: Option<Uuid>,
    pub expires_at: time::OffsetDateTime,
}

impl GiftCard {
    /// Insert a gift card within a transaction. An insert failure aborts
    /// the enclosing resolution.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: NewGiftCard,
    ) -> Result<GiftCard, sqlx::Error> {
        sqlx::query_as::<_, GiftCard>(&format!(
            "INSERT INTO gift_cards \
                (id, user_id, code, amount, balance, source, complaint_id, refund_request_id, expires_at) \
             VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8) \
             RETURNING {GIFT_CARD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.code)
        .bind(new.amount)
        .bind(new.source)
        .bind(new.complaint_id)
        .bind(new.refund_request_id)
        .bind(new.expires_at)
        .fetch_one(&mut **tx)
        .await
    }
}
