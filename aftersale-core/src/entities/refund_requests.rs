use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{RefundMethod, RefundState};
use crate::framework::DatabaseProcessor;

/// A refund owed for a cancelled prepaid order.
///
/// Created in `pending_user_selection` when an OTP-verified cancellation
/// lands on a prepaid order; advanced by the same saga executor that
/// drives complaint refunds.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefundRequest {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub method: Option<RefundMethod>,
    pub state: RefundState,
    pub gateway_reference: Option<String>,
    pub reconcile_attempts: i32,
    pub reconcile_last_at: Option<time::OffsetDateTime>,
    pub store_credit_code: Option<String>,
    pub created_at: time::OffsetDateTime,
    pub completed_at: Option<time::OffsetDateTime>,
}

const REFUND_REQUEST_COLUMNS: &str = "id, order_id, user_id, amount, method, state, gateway_reference, \
     reconcile_attempts, reconcile_last_at, store_credit_code, created_at, completed_at";

/// Get a refund request by id.
#[derive(Debug, Clone)]
pub struct GetRefundRequestById {
    pub refund_request_id: Uuid,
}

impl Processor<GetRefundRequestById> for DatabaseProcessor {
    type Output = Option<RefundRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetRefundRequestById")]
    async fn process(
        &self,
        query: GetRefundRequestById,
    ) -> Result<Option<RefundRequest>, sqlx::Error> {
        sqlx::query_as::<_, RefundRequest>(&format!(
            "SELECT {REFUND_REQUEST_COLUMNS} FROM refund_requests WHERE id = $1"
        ))
        .bind(query.refund_request_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// A cancellation refund stuck in `processing` against the gateway.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StuckRequestRefund {
    pub refund_request_id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub gateway_transaction_id: String,
    pub reconcile_attempts: i32,
    pub reconcile_last_at: Option<time::OffsetDateTime>,
}

/// Fetch refund requests whose gateway refund awaits reconciliation.
#[derive(Debug, Clone)]
pub struct ListStuckRequestRefunds {
    pub limit: i64,
}

impl Processor<ListStuckRequestRefunds> for DatabaseProcessor {
    type Output = Vec<StuckRequestRefund>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListStuckRequestRefunds")]
    async fn process(
        &self,
        query: ListStuckRequestRefunds,
    ) -> Result<Vec<StuckRequestRefund>, sqlx::Error> {
        sqlx::query_as::<_, StuckRequestRefund>(
            "SELECT r.id AS refund_request_id, r.order_id, r.user_id, r.amount, \
                    o.gateway_transaction_id, r.reconcile_attempts, r.reconcile_last_at \
             FROM refund_requests r \
             JOIN orders o ON r.order_id = o.id \
             WHERE r.state = 'processing' \
               AND r.method = 'original_payment' \
               AND o.gateway_transaction_id IS NOT NULL \
             ORDER BY r.created_at \
             LIMIT $1",
        )
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
    }
}

impl RefundRequest {
    /// Insert a refund request awaiting the customer's method selection.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<RefundRequest, sqlx::Error> {
        sqlx::query_as::<_, RefundRequest>(&format!(
            "INSERT INTO refund_requests (id, order_id, user_id, amount) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {REFUND_REQUEST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut **tx)
        .await
    }

    /// Fetch by id with a row lock, within a transaction.
    pub async fn lock_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        refund_request_id: Uuid,
    ) -> Result<Option<RefundRequest>, sqlx::Error> {
        sqlx::query_as::<_, RefundRequest>(&format!(
            "SELECT {REFUND_REQUEST_COLUMNS} FROM refund_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(refund_request_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Step marker: the refund is being dispatched.
    pub async fn mark_processing_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        refund_request_id: Uuid,
        method: RefundMethod,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE refund_requests SET method = $2, state = 'processing' WHERE id = $1",
        )
        .bind(refund_request_id)
        .bind(method)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Terminal marker: refund paid out.
    pub async fn mark_completed_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        refund_request_id: Uuid,
        store_credit_code: Option<&str>,
        gateway_reference: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE refund_requests \
             SET state = 'completed', \
                 store_credit_code = COALESCE($2, store_credit_code), \
                 gateway_reference = COALESCE($3, gateway_reference), \
                 completed_at = now() \
             WHERE id = $1",
        )
        .bind(refund_request_id)
        .bind(store_credit_code)
        .bind(gateway_reference)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Terminal marker: refund failed; left for manual reconciliation.
    pub async fn mark_failed_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        refund_request_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE refund_requests SET state = 'failed' WHERE id = $1")
            .bind(refund_request_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Count a reconciliation poll against the attempt cap.
    pub async fn bump_reconcile_attempts(
        pool: &sqlx::PgPool,
        refund_request_id: Uuid,
    ) -> Result<i32, sqlx::Error> {
        let (attempts,): (i32,) = sqlx::query_as(
            "UPDATE refund_requests \
             SET reconcile_attempts = reconcile_attempts + 1, reconcile_last_at = now() \
             WHERE id = $1 \
             RETURNING reconcile_attempts",
        )
        .bind(refund_request_id)
        .fetch_one(pool)
        .await?;
        Ok(attempts)
    }
}
