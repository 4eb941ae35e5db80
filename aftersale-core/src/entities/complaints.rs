use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{
    ComplaintKind, ComplaintStatus, RefundMethod, RefundState, ResolutionKind,
};
use crate::framework::DatabaseProcessor;

/// A customer-reported order problem tracked through the
/// investigation/resolution lifecycle.
///
/// The refund columns double as the saga's persisted step markers:
/// `refund_state` is advanced inside the same transaction that holds the
/// row lock, so a retried trigger observes the marker instead of
/// re-dispatching the payout.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderComplaint {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub kind: ComplaintKind,
    pub status: ComplaintStatus,
    pub resolution: ResolutionKind,
    pub refund_method: Option<RefundMethod>,
    pub refund_state: RefundState,
    pub refund_amount: Option<Decimal>,
    /// Reference returned by the gateway on an accepted refund.
    pub gateway_reference: Option<String>,
    pub reconcile_attempts: i32,
    pub reconcile_last_at: Option<time::OffsetDateTime>,
    pub store_credit_code: Option<String>,
    pub apology_credit_code: Option<String>,
    pub description: Option<String>,
    pub created_at: time::OffsetDateTime,
    pub resolved_at: Option<time::OffsetDateTime>,
}

const COMPLAINT_COLUMNS: &str = "id, order_id, user_id, kind, status, resolution, refund_method, \
     refund_state, refund_amount, gateway_reference, reconcile_attempts, reconcile_last_at, \
     store_credit_code, apology_credit_code, description, created_at, resolved_at";

// ---------------------------------------------------------------------------
// Query messages
// ---------------------------------------------------------------------------

/// Get a complaint by id.
#[derive(Debug, Clone)]
pub struct GetComplaintById {
    pub complaint_id: Uuid,
}

impl Processor<GetComplaintById> for DatabaseProcessor {
    type Output = Option<OrderComplaint>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetComplaintById")]
    async fn process(
        &self,
        query: GetComplaintById,
    ) -> Result<Option<OrderComplaint>, sqlx::Error> {
        sqlx::query_as::<_, OrderComplaint>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM order_complaints WHERE id = $1"
        ))
        .bind(query.complaint_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Find the open complaint for an order, if any. At most one complaint
/// per order may be open (enforced by a partial unique index).
#[derive(Debug, Clone)]
pub struct FindOpenComplaintForOrder {
    pub order_id: Uuid,
}

impl Processor<FindOpenComplaintForOrder> for DatabaseProcessor {
    type Output = Option<OrderComplaint>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindOpenComplaintForOrder")]
    async fn process(
        &self,
        query: FindOpenComplaintForOrder,
    ) -> Result<Option<OrderComplaint>, sqlx::Error> {
        sqlx::query_as::<_, OrderComplaint>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM order_complaints \
             WHERE order_id = $1 AND status IN ('investigating', 'awaiting_refund_selection')"
        ))
        .bind(query.order_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// List complaints for the admin console, paginated and filterable.
#[derive(Debug, Clone)]
pub struct ListComplaints {
    pub limit: i64,
    pub offset: i64,
    pub status: Option<ComplaintStatus>,
    pub kind: Option<ComplaintKind>,
    pub order_id: Option<Uuid>,
}

impl Processor<ListComplaints> for DatabaseProcessor {
    type Output = Vec<OrderComplaint>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListComplaints")]
    async fn process(&self, query: ListComplaints) -> Result<Vec<OrderComplaint>, sqlx::Error> {
        sqlx::query_as::<_, OrderComplaint>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM order_complaints \
             WHERE ($3::complaint_status IS NULL OR status = $3) \
               AND ($4::complaint_kind IS NULL OR kind = $4) \
               AND ($5::uuid IS NULL OR order_id = $5) \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(query.limit)
        .bind(query.offset)
        .bind(query.status)
        .bind(query.kind)
        .bind(query.order_id)
        .fetch_all(&self.pool)
        .await
    }
}

/// A refund stuck in `processing` against the gateway, joined with the
/// order fields the reconciler needs to poll the gateway.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StuckGatewayRefund {
    pub complaint_id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub gateway_transaction_id: String,
    pub reconcile_attempts: i32,
    pub reconcile_last_at: Option<time::OffsetDateTime>,
}

/// Fetch complaints whose gateway refund awaits reconciliation.
#[derive(Debug, Clone)]
pub struct ListStuckGatewayRefunds {
    pub limit: i64,
}

impl Processor<ListStuckGatewayRefunds> for DatabaseProcessor {
    type Output = Vec<StuckGatewayRefund>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListStuckGatewayRefunds")]
    async fn process(
        &self,
        query: ListStuckGatewayRefunds,
    ) -> Result<Vec<StuckGatewayRefund>, sqlx::Error> {
        sqlx::query_as::<_, StuckGatewayRefund>(
            "SELECT c.id AS complaint_id, c.order_id, c.user_id, \
                    c.refund_amount AS amount, o.gateway_transaction_id, \
                    c.reconcile_attempts, c.reconcile_last_at \
             FROM order_complaints c \
             JOIN orders o ON c.order_id = o.id \
             WHERE c.refund_state = 'processing' \
               AND c.refund_method = 'original_payment' \
               AND o.gateway_transaction_id IS NOT NULL \
             ORDER BY c.created_at \
             LIMIT $1",
        )
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// State transitions
// ---------------------------------------------------------------------------

/// Fields for a new complaint.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub kind: ComplaintKind,
    pub description: Option<String>,
}

impl OrderComplaint {
    /// Insert a new complaint in `investigating`, within a transaction.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: NewComplaint,
    ) -> Result<OrderComplaint, sqlx::Error> {
        sqlx::query_as::<_, OrderComplaint>(&format!(
            "INSERT INTO order_complaints (id, order_id, user_id, kind, description) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.order_id)
        .bind(new.user_id)
        .bind(new.kind)
        .bind(new.description)
        .fetch_one(&mut **tx)
        .await
    }

    /// Fetch a complaint by id with a row lock, within a transaction.
    ///
    /// Every saga transition starts here; the lock serializes a webhook
    /// retry racing a user's explicit selection.
    pub async fn lock_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
    ) -> Result<Option<OrderComplaint>, sqlx::Error> {
        sqlx::query_as::<_, OrderComplaint>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM order_complaints WHERE id = $1 FOR UPDATE"
        ))
        .bind(complaint_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Record the apology credit issued at intake.
    pub async fn set_apology_credit_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
        code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE order_complaints SET apology_credit_code = $2 WHERE id = $1")
            .bind(complaint_id)
            .bind(code)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Record the staff-decided resolution.
    pub async fn set_resolution_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
        resolution: ResolutionKind,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE order_complaints SET resolution = $2 WHERE id = $1")
            .bind(complaint_id)
            .bind(resolution)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Park the complaint until the customer picks a refund method.
    pub async fn park_awaiting_selection_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
        amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE order_complaints \
             SET status = 'awaiting_refund_selection', \
                 refund_state = 'pending_user_selection', \
                 refund_amount = $2 \
             WHERE id = $1",
        )
        .bind(complaint_id)
        .bind(amount)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Step marker: the refund is being dispatched. Committed before any
    /// external call so a crash or retry cannot double-pay.
    pub async fn mark_processing_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
        method: RefundMethod,
        amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE order_complaints \
             SET refund_method = $2, refund_state = 'processing', refund_amount = $3 \
             WHERE id = $1",
        )
        .bind(complaint_id)
        .bind(method)
        .bind(amount)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Terminal marker: refund paid out. Resolves the complaint.
    pub async fn mark_completed_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
        store_credit_code: Option<&str>,
        gateway_reference: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE order_complaints \
             SET refund_state = 'completed', status = 'resolved', resolution = 'refund', \
                 store_credit_code = COALESCE($2, store_credit_code), \
                 gateway_reference = COALESCE($3, gateway_reference), \
                 resolved_at = now() \
             WHERE id = $1",
        )
        .bind(complaint_id)
        .bind(store_credit_code)
        .bind(gateway_reference)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Terminal marker: refund failed; left for manual reconciliation.
    pub async fn mark_failed_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE order_complaints SET refund_state = 'failed' WHERE id = $1")
            .bind(complaint_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Mark the complaint resolved without a refund (replacement or
    /// rejection paths).
    pub async fn mark_resolved_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        complaint_id: Uuid,
        resolution: ResolutionKind,
        status: ComplaintStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE order_complaints \
             SET resolution = $2, status = $3, resolved_at = now() \
             WHERE id = $1",
        )
        .bind(complaint_id)
        .bind(resolution)
        .bind(status)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Count a reconciliation poll against the attempt cap.
    pub async fn bump_reconcile_attempts(
        pool: &sqlx::PgPool,
        complaint_id: Uuid,
    ) -> Result<i32, sqlx::Error> {
        let (attempts,): (i32,) = sqlx::query_as(
            "UPDATE order_complaints \
             SET reconcile_attempts = reconcile_attempts + 1, reconcile_last_at = now() \
             WHERE id = $1 \
             RETURNING reconcile_attempts",
        )
        .bind(complaint_id)
        .fetch_one(pool)
        .await?;
        Ok(attempts)
    }
}
