use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::framework::DatabaseProcessor;

/// An order row. Created at checkout (out of scope here); mutated by the
/// cancellation and complaint workflows. Never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    /// Gateway-side id of the charge; present iff the order was captured
    /// through the payment gateway.
    pub gateway_transaction_id: Option<String>,
    /// Courier-aggregator shipment id; unique, and the only key inbound
    /// courier webhooks are matched on.
    pub shipment_id: Option<String>,
    /// Airway bill / tracking number, informational.
    pub awb: Option<String>,
    pub notes: Option<String>,
    pub created_at: time::OffsetDateTime,
}

const ORDER_COLUMNS: &str = "id, user_id, total, payment_method, payment_status, status, \
     gateway_transaction_id, shipment_id, awb, notes, created_at";

/// Get an order by id.
#[derive(Debug, Clone)]
pub struct GetOrderById {
    pub order_id: Uuid,
}

impl Processor<GetOrderById> for DatabaseProcessor {
    type Output = Option<Order>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderById")]
    async fn process(&self, query: GetOrderById) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(query.order_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Get an order by the courier-aggregator shipment id.
#[derive(Debug, Clone)]
pub struct GetOrderByShipmentId {
    pub shipment_id: String,
}

impl Processor<GetOrderByShipmentId> for DatabaseProcessor {
    type Output = Option<Order>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderByShipmentId")]
    async fn process(&self, query: GetOrderByShipmentId) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE shipment_id = $1"
        ))
        .bind(query.shipment_id)
        .fetch_optional(&self.pool)
        .await
    }
}

impl Order {
    /// Fetch an order by id with a row lock, within a transaction.
    pub async fn lock_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Update the order status within a transaction.
    pub async fn update_status_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Update the payment status within a transaction.
    pub async fn update_payment_status_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(payment_status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Record a courier delivery without opening a transaction.
    pub async fn mark_delivered(pool: &sqlx::PgPool, order_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET status = 'delivered' WHERE id = $1 AND status = 'shipped'")
            .bind(order_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Payment methods for a batch of orders (admin complaint listings).
    pub async fn payment_methods_for(
        pool: &sqlx::PgPool,
        order_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, PaymentMethod)>, sqlx::Error> {
        sqlx::query_as("SELECT id, payment_method FROM orders WHERE id = ANY($1)")
            .bind(order_ids)
            .fetch_all(pool)
            .await
    }
}
