//! Database access plumbing shared by the query messages.
//!
//! Read-side queries are expressed as `kanau::processor::Processor`
//! messages processed by [`DatabaseProcessor`]; multi-statement state
//! transitions use explicit `sqlx::Transaction` helpers on the entity
//! types instead.

use sqlx::PgPool;

/// Processor host for read-side query messages.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
