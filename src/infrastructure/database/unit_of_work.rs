//! Unit of Work
//!
//! Transaction boundary for writes that must succeed or fail together,
//! such as a lesson progress upsert and the enrollment recompute it triggers.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::shared::error::AppError;

/// Transaction context that wraps a SQLx transaction.
pub struct TransactionContext {
    tx: Transaction<'static, Postgres>,
}

impl TransactionContext {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    /// Connection to run queries on inside the transaction.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }
}

/// Execute a closure within a transaction.
///
/// The closure hands the context back alongside its result; the transaction
/// commits on `Ok` and is rolled back when the context is dropped on `Err`.
///
/// # Example
/// ```ignore
/// let enrollment = with_transaction(&pool, |mut ctx| async move {
///     let row = sqlx::query_as::<_, EnrollmentRow>("...").fetch_one(ctx.conn()).await?;
///     Ok((row.into_enrollment(), ctx))
/// }).await?;
/// ```
pub async fn with_transaction<F, Fut, T>(pool: &PgPool, f: F) -> Result<T, AppError>
where
    F: FnOnce(TransactionContext) -> Fut,
    Fut: std::future::Future<Output = Result<(T, TransactionContext), AppError>>,
{
    let tx = pool.begin().await.map_err(AppError::Database)?;
    let ctx = TransactionContext::new(tx);

    match f(ctx).await {
        Ok((result, ctx)) => {
            ctx.commit().await?;
            Ok(result)
        }
        Err(e) => {
            // Dropping the context rolls the transaction back
            Err(e)
        }
    }
}
