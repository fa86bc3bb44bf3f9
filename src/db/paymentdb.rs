// db/paymentdb.rs
use async_trait::async_trait;
use sqlx::types::BigDecimal;
use sqlx::Error;
use uuid::Uuid;

use super::db::{DBClient, TxProvider};
use crate::models::paymentmodel::*;

const PAYMENT_COLUMNS: &str = r#"
    id, job_id, amount, payment_method, status, escrow_account,
    created_at, released_at, cancelled_at
"#;

#[async_trait]
pub trait PaymentExt: TxProvider {
    async fn create_payment(
        &self,
        job_id: Uuid,
        amount: BigDecimal,
        method: PaymentMethod,
        status: PaymentStatus,
        escrow_account: String,
    ) -> Result<Payment, Error>;

    async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, Error>;

    async fn get_payment_by_job_id(&self, job_id: Uuid) -> Result<Option<Payment>, Error>;

    /// A payment still counts against the one-escrow-per-job rule until it
    /// reaches a terminal state (released, refunded or failed).
    async fn job_has_active_payment(&self, job_id: Uuid) -> Result<bool, Error>;

    async fn job_has_payment(&self, job_id: Uuid) -> Result<bool, Error>;

    async fn mark_payment_held(&self, payment_id: Uuid) -> Result<Payment, Error>;

    async fn mark_payment_failed(&self, payment_id: Uuid) -> Result<Payment, Error>;

    // Transaction-scoped pieces of the release/refund couplings.
    async fn lock_payment_tx(
        &self,
        tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, Error>;

    async fn set_payment_released_tx(
        &self,
        tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Payment, Error>;

    async fn set_payment_refunded_tx(
        &self,
        tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Payment, Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn create_payment(
        &self,
        job_id: Uuid,
        amount: BigDecimal,
        method: PaymentMethod,
        status: PaymentStatus,
        escrow_account: String,
    ) -> Result<Payment, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (job_id, amount, payment_method, status, escrow_account)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(amount)
        .bind(method)
        .bind(status)
        .bind(escrow_account)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"#
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment_by_job_id(&self, job_id: Uuid) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE job_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn job_has_active_payment(&self, job_id: Uuid) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM payments
                WHERE job_id = $1 AND status IN ('pending', 'held_in_escrow')
            )
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn job_has_payment(&self, job_id: Uuid) -> Result<bool, Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payments WHERE job_id = $1)")
                .bind(job_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn mark_payment_held(&self, payment_id: Uuid) -> Result<Payment, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'held_in_escrow'
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn mark_payment_failed(&self, payment_id: Uuid) -> Result<Payment, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'failed', cancelled_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn lock_payment_tx(
        &self,
        tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE"#
        ))
        .bind(payment_id)
        .fetch_optional(&mut **tx)
        .await
    }

    async fn set_payment_released_tx(
        &self,
        tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Payment, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'released', released_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .fetch_one(&mut **tx)
        .await
    }

    async fn set_payment_refunded_tx(
        &self,
        tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Payment, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'refunded', cancelled_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .fetch_one(&mut **tx)
        .await
    }
}
