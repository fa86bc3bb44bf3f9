// service/payment_service.rs
use std::sync::Arc;
use rand::distr::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::{
    db::{db::TxProvider, jobdb::JobExt, paymentdb::PaymentExt, userdb::UserExt},
    models::{jobmodel::JobStatus, paymentmodel::*},
    service::{
        error::ServiceError, job_service::to_money, notification_service::NotificationService,
        payment_gateway::PaymentGateway,
    },
};

/// Escrow payment engine. Funds are held against a job, then released to the
/// student (job completed) or refunded to the client (job cancelled); each of
/// those couplings commits in a single transaction.
pub struct PaymentService<DB> {
    db_client: Arc<DB>,
    gateway: Arc<dyn PaymentGateway>,
    notification_service: Arc<NotificationService<DB>>,
}

impl<DB> PaymentService<DB>
where
    DB: JobExt + PaymentExt + UserExt,
{
    pub fn new(
        db_client: Arc<DB>,
        gateway: Arc<dyn PaymentGateway>,
        notification_service: Arc<NotificationService<DB>>,
    ) -> Self {
        Self {
            db_client,
            gateway,
            notification_service,
        }
    }

    pub async fn create_escrow_payment(
        &self,
        job_id: Uuid,
        amount: f64,
        method_input: &str,
    ) -> Result<Payment, ServiceError> {
        let method = PaymentMethod::parse(method_input).map_err(ServiceError::Validation)?;
        let amount_bd = to_money(amount)?;

        self.db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        // One active escrow per job; released/refunded/failed payments
        // do not block a new one.
        if self.db_client.job_has_active_payment(job_id).await? {
            return Err(ServiceError::EscrowAlreadyExists(job_id));
        }

        let payment = self
            .db_client
            .create_payment(
                job_id,
                amount_bd,
                method,
                PaymentStatus::Pending,
                generate_escrow_account(),
            )
            .await?;

        match self.gateway.charge(method, "escrow-funding", amount).await {
            Ok(true) => {
                let held = self.db_client.mark_payment_held(payment.id).await?;
                tracing::info!(
                    "Escrow {} funded for job {} ({} via {})",
                    held.escrow_account,
                    job_id,
                    amount,
                    method.to_str()
                );
                Ok(held)
            }
            Ok(false) => {
                let _ = self.db_client.mark_payment_failed(payment.id).await?;
                Err(ServiceError::Gateway(format!(
                    "Charge of {} via {} was declined",
                    amount,
                    method.to_str()
                )))
            }
            Err(e) => {
                let _ = self.db_client.mark_payment_failed(payment.id).await?;
                Err(e)
            }
        }
    }

    /// Moves the payment to RELEASED and the job to COMPLETED in one
    /// transaction. Only the client owning the job may release. Calling this
    /// on an already-terminal payment fails and leaves state untouched.
    pub async fn release_payment(
        &self,
        payment_id: Uuid,
        acting_client_id: Uuid,
    ) -> Result<Payment, ServiceError> {
        let mut tx = self.db_client.begin_tx().await?;

        let payment = self
            .db_client
            .lock_payment_tx(&mut tx, payment_id)
            .await?
            .ok_or(ServiceError::PaymentNotFound(payment_id))?;

        if payment.status != PaymentStatus::HeldInEscrow {
            return Err(ServiceError::PaymentNotInEscrow {
                payment_id,
                status: payment.status,
            });
        }

        let job = self
            .db_client
            .lock_job_tx(&mut tx, payment.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(payment.job_id))?;

        if job.client_id != acting_client_id {
            return Err(ServiceError::UnauthorizedJobAccess(acting_client_id, job.id));
        }

        if !job.status.can_transition_to(JobStatus::Completed) {
            return Err(ServiceError::InvalidJobTransition {
                job_id: job.id,
                from: job.status,
                to: JobStatus::Completed,
            });
        }

        let released = self
            .db_client
            .set_payment_released_tx(&mut tx, payment_id)
            .await?;
        let completed_job = self.db_client.complete_job_tx(&mut tx, job.id).await?;

        self.db_client.commit_tx(tx).await?;

        tracing::info!(
            "Payment {} released, job {} completed",
            payment_id,
            completed_job.id
        );

        self.notification_service
            .notify_payment_released(&completed_job, &released)
            .await;

        Ok(released)
    }

    /// Moves the payment to REFUNDED and the job to CANCELLED in one
    /// transaction; the job's assignment is cleared alongside. Only the
    /// client owning the job may refund.
    pub async fn refund_payment(
        &self,
        payment_id: Uuid,
        acting_client_id: Uuid,
    ) -> Result<Payment, ServiceError> {
        let mut tx = self.db_client.begin_tx().await?;

        let payment = self
            .db_client
            .lock_payment_tx(&mut tx, payment_id)
            .await?
            .ok_or(ServiceError::PaymentNotFound(payment_id))?;

        if payment.status != PaymentStatus::HeldInEscrow {
            return Err(ServiceError::PaymentNotInEscrow {
                payment_id,
                status: payment.status,
            });
        }

        let job = self
            .db_client
            .lock_job_tx(&mut tx, payment.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(payment.job_id))?;

        if job.client_id != acting_client_id {
            return Err(ServiceError::UnauthorizedJobAccess(acting_client_id, job.id));
        }

        if !job.status.can_transition_to(JobStatus::Cancelled) {
            return Err(ServiceError::InvalidJobTransition {
                job_id: job.id,
                from: job.status,
                to: JobStatus::Cancelled,
            });
        }

        let refunded = self
            .db_client
            .set_payment_refunded_tx(&mut tx, payment_id)
            .await?;
        let cancelled_job = self.db_client.cancel_job_tx(&mut tx, job.id).await?;

        self.db_client.commit_tx(tx).await?;

        tracing::info!(
            "Payment {} refunded, job {} cancelled",
            payment_id,
            cancelled_job.id
        );

        self.notification_service
            .notify_payment_refunded(&cancelled_job, &refunded)
            .await;

        Ok(refunded)
    }

    pub async fn get_payment_for_job(&self, job_id: Uuid) -> Result<Payment, ServiceError> {
        self.db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        self.db_client
            .get_payment_by_job_id(job_id)
            .await?
            .ok_or(ServiceError::NoPaymentForJob(job_id))
    }

    /// Simulated gateway call exposed for the demo frontend; no escrow state
    /// is touched.
    pub async fn process_mock_payment(
        &self,
        method_input: &str,
        account_details: &str,
        amount: f64,
    ) -> Result<bool, ServiceError> {
        let method = PaymentMethod::parse(method_input).map_err(ServiceError::Validation)?;
        if amount <= 0.0 {
            return Err(ServiceError::Validation(
                "Amount must be positive".to_string(),
            ));
        }
        self.gateway.charge(method, account_details, amount).await
    }
}

/// Opaque escrow reference with 128+ bits of entropy.
fn generate_escrow_account() -> String {
    let rng = rand::rng();
    let token: String = rng
        .sample_iter(Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("esc_{}", token)
}
