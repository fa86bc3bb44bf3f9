// service/notification_service.rs
use std::sync::Arc;
use num_traits::ToPrimitive;

use crate::{
    db::userdb::UserExt,
    mail::{mails, sendmail::Mailer},
    models::{jobmodel::*, paymentmodel::Payment},
};

/// Best-effort notification sink. Every method logs and, where a recipient is
/// known, sends an email; failures are swallowed with a warning and never
/// propagate to the triggering business operation.
pub struct NotificationService<DB> {
    db_client: Arc<DB>,
    mailer: Arc<dyn Mailer>,
}

impl<DB> NotificationService<DB>
where
    DB: UserExt,
{
    pub fn new(db_client: Arc<DB>, mailer: Arc<dyn Mailer>) -> Self {
        Self { db_client, mailer }
    }

    pub async fn notify_proposal_submitted(&self, job: &Job, proposal: &Proposal) {
        tracing::info!(
            "Proposal {} submitted for job '{}' ({})",
            proposal.id,
            job.title,
            job.id
        );

        let client = match self.db_client.get_user(Some(job.client_id), None, None).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("Client {} not found for proposal notification", job.client_id);
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to load client for proposal notification: {}", e);
                return;
            }
        };

        let amount = proposal.proposed_amount.to_f64().unwrap_or(0.0);
        if let Err(e) = mails::send_proposal_received_email(
            self.mailer.as_ref(),
            &client.email,
            &client.name,
            &job.title,
            amount,
        )
        .await
        {
            tracing::warn!("Proposal-received email failed for {}: {}", client.email, e);
        }
    }

    pub async fn notify_proposal_accepted(&self, job: &Job, proposal: &Proposal) {
        tracing::info!(
            "Proposal {} accepted, job {} now in progress",
            proposal.id,
            job.id
        );

        let student = match self
            .db_client
            .get_user(Some(proposal.student_id), None, None)
            .await
        {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(
                    "Student {} not found for acceptance notification",
                    proposal.student_id
                );
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to load student for acceptance notification: {}", e);
                return;
            }
        };

        if let Err(e) = mails::send_proposal_accepted_email(
            self.mailer.as_ref(),
            &student.email,
            &student.name,
            &job.title,
        )
        .await
        {
            tracing::warn!("Acceptance email failed for {}: {}", student.email, e);
        }
    }

    pub async fn notify_payment_released(&self, job: &Job, payment: &Payment) {
        tracing::info!(
            "Payment {} released for job '{}' ({}), job completed",
            payment.id,
            job.title,
            job.id
        );

        let student_id = match job.assigned_student_id {
            Some(id) => id,
            None => return,
        };

        match self.db_client.get_user(Some(student_id), None, None).await {
            Ok(Some(student)) => {
                let amount = payment.amount.to_f64().unwrap_or(0.0);
                if let Err(e) = mails::send_payment_released_email(
                    self.mailer.as_ref(),
                    &student.email,
                    &student.name,
                    &job.title,
                    amount,
                )
                .await
                {
                    tracing::warn!("Payment-released email failed for {}: {}", student.email, e);
                }
            }
            Ok(None) => {
                tracing::warn!("Student {} not found for release notification", student_id)
            }
            Err(e) => tracing::warn!("Failed to load student for release notification: {}", e),
        }
    }

    pub async fn notify_payment_refunded(&self, job: &Job, payment: &Payment) {
        tracing::info!(
            "Payment {} refunded for job '{}' ({}), job cancelled",
            payment.id,
            job.title,
            job.id
        );

        match self.db_client.get_user(Some(job.client_id), None, None).await {
            Ok(Some(client)) => {
                let amount = payment.amount.to_f64().unwrap_or(0.0);
                if let Err(e) = mails::send_payment_refunded_email(
                    self.mailer.as_ref(),
                    &client.email,
                    &client.name,
                    &job.title,
                    amount,
                )
                .await
                {
                    tracing::warn!("Refund email failed for {}: {}", client.email, e);
                }
            }
            Ok(None) => tracing::warn!("Client {} not found for refund notification", job.client_id),
            Err(e) => tracing::warn!("Failed to load client for refund notification: {}", e),
        }
    }
}
