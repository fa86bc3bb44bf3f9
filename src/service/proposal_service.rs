// service/proposal_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::TxProvider, jobdb::JobExt, userdb::UserExt},
    dtos::jobdtos::SubmitProposalDto,
    models::jobmodel::*,
    service::{error::ServiceError, job_service::to_money, notification_service::NotificationService},
};

/// Proposal workflow engine: submission with duplicate prevention, and the
/// acceptance cascade that moves the job and every sibling proposal in one
/// transaction.
pub struct ProposalService<DB> {
    db_client: Arc<DB>,
    notification_service: Arc<NotificationService<DB>>,
}

impl<DB> ProposalService<DB>
where
    DB: JobExt + UserExt,
{
    pub fn new(db_client: Arc<DB>, notification_service: Arc<NotificationService<DB>>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn submit_proposal(
        &self,
        job_id: Uuid,
        student_id: Uuid,
        proposal_data: SubmitProposalDto,
    ) -> Result<Proposal, ServiceError> {
        if proposal_data.cover_letter.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Cover letter cannot be empty".to_string(),
            ));
        }
        if proposal_data.estimated_days <= 0 {
            return Err(ServiceError::Validation(
                "Estimated days must be positive".to_string(),
            ));
        }
        let proposed_amount = to_money(proposal_data.proposed_amount)?;

        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let student = self
            .db_client
            .get_user(Some(student_id), None, None)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(student_id.to_string()))?;

        // Once a job leaves OPEN no further proposals are accepted.
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobState {
                job_id,
                status: job.status,
                expected: JobStatus::Open,
            });
        }

        if self
            .db_client
            .has_active_proposal(job_id, student.id)
            .await?
        {
            return Err(ServiceError::DuplicateProposal {
                job_id,
                student_id: student.id,
            });
        }

        let proposal = self
            .db_client
            .create_proposal(
                job_id,
                student.id,
                proposal_data.cover_letter,
                proposed_amount,
                proposal_data.estimated_days,
            )
            .await?;

        // Best-effort; a failed notification never fails the submission.
        self.notification_service
            .notify_proposal_submitted(&job, &proposal)
            .await;

        Ok(proposal)
    }

    /// Accepts a proposal on behalf of the job's owning client. The whole
    /// cascade runs in one transaction with the job row locked:
    /// job -> in_progress + assigned student, sibling PENDING proposals ->
    /// rejected, target proposal -> accepted. A concurrent accept on the same
    /// job observes the lock and fails the OPEN re-check.
    pub async fn accept_proposal(
        &self,
        proposal_id: Uuid,
        acting_client_email: &str,
    ) -> Result<Job, ServiceError> {
        let proposal = self
            .db_client
            .get_proposal_by_id(proposal_id)
            .await?
            .ok_or(ServiceError::ProposalNotFound(proposal_id))?;

        let client = self
            .db_client
            .get_user(None, Some(acting_client_email), None)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(acting_client_email.to_string()))?;

        let mut tx = self.db_client.begin_tx().await?;

        let job = self
            .db_client
            .lock_job_tx(&mut tx, proposal.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(proposal.job_id))?;

        if job.client_id != client.id {
            return Err(ServiceError::UnauthorizedJobAccess(client.id, job.id));
        }

        // Re-checked under the lock so concurrent accepts serialize.
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobState {
                job_id: job.id,
                status: job.status,
                expected: JobStatus::Open,
            });
        }

        if proposal.status != ProposalStatus::Pending {
            return Err(ServiceError::Validation(format!(
                "Proposal {} is already {}",
                proposal_id,
                proposal.status.to_str()
            )));
        }

        let updated_job = self
            .db_client
            .assign_student_tx(&mut tx, job.id, proposal.student_id)
            .await?;

        let rejected = self
            .db_client
            .reject_other_proposals_tx(&mut tx, job.id, proposal_id)
            .await?;

        let accepted = self
            .db_client
            .set_proposal_status_tx(&mut tx, proposal_id, ProposalStatus::Accepted)
            .await?;

        self.db_client.commit_tx(tx).await?;

        tracing::info!(
            "Proposal {} accepted for job {} ({} sibling proposals rejected)",
            proposal_id,
            job.id,
            rejected
        );

        self.notification_service
            .notify_proposal_accepted(&updated_job, &accepted)
            .await;

        Ok(updated_job)
    }

    pub async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Proposal>, ServiceError> {
        // Listing proposals for an unknown job is a not-found, not an empty list.
        self.db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        Ok(self.db_client.get_job_proposals(job_id).await?)
    }

    pub async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<Proposal>, ServiceError> {
        Ok(self.db_client.get_student_proposals(student_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memorydb::MemoryStore;
    use crate::mail::sendmail::LogMailer;
    use crate::models::usermodel::UserRole;

    fn service(store: Arc<MemoryStore>) -> ProposalService<MemoryStore> {
        let notifications = Arc::new(NotificationService::new(store.clone(), Arc::new(LogMailer)));
        ProposalService::new(store, notifications)
    }

    fn proposal_dto() -> SubmitProposalDto {
        SubmitProposalDto {
            cover_letter: "I have built three of these for coursework.".to_string(),
            proposed_amount: 450.0,
            estimated_days: 10,
        }
    }

    #[tokio::test]
    async fn second_active_proposal_from_same_student_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let client = store.seed_user(UserRole::Client);
        let student = store.seed_user(UserRole::Student);
        let job = store.seed_job(client.id, JobStatus::Open, None);
        let svc = service(store.clone());

        svc.submit_proposal(job.id, student.id, proposal_dto())
            .await
            .unwrap();

        let err = svc
            .submit_proposal(job.id, student.id, proposal_dto())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::DuplicateProposal { .. }));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
        assert_eq!(store.get_job_proposals(job.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn acceptance_cascade_assigns_and_rejects_siblings() {
        let store = Arc::new(MemoryStore::new());
        let client = store.seed_user(UserRole::Client);
        let winner = store.seed_user(UserRole::Student);
        let runner_up = store.seed_user(UserRole::Student);
        let job = store.seed_job(client.id, JobStatus::Open, None);
        let svc = service(store.clone());

        let winning = svc
            .submit_proposal(job.id, winner.id, proposal_dto())
            .await
            .unwrap();
        svc.submit_proposal(job.id, runner_up.id, proposal_dto())
            .await
            .unwrap();

        let updated_job = svc.accept_proposal(winning.id, &client.email).await.unwrap();

        assert_eq!(updated_job.status, JobStatus::InProgress);
        assert_eq!(updated_job.assigned_student_id, Some(winner.id));
        assert!(updated_job.assignment_is_consistent());

        let proposals = store.get_job_proposals(job.id).await.unwrap();
        let accepted: Vec<_> = proposals
            .iter()
            .filter(|p| p.status == ProposalStatus::Accepted)
            .collect();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, winning.id);
        assert!(proposals
            .iter()
            .filter(|p| p.id != winning.id)
            .all(|p| p.status == ProposalStatus::Rejected));
    }

    #[tokio::test]
    async fn accepting_on_a_started_job_fails() {
        let store = Arc::new(MemoryStore::new());
        let client = store.seed_user(UserRole::Client);
        let first = store.seed_user(UserRole::Student);
        let second = store.seed_user(UserRole::Student);
        let job = store.seed_job(client.id, JobStatus::Open, None);
        let svc = service(store.clone());

        let first_proposal = svc
            .submit_proposal(job.id, first.id, proposal_dto())
            .await
            .unwrap();
        let second_proposal = svc
            .submit_proposal(job.id, second.id, proposal_dto())
            .await
            .unwrap();

        svc.accept_proposal(first_proposal.id, &client.email)
            .await
            .unwrap();

        let err = svc
            .accept_proposal(second_proposal.id, &client.email)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidJobState { .. }));
    }

    #[tokio::test]
    async fn only_the_job_owner_can_accept() {
        let store = Arc::new(MemoryStore::new());
        let owner = store.seed_user(UserRole::Client);
        let other_client = store.seed_user(UserRole::Client);
        let student = store.seed_user(UserRole::Student);
        let job = store.seed_job(owner.id, JobStatus::Open, None);
        let svc = service(store.clone());

        let proposal = svc
            .submit_proposal(job.id, student.id, proposal_dto())
            .await
            .unwrap();

        let err = svc
            .accept_proposal(proposal.id, &other_client.email)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnauthorizedJobAccess(_, _)));

        let unchanged = store.get_job_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, JobStatus::Open);
    }
}
