// service/job_service.rs
use std::sync::Arc;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{jobdb::JobExt, paymentdb::PaymentExt},
    dtos::jobdtos::{CreateJobDto, UpdateJobDto},
    models::jobmodel::*,
    service::error::ServiceError,
};

/// Job lifecycle manager: creation, owner-guarded edits, the status state
/// machine, and the read projections over jobs.
pub struct JobService<DB> {
    db_client: Arc<DB>,
}

impl<DB> JobService<DB>
where
    DB: JobExt + PaymentExt,
{
    pub fn new(db_client: Arc<DB>) -> Self {
        Self { db_client }
    }

    pub async fn create_job(
        &self,
        client_id: Uuid,
        job_data: CreateJobDto,
    ) -> Result<Job, ServiceError> {
        let category = JobCategory::parse(&job_data.category).map_err(ServiceError::Validation)?;
        let budget = to_money(job_data.budget)?;

        let job = self
            .db_client
            .create_job(
                client_id,
                category,
                job_data.title,
                job_data.description,
                budget,
                job_data.deadline,
            )
            .await?;

        tracing::info!("Job '{}' created by client {}", job.title, client_id);
        Ok(job)
    }

    /// Edits are permitted only while the job is OPEN and before any proposal
    /// has been submitted.
    pub async fn update_job(
        &self,
        job_id: Uuid,
        client_id: Uuid,
        job_data: UpdateJobDto,
    ) -> Result<Job, ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.client_id != client_id {
            return Err(ServiceError::UnauthorizedJobAccess(client_id, job_id));
        }

        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobState {
                job_id,
                status: job.status,
                expected: JobStatus::Open,
            });
        }

        if self.db_client.job_has_proposals(job_id).await? {
            return Err(ServiceError::JobLocked(
                job_id,
                "proposals have already been submitted".to_string(),
            ));
        }

        let category = JobCategory::parse(&job_data.category).map_err(ServiceError::Validation)?;
        let budget = to_money(job_data.budget)?;

        let updated = self
            .db_client
            .update_job_fields(
                job_id,
                job_data.title,
                job_data.description,
                category,
                budget,
                job_data.deadline,
            )
            .await?;

        Ok(updated)
    }

    /// Owner-only. The one transition this endpoint refuses even though the
    /// state machine allows it is OPEN -> IN_PROGRESS: a job only starts
    /// through proposal acceptance, which also assigns the student.
    pub async fn update_job_status(
        &self,
        job_id: Uuid,
        client_id: Uuid,
        new_status: JobStatus,
    ) -> Result<Job, ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.client_id != client_id {
            return Err(ServiceError::UnauthorizedJobAccess(client_id, job_id));
        }

        if new_status == JobStatus::InProgress {
            return Err(ServiceError::Validation(
                "A job moves to in_progress by accepting a proposal".to_string(),
            ));
        }

        if !job.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidJobTransition {
                job_id,
                from: job.status,
                to: new_status,
            });
        }

        let updated = self.db_client.update_job_status(job_id, new_status).await?;
        tracing::info!(
            "Job {} moved {} -> {}",
            job_id,
            job.status.to_str(),
            new_status.to_str()
        );
        Ok(updated)
    }

    /// Deletion is forbidden while proposals or a payment reference the job;
    /// there is no cascade.
    pub async fn delete_job(&self, job_id: Uuid, client_id: Uuid) -> Result<(), ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.client_id != client_id {
            return Err(ServiceError::UnauthorizedJobAccess(client_id, job_id));
        }

        if self.db_client.job_has_proposals(job_id).await? {
            return Err(ServiceError::JobLocked(
                job_id,
                "proposals reference this job".to_string(),
            ));
        }

        if self.db_client.job_has_payment(job_id).await? {
            return Err(ServiceError::JobLocked(
                job_id,
                "a payment references this job".to_string(),
            ));
        }

        self.db_client.delete_job(job_id).await?;
        tracing::info!("Job {} deleted by client {}", job_id, client_id);
        Ok(())
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn list_open_jobs(&self) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_open_jobs().await?)
    }

    pub async fn list_by_category(&self, category: JobCategory) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_jobs_by_category(category).await?)
    }

    pub async fn search(
        &self,
        keyword: Option<&str>,
        category: Option<JobCategory>,
    ) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.search_jobs(keyword, category).await?)
    }
}

pub fn to_money(amount: f64) -> Result<BigDecimal, ServiceError> {
    if amount <= 0.0 {
        return Err(ServiceError::Validation(
            "Amount must be positive".to_string(),
        ));
    }
    BigDecimal::try_from(amount)
        .map_err(|_| ServiceError::Validation(format!("Invalid amount: {}", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memorydb::MemoryStore;
    use crate::models::usermodel::UserRole;

    fn service(store: Arc<MemoryStore>) -> JobService<MemoryStore> {
        JobService::new(store)
    }

    #[tokio::test]
    async fn cancelling_an_in_progress_job_clears_the_assignment() {
        let store = Arc::new(MemoryStore::new());
        let client = store.seed_user(UserRole::Client);
        let student = store.seed_user(UserRole::Student);
        let job = store.seed_job(client.id, JobStatus::InProgress, Some(student.id));

        let updated = service(store)
            .update_job_status(job.id, client.id, JobStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(updated.status, JobStatus::Cancelled);
        assert_eq!(updated.assigned_student_id, None);
        assert!(updated.assignment_is_consistent());
    }

    #[tokio::test]
    async fn status_endpoint_refuses_to_start_a_job() {
        let store = Arc::new(MemoryStore::new());
        let client = store.seed_user(UserRole::Client);
        let job = store.seed_job(client.id, JobStatus::Open, None);

        let err = service(store.clone())
            .update_job_status(job.id, client.id, JobStatus::InProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        let unchanged = store.get_job_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, JobStatus::Open);
    }

    #[tokio::test]
    async fn only_the_owning_client_can_change_status() {
        let store = Arc::new(MemoryStore::new());
        let owner = store.seed_user(UserRole::Client);
        let other_client = store.seed_user(UserRole::Client);
        let job = store.seed_job(owner.id, JobStatus::Open, None);

        let err = service(store.clone())
            .update_job_status(job.id, other_client.id, JobStatus::Cancelled)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::UnauthorizedJobAccess(_, _)));
        let unchanged = store.get_job_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, JobStatus::Open);
    }

    #[tokio::test]
    async fn completed_jobs_reject_further_transitions() {
        let store = Arc::new(MemoryStore::new());
        let client = store.seed_user(UserRole::Client);
        let student = store.seed_user(UserRole::Student);
        let job = store.seed_job(client.id, JobStatus::Completed, Some(student.id));

        let err = service(store)
            .update_job_status(job.id, client.id, JobStatus::Cancelled)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidJobTransition { .. }));
    }

    #[test]
    fn to_money_rejects_non_positive_amounts() {
        assert!(to_money(0.0).is_err());
        assert!(to_money(-5.0).is_err());
        assert!(to_money(49.99).is_ok());
    }
}
