// db/jobdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use sqlx::Error;
use uuid::Uuid;

use super::db::{DBClient, TxProvider};
use crate::models::jobmodel::*;

const JOB_COLUMNS: &str = r#"
    id, client_id, assigned_student_id, category, title, description,
    budget, status, deadline, created_at, updated_at
"#;

const PROPOSAL_COLUMNS: &str = r#"
    id, job_id, student_id, cover_letter, proposed_amount,
    estimated_days, status, created_at
"#;

#[async_trait]
pub trait JobExt: TxProvider {
    // Job management
    async fn create_job(
        &self,
        client_id: Uuid,
        category: JobCategory,
        title: String,
        description: String,
        budget: BigDecimal,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn update_job_fields(
        &self,
        job_id: Uuid,
        title: String,
        description: String,
        category: JobCategory,
        budget: BigDecimal,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error>;

    /// Setting a status of cancelled also clears the assignment, keeping
    /// assigned_student_id non-null only for in-progress and completed jobs.
    async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<Job, Error>;

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error>;

    // Read projections
    async fn get_open_jobs(&self) -> Result<Vec<Job>, Error>;

    async fn get_jobs_by_category(&self, category: JobCategory) -> Result<Vec<Job>, Error>;

    async fn get_client_jobs(&self, client_id: Uuid) -> Result<Vec<Job>, Error>;

    async fn get_student_jobs(&self, student_id: Uuid) -> Result<Vec<Job>, Error>;

    async fn search_jobs(
        &self,
        keyword: Option<&str>,
        category: Option<JobCategory>,
    ) -> Result<Vec<Job>, Error>;

    // Proposals
    async fn create_proposal(
        &self,
        job_id: Uuid,
        student_id: Uuid,
        cover_letter: String,
        proposed_amount: BigDecimal,
        estimated_days: i32,
    ) -> Result<Proposal, Error>;

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error>;

    async fn has_active_proposal(&self, job_id: Uuid, student_id: Uuid) -> Result<bool, Error>;

    async fn job_has_proposals(&self, job_id: Uuid) -> Result<bool, Error>;

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, Error>;

    async fn get_student_proposals(&self, student_id: Uuid) -> Result<Vec<Proposal>, Error>;

    // Transaction-scoped building blocks for the acceptance cascade.
    // The caller owns the transaction; these never commit.
    async fn lock_job_tx(&self, tx: &mut Self::Tx, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn assign_student_tx(
        &self,
        tx: &mut Self::Tx,
        job_id: Uuid,
        student_id: Uuid,
    ) -> Result<Job, Error>;

    async fn reject_other_proposals_tx(
        &self,
        tx: &mut Self::Tx,
        job_id: Uuid,
        accepted_proposal_id: Uuid,
    ) -> Result<u64, Error>;

    async fn complete_job_tx(&self, tx: &mut Self::Tx, job_id: Uuid) -> Result<Job, Error>;

    // Cancellation clears the assignment so assigned_student_id stays
    // non-null only for in-progress and completed jobs.
    async fn cancel_job_tx(&self, tx: &mut Self::Tx, job_id: Uuid) -> Result<Job, Error>;

    async fn set_proposal_status_tx(
        &self,
        tx: &mut Self::Tx,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Proposal, Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(
        &self,
        client_id: Uuid,
        category: JobCategory,
        title: String,
        description: String,
        budget: BigDecimal,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (client_id, category, title, description, budget, deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(client_id)
        .bind(category)
        .bind(title)
        .bind(description)
        .bind(budget)
        .bind(deadline)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_job_fields(
        &self,
        job_id: Uuid,
        title: String,
        description: String,
        category: JobCategory,
        budget: BigDecimal,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title = $2, description = $3, category = $4, budget = $5,
                deadline = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(budget)
        .bind(deadline)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = $2,
                assigned_student_id = CASE
                    WHEN $2 = 'cancelled' THEN NULL
                    ELSE assigned_student_id
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_open_jobs(&self) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'open' ORDER BY created_at"#
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_jobs_by_category(&self, category: JobCategory) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE category = $1 ORDER BY created_at"#
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_client_jobs(&self, client_id: Uuid) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE client_id = $1 ORDER BY created_at"#
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_student_jobs(&self, student_id: Uuid) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE assigned_student_id = $1 ORDER BY created_at"#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn search_jobs(
        &self,
        keyword: Option<&str>,
        category: Option<JobCategory>,
    ) -> Result<Vec<Job>, Error> {
        // Case-insensitive substring match over title + description.
        let pattern = keyword.map(|k| format!("%{}%", k));
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE ($1::TEXT IS NULL OR title ILIKE $1 OR description ILIKE $1)
              AND ($2::job_category IS NULL OR category = $2)
            ORDER BY created_at
            "#
        ))
        .bind(pattern)
        .bind(category)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_proposal(
        &self,
        job_id: Uuid,
        student_id: Uuid,
        cover_letter: String,
        proposed_amount: BigDecimal,
        estimated_days: i32,
    ) -> Result<Proposal, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            INSERT INTO proposals (job_id, student_id, cover_letter, proposed_amount, estimated_days)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(student_id)
        .bind(cover_letter)
        .bind(proposed_amount)
        .bind(estimated_days)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1"#
        ))
        .bind(proposal_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn has_active_proposal(&self, job_id: Uuid, student_id: Uuid) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM proposals
                WHERE job_id = $1 AND student_id = $2 AND status != 'rejected'
            )
            "#,
        )
        .bind(job_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn job_has_proposals(&self, job_id: Uuid) -> Result<bool, Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM proposals WHERE job_id = $1)")
                .bind(job_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE job_id = $1 ORDER BY created_at"#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_student_proposals(&self, student_id: Uuid) -> Result<Vec<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE student_id = $1 ORDER BY created_at"#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn lock_job_tx(&self, tx: &mut Self::Tx, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE"#
        ))
        .bind(job_id)
        .fetch_optional(&mut **tx)
        .await
    }

    async fn assign_student_tx(
        &self,
        tx: &mut Self::Tx,
        job_id: Uuid,
        student_id: Uuid,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'in_progress', assigned_student_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(student_id)
        .fetch_one(&mut **tx)
        .await
    }

    async fn reject_other_proposals_tx(
        &self,
        tx: &mut Self::Tx,
        job_id: Uuid,
        accepted_proposal_id: Uuid,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE proposals
            SET status = 'rejected'
            WHERE job_id = $1 AND id != $2 AND status = 'pending'
            "#,
        )
        .bind(job_id)
        .bind(accepted_proposal_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn complete_job_tx(&self, tx: &mut Self::Tx, job_id: Uuid) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_one(&mut **tx)
        .await
    }

    async fn cancel_job_tx(&self, tx: &mut Self::Tx, job_id: Uuid) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'cancelled', assigned_student_id = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_one(&mut **tx)
        .await
    }

    async fn set_proposal_status_tx(
        &self,
        tx: &mut Self::Tx,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Proposal, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            UPDATE proposals
            SET status = $2
            WHERE id = $1
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(proposal_id)
        .bind(status)
        .fetch_one(&mut **tx)
        .await
    }
}
