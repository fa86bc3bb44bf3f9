// service/listing_service.rs
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::jobdb::JobExt,
    models::{jobmodel::Job, usermodel::User},
    service::error::ServiceError,
};

/// Read-side aggregation over the job store. Stateless; composes the
/// per-role projections without touching any lifecycle state.
pub struct ListingService<DB> {
    db_client: Arc<DB>,
}

impl<DB> ListingService<DB>
where
    DB: JobExt,
{
    pub fn new(db_client: Arc<DB>) -> Self {
        Self { db_client }
    }

    pub async fn client_jobs(&self, client_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_client_jobs(client_id).await?)
    }

    pub async fn student_jobs(&self, student_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_student_jobs(student_id).await?)
    }

    /// "My jobs" for any caller: jobs they own as a client plus jobs they are
    /// assigned to as a student, deduplicated, insertion order preserved.
    pub async fn my_jobs(&self, user: &User) -> Result<Vec<Job>, ServiceError> {
        let owned = self.db_client.get_client_jobs(user.id).await?;
        let assigned = self.db_client.get_student_jobs(user.id).await?;

        let mut seen: HashSet<Uuid> = owned.iter().map(|j| j.id).collect();
        let mut jobs = owned;
        for job in assigned {
            if seen.insert(job.id) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memorydb::MemoryStore;
    use crate::models::jobmodel::JobStatus;
    use crate::models::usermodel::UserRole;

    #[tokio::test]
    async fn my_jobs_merges_owned_and_assigned_without_duplicates() {
        let store = Arc::new(MemoryStore::new());
        let user = store.seed_user(UserRole::Client);
        let other = store.seed_user(UserRole::Client);

        let owned = store.seed_job(user.id, JobStatus::Open, None);
        // Owned and assigned to the same user; must appear once.
        let both = store.seed_job(user.id, JobStatus::InProgress, Some(user.id));
        let assigned = store.seed_job(other.id, JobStatus::InProgress, Some(user.id));

        let jobs = ListingService::new(store).my_jobs(&user).await.unwrap();

        let ids: Vec<Uuid> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![owned.id, both.id, assigned.id]);
    }
}
