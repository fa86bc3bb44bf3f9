// db/memorydb.rs
//
// In-memory store backing the service tests. Implements the same Ext traits
// as DBClient over mutex-guarded vectors; the unit of work is a no-op since
// tests drive one operation at a time.
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use sqlx::Error;
use uuid::Uuid;

use super::db::TxProvider;
use super::jobdb::JobExt;
use super::paymentdb::PaymentExt;
use super::userdb::UserExt;
use crate::models::{jobmodel::*, paymentmodel::*, usermodel::*};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    jobs: Vec<Job>,
    proposals: Vec<Proposal>,
    payments: Vec<Payment>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, role: UserRole) -> User {
        let id = Uuid::new_v4();
        let user = User {
            id,
            name: format!("user-{}", id),
            email: format!("user-{}@example.edu", id),
            password: None,
            role,
            verified: true,
            verification_token: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.inner.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_job(
        &self,
        client_id: Uuid,
        status: JobStatus,
        assigned_student_id: Option<Uuid>,
    ) -> Job {
        let job = Job {
            id: Uuid::new_v4(),
            client_id,
            assigned_student_id,
            category: JobCategory::WebDevelopment,
            title: "Course landing page".to_string(),
            description: "Build a landing page for a study group".to_string(),
            budget: BigDecimal::from(500),
            status,
            deadline: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.inner.lock().unwrap().jobs.push(job.clone());
        job
    }
}

#[async_trait]
impl TxProvider for MemoryStore {
    type Tx = ();

    async fn begin_tx(&self) -> Result<Self::Tx, Error> {
        Ok(())
    }

    async fn commit_tx(&self, _tx: Self::Tx) -> Result<(), Error> {
        Ok(())
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let inner = self.inner.lock().unwrap();
        let user = inner.users.iter().find(|u| {
            if let Some(id) = user_id {
                u.id == id
            } else if let Some(email) = email {
                u.email == email
            } else if let Some(token) = token {
                u.verification_token.as_deref() == Some(token)
            } else {
                false
            }
        });
        Ok(user.cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().any(|u| u.email == email))
    }

    async fn save_user(
        &self,
        name: String,
        email: String,
        password: String,
        role: UserRole,
        verification_token: String,
    ) -> Result<User, Error> {
        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            password: Some(password),
            role,
            verified: false,
            verification_token: Some(verification_token),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.inner.lock().unwrap().users.push(user.clone());
        Ok(user)
    }

    async fn mark_user_verified(&self, token: &str) -> Result<Option<User>, Error> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.verification_token.as_deref() == Some(token));
        Ok(user.map(|u| {
            u.verified = true;
            u.verification_token = None;
            u.clone()
        }))
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        new_password: String,
    ) -> Result<User, Error> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(Error::RowNotFound)?;
        user.password = Some(new_password);
        Ok(user.clone())
    }
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_job(
        &self,
        client_id: Uuid,
        category: JobCategory,
        title: String,
        description: String,
        budget: BigDecimal,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error> {
        let job = Job {
            id: Uuid::new_v4(),
            client_id,
            assigned_student_id: None,
            category,
            title,
            description,
            budget,
            status: JobStatus::Open,
            deadline,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.inner.lock().unwrap().jobs.push(job.clone());
        Ok(job)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.iter().find(|j| j.id == job_id).cloned())
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
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(Error::RowNotFound)?;
        job.title = title;
        job.description = description;
        job.category = category;
        job.budget = budget;
        job.deadline = deadline;
        job.updated_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<Job, Error> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(Error::RowNotFound)?;
        job.status = status;
        if status == JobStatus::Cancelled {
            job.assigned_student_id = None;
        }
        job.updated_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error> {
        self.inner.lock().unwrap().jobs.retain(|j| j.id != job_id);
        Ok(())
    }

    async fn get_open_jobs(&self) -> Result<Vec<Job>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Open)
            .cloned()
            .collect())
    }

    async fn get_jobs_by_category(&self, category: JobCategory) -> Result<Vec<Job>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.category == category)
            .cloned()
            .collect())
    }

    async fn get_client_jobs(&self, client_id: Uuid) -> Result<Vec<Job>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn get_student_jobs(&self, student_id: Uuid) -> Result<Vec<Job>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.assigned_student_id == Some(student_id))
            .cloned()
            .collect())
    }

    async fn search_jobs(
        &self,
        keyword: Option<&str>,
        category: Option<JobCategory>,
    ) -> Result<Vec<Job>, Error> {
        let needle = keyword.map(|k| k.to_lowercase());
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .filter(|j| {
                let keyword_hit = match &needle {
                    Some(n) => {
                        j.title.to_lowercase().contains(n)
                            || j.description.to_lowercase().contains(n)
                    }
                    None => true,
                };
                let category_hit = category.map_or(true, |c| j.category == c);
                keyword_hit && category_hit
            })
            .cloned()
            .collect())
    }

    async fn create_proposal(
        &self,
        job_id: Uuid,
        student_id: Uuid,
        cover_letter: String,
        proposed_amount: BigDecimal,
        estimated_days: i32,
    ) -> Result<Proposal, Error> {
        let proposal = Proposal {
            id: Uuid::new_v4(),
            job_id,
            student_id,
            cover_letter,
            proposed_amount,
            estimated_days,
            status: ProposalStatus::Pending,
            created_at: Some(Utc::now()),
        };
        self.inner.lock().unwrap().proposals.push(proposal.clone());
        Ok(proposal)
    }

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.proposals.iter().find(|p| p.id == proposal_id).cloned())
    }

    async fn has_active_proposal(&self, job_id: Uuid, student_id: Uuid) -> Result<bool, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.proposals.iter().any(|p| {
            p.job_id == job_id && p.student_id == student_id && p.status != ProposalStatus::Rejected
        }))
    }

    async fn job_has_proposals(&self, job_id: Uuid) -> Result<bool, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.proposals.iter().any(|p| p.job_id == job_id))
    }

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .proposals
            .iter()
            .filter(|p| p.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn get_student_proposals(&self, student_id: Uuid) -> Result<Vec<Proposal>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .proposals
            .iter()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn lock_job_tx(&self, _tx: &mut Self::Tx, job_id: Uuid) -> Result<Option<Job>, Error> {
        self.get_job_by_id(job_id).await
    }

    async fn assign_student_tx(
        &self,
        _tx: &mut Self::Tx,
        job_id: Uuid,
        student_id: Uuid,
    ) -> Result<Job, Error> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(Error::RowNotFound)?;
        job.status = JobStatus::InProgress;
        job.assigned_student_id = Some(student_id);
        job.updated_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn reject_other_proposals_tx(
        &self,
        _tx: &mut Self::Tx,
        job_id: Uuid,
        accepted_proposal_id: Uuid,
    ) -> Result<u64, Error> {
        let mut inner = self.inner.lock().unwrap();
        let mut rejected = 0;
        for p in inner.proposals.iter_mut() {
            if p.job_id == job_id
                && p.id != accepted_proposal_id
                && p.status == ProposalStatus::Pending
            {
                p.status = ProposalStatus::Rejected;
                rejected += 1;
            }
        }
        Ok(rejected)
    }

    async fn complete_job_tx(&self, _tx: &mut Self::Tx, job_id: Uuid) -> Result<Job, Error> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(Error::RowNotFound)?;
        job.status = JobStatus::Completed;
        job.updated_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn cancel_job_tx(&self, _tx: &mut Self::Tx, job_id: Uuid) -> Result<Job, Error> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(Error::RowNotFound)?;
        job.status = JobStatus::Cancelled;
        job.assigned_student_id = None;
        job.updated_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn set_proposal_status_tx(
        &self,
        _tx: &mut Self::Tx,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Proposal, Error> {
        let mut inner = self.inner.lock().unwrap();
        let proposal = inner
            .proposals
            .iter_mut()
            .find(|p| p.id == proposal_id)
            .ok_or(Error::RowNotFound)?;
        proposal.status = status;
        Ok(proposal.clone())
    }
}

#[async_trait]
impl PaymentExt for MemoryStore {
    async fn create_payment(
        &self,
        job_id: Uuid,
        amount: BigDecimal,
        method: PaymentMethod,
        status: PaymentStatus,
        escrow_account: String,
    ) -> Result<Payment, Error> {
        let payment = Payment {
            id: Uuid::new_v4(),
            job_id,
            amount,
            payment_method: method,
            status,
            escrow_account,
            created_at: Some(Utc::now()),
            released_at: None,
            cancelled_at: None,
        };
        self.inner.lock().unwrap().payments.push(payment.clone());
        Ok(payment)
    }

    async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.payments.iter().find(|p| p.id == payment_id).cloned())
    }

    async fn get_payment_by_job_id(&self, job_id: Uuid) -> Result<Option<Payment>, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .payments
            .iter()
            .rev()
            .find(|p| p.job_id == job_id)
            .cloned())
    }

    async fn job_has_active_payment(&self, job_id: Uuid) -> Result<bool, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .payments
            .iter()
            .any(|p| p.job_id == job_id && !p.status.is_terminal()))
    }

    async fn job_has_payment(&self, job_id: Uuid) -> Result<bool, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.payments.iter().any(|p| p.job_id == job_id))
    }

    async fn mark_payment_held(&self, payment_id: Uuid) -> Result<Payment, Error> {
        let mut inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or(Error::RowNotFound)?;
        payment.status = PaymentStatus::HeldInEscrow;
        Ok(payment.clone())
    }

    async fn mark_payment_failed(&self, payment_id: Uuid) -> Result<Payment, Error> {
        let mut inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or(Error::RowNotFound)?;
        payment.status = PaymentStatus::Failed;
        payment.cancelled_at = Some(Utc::now());
        Ok(payment.clone())
    }

    async fn lock_payment_tx(
        &self,
        _tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, Error> {
        self.get_payment_by_id(payment_id).await
    }

    async fn set_payment_released_tx(
        &self,
        _tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Payment, Error> {
        let mut inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or(Error::RowNotFound)?;
        payment.status = PaymentStatus::Released;
        payment.released_at = Some(Utc::now());
        Ok(payment.clone())
    }

    async fn set_payment_refunded_tx(
        &self,
        _tx: &mut Self::Tx,
        payment_id: Uuid,
    ) -> Result<Payment, Error> {
        let mut inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or(Error::RowNotFound)?;
        payment.status = PaymentStatus::Refunded;
        payment.cancelled_at = Some(Utc::now());
        Ok(payment.clone())
    }
}
