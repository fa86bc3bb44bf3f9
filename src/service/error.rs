use thiserror::Error;
use uuid::Uuid;
use axum::http::StatusCode;

use crate::{
    error::HttpError,
    models::{jobmodel::JobStatus, paymentmodel::PaymentStatus},
};

/// Business-level failure taxonomy. Every reachable failure in the job,
/// proposal and payment services maps onto one of these; handlers convert
/// them to HTTP responses through the `HttpError` impl below.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Proposal {0} not found")]
    ProposalNotFound(Uuid),

    #[error("Payment {0} not found")]
    PaymentNotFound(Uuid),

    #[error("No payment found for job {0}")]
    NoPaymentForJob(Uuid),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Student {student_id} has already submitted a proposal for job {job_id}")]
    DuplicateProposal { job_id: Uuid, student_id: Uuid },

    #[error("Job {0} already has an active escrow payment")]
    EscrowAlreadyExists(Uuid),

    #[error("Job {0} cannot be modified: {1}")]
    JobLocked(Uuid, String),

    #[error("Job {job_id} is {status:?}, expected {expected:?}")]
    InvalidJobState {
        job_id: Uuid,
        status: JobStatus,
        expected: JobStatus,
    },

    #[error("Job {job_id}: transition {from:?} -> {to:?} is not allowed")]
    InvalidJobTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Payment {payment_id} is {status:?}, expected held_in_escrow")]
    PaymentNotInEscrow {
        payment_id: Uuid,
        status: PaymentStatus,
    },

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::ProposalNotFound(_)
            | ServiceError::PaymentNotFound(_)
            | ServiceError::NoPaymentForJob(_)
            | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::DuplicateProposal { .. }
            | ServiceError::EscrowAlreadyExists(_)
            | ServiceError::JobLocked(_, _) => StatusCode::CONFLICT,

            ServiceError::InvalidJobState { .. }
            | ServiceError::InvalidJobTransition { .. }
            | ServiceError::PaymentNotInEscrow { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            ServiceError::UnauthorizedJobAccess(_, _) => StatusCode::FORBIDDEN,

            ServiceError::Gateway(_) | ServiceError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        // Internal failures keep their detail in the log, not the response.
        let message = match &error {
            ServiceError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            ServiceError::Gateway(e) => {
                tracing::error!("Payment gateway error: {}", e);
                "Payment gateway unavailable".to_string()
            }
            other => other.to_string(),
        };
        HttpError::new(message, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        let job_id = Uuid::new_v4();

        assert_eq!(
            ServiceError::JobNotFound(job_id).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::DuplicateProposal {
                job_id,
                student_id: Uuid::new_v4()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::PaymentNotInEscrow {
                payment_id: Uuid::new_v4(),
                status: PaymentStatus::Released
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::UnauthorizedJobAccess(Uuid::new_v4(), job_id).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn missing_payment_names_the_job() {
        let job_id = Uuid::new_v4();
        let err = ServiceError::NoPaymentForJob(job_id);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), format!("No payment found for job {}", job_id));
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let http: HttpError = ServiceError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(http.message, "Internal server error");
    }
}
