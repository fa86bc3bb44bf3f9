use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

//Job DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,

    // Tolerant-parsed against the category enum ("Web Development",
    // "web-development" and "WEB_DEVELOPMENT" all work)
    pub category: String,

    #[validate(range(min = 1.0, message = "Budget must be positive"))]
    pub budget: f64,

    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateJobDto {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,

    pub category: String,

    #[validate(range(min = 1.0, message = "Budget must be positive"))]
    pub budget: f64,

    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobStatusDto {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchJobsQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListByCategoryQuery {
    pub category: String,
}

//Proposal DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitProposalDto {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Cover letter must be between 1 and 2000 characters"
    ))]
    pub cover_letter: String,

    #[validate(range(min = 0.01, message = "Proposed amount must be positive"))]
    pub proposed_amount: f64,

    #[validate(range(min = 1, max = 365, message = "Estimated days must be between 1 and 365"))]
    pub estimated_days: i32,
}
