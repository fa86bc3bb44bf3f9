use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::types::BigDecimal;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_category", rename_all = "snake_case")]
pub enum JobCategory {
    WebDevelopment,
    GraphicDesign,
    Writing,
    Marketing,
    MobileDevelopment,
    DataScience,
    Other,
}

impl JobCategory {
    pub fn to_str(&self) -> &str {
        match self {
            JobCategory::WebDevelopment => "web_development",
            JobCategory::GraphicDesign => "graphic_design",
            JobCategory::Writing => "writing",
            JobCategory::Marketing => "marketing",
            JobCategory::MobileDevelopment => "mobile_development",
            JobCategory::DataScience => "data_science",
            JobCategory::Other => "other",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            JobCategory::WebDevelopment => "Web Development",
            JobCategory::GraphicDesign => "Graphic Design",
            JobCategory::Writing => "Writing",
            JobCategory::Marketing => "Marketing",
            JobCategory::MobileDevelopment => "Mobile Development",
            JobCategory::DataScience => "Data Science",
            JobCategory::Other => "Other",
        }
    }

    pub fn all() -> &'static [JobCategory] {
        &[
            JobCategory::WebDevelopment,
            JobCategory::GraphicDesign,
            JobCategory::Writing,
            JobCategory::Marketing,
            JobCategory::MobileDevelopment,
            JobCategory::DataScience,
            JobCategory::Other,
        ]
    }

    /// Tolerant parse: case-insensitive, whitespace/dash runs become a single
    /// underscore, accepts both canonical names and display names.
    /// Unknown input is an error, never a silent default.
    pub fn parse(s: &str) -> Result<JobCategory, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Job category must be provided".to_string());
        }

        let normalized = normalize_enum_input(trimmed);
        for category in JobCategory::all() {
            if category.to_str() == normalized {
                return Ok(*category);
            }
        }

        Err(format!(
            "Unknown job category: '{}'. Supported values: {}",
            s,
            JobCategory::supported()
        ))
    }

    pub fn supported() -> String {
        JobCategory::all()
            .iter()
            .map(|c| c.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// The only legal transitions. Self-transitions and backward
    /// transitions are rejected.
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Open, JobStatus::InProgress)
                | (JobStatus::Open, JobStatus::Cancelled)
                | (JobStatus::InProgress, JobStatus::Completed)
                | (JobStatus::InProgress, JobStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    pub fn parse(s: &str) -> Result<JobStatus, String> {
        match normalize_enum_input(s).as_str() {
            "open" => Ok(JobStatus::Open),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(format!(
                "Unknown job status: '{}'. Supported values: OPEN, IN_PROGRESS, COMPLETED, CANCELLED",
                s
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "proposal_status", rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub client_id: Uuid,
    pub assigned_student_id: Option<Uuid>,
    pub category: JobCategory,
    pub title: String,
    pub description: String,
    pub budget: BigDecimal,
    pub status: JobStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW(), can be NULL
    pub updated_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW(), can be NULL
}

impl Job {
    /// assigned_student_id must be set iff the job is in progress or completed.
    pub fn assignment_is_consistent(&self) -> bool {
        match self.status {
            JobStatus::InProgress | JobStatus::Completed => self.assigned_student_id.is_some(),
            JobStatus::Open | JobStatus::Cancelled => self.assigned_student_id.is_none(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub job_id: Uuid,
    pub student_id: Uuid,
    pub cover_letter: String,
    pub proposed_amount: BigDecimal,
    pub estimated_days: i32,
    pub status: ProposalStatus,
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW(), can be NULL
}

/// Shared normalization for tolerant enum parsing: trim, lowercase,
/// collapse whitespace/dash runs into single underscores.
pub fn normalize_enum_input(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_sep = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !last_was_sep && !out.is_empty() {
                out.push('_');
            }
            last_was_sep = true;
        } else {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        }
    }
    // Drop a trailing separator left by input like "writing-"
    if out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_display_form() {
        assert_eq!(
            JobCategory::parse("Web Development").unwrap(),
            JobCategory::WebDevelopment
        );
        assert_eq!(
            JobCategory::parse("  web-development ").unwrap(),
            JobCategory::WebDevelopment
        );
        assert_eq!(
            JobCategory::parse("DATA_SCIENCE").unwrap(),
            JobCategory::DataScience
        );
    }

    #[test]
    fn category_rejects_unknown() {
        let err = JobCategory::parse("basket weaving").unwrap_err();
        assert!(err.contains("Unknown job category"));
        assert!(err.contains("Web Development"));

        assert!(JobCategory::parse("").is_err());
        assert!(JobCategory::parse("   ").is_err());
    }

    #[test]
    fn job_status_allows_only_forward_transitions() {
        assert!(JobStatus::Open.can_transition_to(JobStatus::InProgress));
        assert!(JobStatus::Open.can_transition_to(JobStatus::Cancelled));
        assert!(JobStatus::InProgress.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::InProgress.can_transition_to(JobStatus::Cancelled));

        // Self-transitions
        assert!(!JobStatus::Open.can_transition_to(JobStatus::Open));
        assert!(!JobStatus::InProgress.can_transition_to(JobStatus::InProgress));

        // Backward / skipping transitions
        assert!(!JobStatus::Open.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::InProgress.can_transition_to(JobStatus::Open));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::InProgress));
        assert!(!JobStatus::Cancelled.can_transition_to(JobStatus::Open));
    }

    #[test]
    fn assignment_consistency_invariant() {
        let mut job = Job {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            assigned_student_id: None,
            category: JobCategory::Writing,
            title: "t".to_string(),
            description: "d".to_string(),
            budget: BigDecimal::from(500),
            status: JobStatus::Open,
            deadline: None,
            created_at: None,
            updated_at: None,
        };
        assert!(job.assignment_is_consistent());

        job.status = JobStatus::InProgress;
        assert!(!job.assignment_is_consistent());

        job.assigned_student_id = Some(Uuid::new_v4());
        assert!(job.assignment_is_consistent());

        job.status = JobStatus::Completed;
        assert!(job.assignment_is_consistent());
    }
}
