use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of an application, stored as the variant name in `applications.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Invited,
    Terminated,
    Completed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Invited => "Invited",
            ApplicationStatus::Terminated => "Terminated",
            ApplicationStatus::Completed => "Completed",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "Applied" => ApplicationStatus::Applied,
            "Shortlisted" => ApplicationStatus::Shortlisted,
            "Invited" => ApplicationStatus::Invited,
            "Terminated" => ApplicationStatus::Terminated,
            "Completed" => ApplicationStatus::Completed,
            "Accepted" => ApplicationStatus::Accepted,
            "Rejected" => ApplicationStatus::Rejected,
            _ => return None,
        })
    }

    /// An interview can no longer be started once the application reaches one of these.
    pub fn closes_interview(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Terminated | ApplicationStatus::Completed
        )
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the interview needs to know about an application.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationContextRow {
    pub application_id: i32,
    pub job_description: String,
    pub resume_text: String,
    pub status: String,
}

impl ApplicationContextRow {
    pub fn status(&self) -> Option<ApplicationStatus> {
        ApplicationStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobRow {
    pub id: i32,
    pub admin_id: i32,
    pub title: String,
    pub description: String,
}

/// Final state of an interview as written back to its application.
/// Status, results and report path are stored together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewOutcome {
    pub status: ApplicationStatus,
    pub results: serde_json::Value,
    pub report_path: Option<String>,
}

/// Candidate contact details joined with the job they applied to.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantContactRow {
    pub email: String,
    pub job_title: String,
    pub company_name: String,
}
