//! Application/Job store: the slice of the recruiting database the interview
//! workflow reads and writes. Creation and deletion of records belong to the
//! CRUD side of the product and are not exposed here.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::applications::models::{
    ApplicantContactRow, ApplicationContextRow, ApplicationStatus, InterviewOutcome, JobRow,
};
use crate::errors::AppError;

/// Carried in `AppState` as `Arc<dyn ApplicationStore>`.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn find_application_context(
        &self,
        application_id: i32,
    ) -> Result<Option<ApplicationContextRow>, AppError>;

    async fn set_application_status(
        &self,
        application_id: i32,
        status: ApplicationStatus,
    ) -> Result<(), AppError>;

    /// Writes the interview's terminal status, results and report path in one
    /// statement. `report_path` is left untouched when the outcome has none.
    async fn close_interview(
        &self,
        application_id: i32,
        outcome: &InterviewOutcome,
    ) -> Result<(), AppError>;

    async fn find_job(&self, job_id: i32) -> Result<Option<JobRow>, AppError>;

    async fn list_applications_by_status(
        &self,
        job_id: i32,
        status: ApplicationStatus,
    ) -> Result<Vec<ApplicationContextRow>, AppError>;

    async fn record_shortlist(&self, application_id: i32, reason: &str) -> Result<(), AppError>;

    async fn find_applicant_contact(
        &self,
        application_id: i32,
    ) -> Result<Option<ApplicantContactRow>, AppError>;

    async fn find_report_path(&self, application_id: i32) -> Result<Option<String>, AppError>;
}

pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn find_application_context(
        &self,
        application_id: i32,
    ) -> Result<Option<ApplicationContextRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicationContextRow>(
            r#"
            SELECT a.id AS application_id, j.description AS job_description,
                   a.resume_text, a.status
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.id = $1
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_application_status(
        &self,
        application_id: i32,
        status: ApplicationStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE applications SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(application_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Application {application_id} not found"
            )));
        }
        debug!("Application {application_id} status -> {status}");
        Ok(())
    }

    async fn close_interview(
        &self,
        application_id: i32,
        outcome: &InterviewOutcome,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = $1,
                interview_results = $2,
                report_path = COALESCE($3, report_path)
            WHERE id = $4
            "#,
        )
        .bind(outcome.status.as_str())
        .bind(outcome.results.to_string())
        .bind(outcome.report_path.as_deref())
        .bind(application_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Application {application_id} not found"
            )));
        }
        debug!("Application {application_id} interview closed as {}", outcome.status);
        Ok(())
    }

    async fn find_job(&self, job_id: i32) -> Result<Option<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            "SELECT id, admin_id, title, description FROM jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_applications_by_status(
        &self,
        job_id: i32,
        status: ApplicationStatus,
    ) -> Result<Vec<ApplicationContextRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicationContextRow>(
            r#"
            SELECT a.id AS application_id, j.description AS job_description,
                   a.resume_text, a.status
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.job_id = $1 AND a.status = $2
            ORDER BY a.id
            "#,
        )
        .bind(job_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn record_shortlist(&self, application_id: i32, reason: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE applications SET status = $1, shortlist_reason = $2 WHERE id = $3")
            .bind(ApplicationStatus::Shortlisted.as_str())
            .bind(reason)
            .bind(application_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_applicant_contact(
        &self,
        application_id: i32,
    ) -> Result<Option<ApplicantContactRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicantContactRow>(
            r#"
            SELECT c.email, j.title AS job_title, ad.company_name
            FROM applications a
            JOIN candidates c ON c.id = a.candidate_id
            JOIN jobs j ON j.id = a.job_id
            JOIN admins ad ON ad.id = j.admin_id
            WHERE a.id = $1
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_report_path(&self, application_id: i32) -> Result<Option<String>, AppError> {
        let path: Option<Option<String>> =
            sqlx::query_scalar("SELECT report_path FROM applications WHERE id = $1")
                .bind(application_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(path.flatten())
    }
}
