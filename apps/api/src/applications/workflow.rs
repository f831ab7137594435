//! Admin-side recruiting workflow: shortlisting, invitations, decisions.
//!
//! Status changes are committed before any email goes out. A failed email
//! surfaces as `AppError::Notification` and the status change stands.

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::applications::models::ApplicationStatus;
use crate::applications::store::ApplicationStore;
use crate::errors::AppError;
use crate::interview::ai::InterviewAi;
use crate::notify::Notifier;
use crate::reports::ReportStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistSummary {
    pub processed: usize,
    pub shortlisted: usize,
    pub failed: usize,
}

/// Runs AI fit assessment over every `Applied` application of a job.
/// A failed assessment leaves that application `Applied` for a later run.
pub async fn shortlist_job(
    store: &dyn ApplicationStore,
    ai: &dyn InterviewAi,
    job_id: i32,
) -> Result<ShortlistSummary, AppError> {
    let job = store
        .find_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let pending = store
        .list_applications_by_status(job_id, ApplicationStatus::Applied)
        .await?;

    let mut summary = ShortlistSummary {
        processed: pending.len(),
        shortlisted: 0,
        failed: 0,
    };

    for application in &pending {
        match ai
            .assess_fit(&job.description, &application.resume_text)
            .await
        {
            Ok(decision) if decision.shortlisted => {
                store
                    .record_shortlist(application.application_id, &decision.reason)
                    .await?;
                summary.shortlisted += 1;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    "Fit assessment failed for application {}: {e}",
                    application.application_id
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        "Shortlisting for job {job_id}: {} processed, {} shortlisted, {} failed",
        summary.processed, summary.shortlisted, summary.failed
    );
    Ok(summary)
}

pub fn interview_link(public_base_url: &str, application_id: i32) -> String {
    format!(
        "{}/interview/{application_id}",
        public_base_url.trim_end_matches('/')
    )
}

/// Marks the application `Invited` and emails the candidate their interview link.
pub async fn send_invite(
    store: &dyn ApplicationStore,
    notifier: &dyn Notifier,
    public_base_url: &str,
    application_id: i32,
) -> Result<(), AppError> {
    let contact = store
        .find_applicant_contact(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    store
        .set_application_status(application_id, ApplicationStatus::Invited)
        .await?;

    let subject = format!("Interview Invitation for the {} role", contact.job_title);
    let body = format!(
        "Dear Candidate,\n\n\
         Congratulations! Your application for the {title} position has been shortlisted.\n\
         Please use the following link to complete your AI-proctored virtual interview:\n\
         {link}\n\n\
         Best of luck!\n\
         The {company} Hiring Team",
        title = contact.job_title,
        link = interview_link(public_base_url, application_id),
        company = contact.company_name,
    );

    notify(notifier, ApplicationStatus::Invited, &contact.email, &subject, &body).await
}

/// Records an admin decision. Only `Accepted` and `Rejected` are allowed here;
/// accepted candidates are emailed.
pub async fn update_decision(
    store: &dyn ApplicationStore,
    notifier: &dyn Notifier,
    application_id: i32,
    status: &str,
) -> Result<ApplicationStatus, AppError> {
    let status = match ApplicationStatus::parse(status) {
        Some(s @ (ApplicationStatus::Accepted | ApplicationStatus::Rejected)) => s,
        _ => {
            return Err(AppError::Validation(format!(
                "status must be Accepted or Rejected, got '{status}'"
            )))
        }
    };

    let contact = store
        .find_applicant_contact(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    store.set_application_status(application_id, status).await?;

    if status == ApplicationStatus::Accepted {
        let body = format!(
            "Congratulations! We would like to invite you to our office for the next round \
             of interviews for the {} role.",
            contact.job_title
        );
        notify(
            notifier,
            status,
            &contact.email,
            "Update on your application",
            &body,
        )
        .await?;
    }
    Ok(status)
}

async fn notify(
    notifier: &dyn Notifier,
    status: ApplicationStatus,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), AppError> {
    notifier
        .send_email(to, subject, body)
        .await
        .map_err(|e| AppError::Notification {
            status: status.to_string(),
            message: e.to_string(),
        })
}

/// Loads the stored report document for an application.
pub async fn load_report(
    store: &dyn ApplicationStore,
    reports: &dyn ReportStore,
    application_id: i32,
) -> Result<Bytes, AppError> {
    let not_found = || AppError::NotFound(format!("No report for application {application_id}"));

    let path = store
        .find_report_path(application_id)
        .await?
        .ok_or_else(not_found)?;

    reports
        .fetch(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
        .ok_or_else(not_found)
}
