//! Axum route handlers for the admin recruiting workflow.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::applications::workflow::{
    load_report, send_invite, shortlist_job, update_decision, ShortlistSummary,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ShortlistResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: ShortlistSummary,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// POST /api/v1/jobs/:job_id/shortlist
pub async fn handle_shortlist(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
) -> Result<Json<ShortlistResponse>, AppError> {
    let summary = shortlist_job(state.applications.as_ref(), state.ai.as_ref(), job_id).await?;
    let message = if summary.processed == 0 {
        "No new applications to shortlist.".to_string()
    } else {
        format!(
            "Shortlisting complete for {} applications.",
            summary.processed
        )
    };
    Ok(Json(ShortlistResponse { message, summary }))
}

/// POST /api/v1/applications/:id/invite
pub async fn handle_send_invite(
    State(state): State<AppState>,
    Path(application_id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    send_invite(
        state.applications.as_ref(),
        state.notifier.as_ref(),
        &state.config.public_base_url,
        application_id,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Interview invitation sent.".to_string(),
    }))
}

/// POST /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(application_id): Path<i32>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let status = update_decision(
        state.applications.as_ref(),
        state.notifier.as_ref(),
        application_id,
        &req.status,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: format!("Candidate status updated to {status}."),
    }))
}

/// GET /api/v1/applications/:id/report
pub async fn handle_download_report(
    State(state): State<AppState>,
    Path(application_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let document = load_report(
        state.applications.as_ref(),
        state.reports.as_ref(),
        application_id,
    )
    .await?;
    let disposition = format!("attachment; filename=report_application_{application_id}.md");
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    ))
}
