//! Axum route handlers for the interview session API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::ai::AnswerScore;
use crate::interview::controller::{StartedInterview, TranscriptEntry};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub application_id: i32,
}

#[derive(Debug, Serialize)]
pub struct TabSwitchResponse {
    pub message: &'static str,
    pub count: u32,
    pub terminated: bool,
}

// Missing fields deserialize as empty so the controller reports them as validation errors.
#[derive(Debug, Deserialize)]
pub struct ScoreAnswerRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub interview_results: Vec<TranscriptEntry>,
    #[serde(default)]
    pub proctoring_flags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub message: &'static str,
    pub report_path: String,
}

#[derive(Debug, Deserialize)]
pub struct CasualQuestionRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct CasualQuestionResponse {
    pub casual_question: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Result<Json<StartedInterview>, AppError> {
    Ok(Json(state.interviews.start(req.application_id).await?))
}

/// POST /api/v1/interviews/:session_id/tab-switch
pub async fn handle_tab_switch(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<TabSwitchResponse>, AppError> {
    let report = state.interviews.record_tab_switch(session_id).await?;
    let message = if report.terminated {
        "Candidate terminated due to repeated tab switching."
    } else if report.ignored {
        "Ignored rapid event."
    } else {
        "Tab switch recorded."
    };
    Ok(Json(TabSwitchResponse {
        message,
        count: report.count,
        terminated: report.terminated,
    }))
}

/// POST /api/v1/interviews/:session_id/answers
pub async fn handle_score_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ScoreAnswerRequest>,
) -> Result<Json<AnswerScore>, AppError> {
    let score = state
        .interviews
        .score_answer(session_id, &req.question, &req.answer)
        .await?;
    Ok(Json(score))
}

/// POST /api/v1/interviews/:session_id/finalize
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<FinalizeResponse>, AppError> {
    let done = state
        .interviews
        .finalize(session_id, req.interview_results, req.proctoring_flags)
        .await?;
    Ok(Json(FinalizeResponse {
        message: "Interview submitted successfully.",
        report_path: done.report_path,
    }))
}

/// POST /api/v1/interviews/casual-question
pub async fn handle_make_casual(
    State(state): State<AppState>,
    Json(req): Json<CasualQuestionRequest>,
) -> Result<Json<CasualQuestionResponse>, AppError> {
    let casual_question = state.interviews.make_casual(&req.question).await?;
    Ok(Json(CasualQuestionResponse { casual_question }))
}
