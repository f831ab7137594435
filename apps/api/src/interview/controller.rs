//! Interview Session Controller.
//!
//! Flow: start → (score_answer | record_tab_switch)* → finalize.
//! A session ends exactly once: by the tab-switch policy or by finalize.
//!
//! Session state is touched only inside `SessionStore::with_active`. AI and
//! report calls happen between two critical sections, and the second one
//! re-checks that the session is still active before applying anything.
//!
//! A closed session is released only after its outcome is written to the
//! application store. Until then it rejects events, blocks a new start for
//! its application, and any later call on it retries the write.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::models::{ApplicationStatus, InterviewOutcome};
use crate::applications::store::ApplicationStore;
use crate::errors::AppError;
use crate::interview::ai::{AnswerScore, InterviewAi, QuestionSet};
use crate::interview::session::{ProctorPolicy, TabSwitchOutcome, DEFAULT_SESSION_MAX_AGE_SECS};
use crate::interview::session_store::{ClosingSession, SessionStore};
use crate::reports::ReportStore;

pub const FALLBACK_QUESTIONS: [&str; QUESTION_COUNT] = [
    "Could you please tell me about your experience?",
    "What is your biggest strength?",
    "What is your biggest weakness?",
    "Why are you interested in this role?",
    "Where do you see yourself in 5 years?",
];

pub const QUESTION_COUNT: usize = 5;
pub const MAX_SCORE: u8 = 10;

/// One answered question as submitted by the interview client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub question: String,
    pub answer: String,
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub session_id: Uuid,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSwitchReport {
    pub count: u32,
    pub terminated: bool,
    pub ignored: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizedInterview {
    pub application_id: i32,
    pub report_path: String,
}

pub struct InterviewController {
    sessions: SessionStore,
    applications: Arc<dyn ApplicationStore>,
    ai: Arc<dyn InterviewAi>,
    reports: Arc<dyn ReportStore>,
    policy: ProctorPolicy,
    call_timeout: Duration,
    max_session_age: chrono::Duration,
}

impl InterviewController {
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        ai: Arc<dyn InterviewAi>,
        reports: Arc<dyn ReportStore>,
        policy: ProctorPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            applications,
            ai,
            reports,
            policy,
            call_timeout,
            max_session_age: chrono::Duration::seconds(DEFAULT_SESSION_MAX_AGE_SECS),
        }
    }

    /// Sessions started longer ago than this are dropped by `sweep_sessions`.
    pub fn with_max_session_age(mut self, max_age: chrono::Duration) -> Self {
        self.max_session_age = max_age;
        self
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.active_count()
    }

    /// Opens a session for `application_id` and returns its opening questions.
    /// Question generation never fails the start; it falls back to a fixed set.
    pub async fn start(&self, application_id: i32) -> Result<StartedInterview, AppError> {
        // an earlier session may have closed without its outcome being stored
        for (id, closing) in self.sessions.closing_sessions(Some(application_id)) {
            self.persist_outcome(id, &closing).await?;
        }

        let context = self
            .applications
            .find_application_context(application_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

        if context.status().is_some_and(|s| s.closes_interview()) {
            return Err(AppError::Conflict(format!(
                "Interview for application {application_id} has already ended ({})",
                context.status
            )));
        }

        let session_id =
            self.sessions
                .create(application_id, context.job_description.clone(), Utc::now())?;
        info!("Interview session {session_id} started for application {application_id}");

        let generated = self
            .bounded(
                "question generation",
                self.ai
                    .generate_questions(&context.job_description, &context.resume_text),
            )
            .await;

        let questions = match generated {
            Ok(set) if is_usable(&set) => set.questions,
            Ok(set) => {
                warn!(
                    "AI returned {} questions, expected {QUESTION_COUNT} non-blank; using fallback questions",
                    set.questions.len()
                );
                fallback_questions()
            }
            Err(e) => {
                warn!("Question generation failed ({e}); using fallback questions");
                fallback_questions()
            }
        };

        Ok(StartedInterview {
            session_id,
            questions,
        })
    }

    pub async fn record_tab_switch(&self, session_id: Uuid) -> Result<TabSwitchReport, AppError> {
        self.record_tab_switch_at(session_id, Utc::now()).await
    }

    pub async fn record_tab_switch_at(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TabSwitchReport, AppError> {
        if let Some(closing) = self.sessions.closing(session_id) {
            self.persist_outcome(session_id, &closing).await?;
            return match closing.outcome.status {
                ApplicationStatus::Terminated => Ok(TabSwitchReport {
                    count: closing.tab_switch_count,
                    terminated: true,
                    ignored: false,
                }),
                _ => Err(AppError::NoActiveSession),
            };
        }

        let (application_id, outcome) = self.sessions.with_active(session_id, |session| {
            let outcome = session.record_tab_switch(now, &self.policy)?;
            Ok((session.application_id, outcome))
        })?;

        info!(
            "PROCTOR_EVENT application_id={application_id} session={session_id} at={} outcome={outcome:?}",
            now.to_rfc3339()
        );

        match outcome {
            TabSwitchOutcome::Ignored { count } => Ok(TabSwitchReport {
                count,
                terminated: false,
                ignored: true,
            }),
            TabSwitchOutcome::Recorded { count } => Ok(TabSwitchReport {
                count,
                terminated: false,
                ignored: false,
            }),
            TabSwitchOutcome::Terminated { count, outcome } => {
                warn!("Application {application_id} terminated after {count} tab switches");
                let closing = ClosingSession {
                    application_id,
                    tab_switch_count: count,
                    outcome,
                };
                self.persist_outcome(session_id, &closing).await?;
                Ok(TabSwitchReport {
                    count,
                    terminated: true,
                    ignored: false,
                })
            }
        }
    }

    /// Scores one answer. Any unusable AI reply is a hard failure.
    pub async fn score_answer(
        &self,
        session_id: Uuid,
        question: &str,
        answer: &str,
    ) -> Result<AnswerScore, AppError> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(AppError::Validation(
                "Both question and answer are required".to_string(),
            ));
        }
        self.sessions.with_active(session_id, |_| Ok(()))?;

        let score = self
            .bounded("answer scoring", self.ai.score_answer(question, answer))
            .await
            .map_err(|e| AppError::Ai(format!("Failed to score answer: {e}")))?;

        if score.score > MAX_SCORE {
            return Err(AppError::Ai(format!(
                "Score {} is outside 0..={MAX_SCORE}",
                score.score
            )));
        }

        // the session may have been terminated while the AI call was in flight
        self.sessions.with_active(session_id, |_| Ok(()))?;
        Ok(score)
    }

    /// Produces the scorecard report, marks the application `Completed`, and
    /// closes the session. Nothing is written to the application unless the
    /// session is still active once the report exists.
    pub async fn finalize(
        &self,
        session_id: Uuid,
        transcript: Vec<TranscriptEntry>,
        client_flags: Vec<String>,
    ) -> Result<FinalizedInterview, AppError> {
        if let Some(closing) = self.sessions.closing(session_id) {
            self.persist_outcome(session_id, &closing).await?;
            return match closing.outcome {
                InterviewOutcome {
                    status: ApplicationStatus::Completed,
                    report_path: Some(report_path),
                    ..
                } => Ok(FinalizedInterview {
                    application_id: closing.application_id,
                    report_path,
                }),
                _ => Err(AppError::NoActiveSession),
            };
        }

        let (application_id, job_requirements, server_flags) =
            self.sessions.with_active(session_id, |session| {
                Ok((
                    session.application_id,
                    session.job_requirements.clone(),
                    session.proctoring_flags.clone(),
                ))
            })?;

        if transcript.is_empty() {
            return Err(AppError::Validation(
                "interview_results cannot be empty".to_string(),
            ));
        }

        let summary = format_transcript(&transcript);
        let scorecard = self
            .bounded(
                "scorecard generation",
                self.ai.generate_scorecard(&job_requirements, &summary),
            )
            .await
            .map_err(|e| AppError::Ai(format!("Failed to generate scorecard: {e}")))?;

        let report_flags = merge_flags(&server_flags, &client_flags);
        let report_path = self
            .bounded(
                "report persistence",
                self.reports
                    .render_and_persist(&scorecard, &report_flags, application_id),
            )
            .await
            .map_err(AppError::ReportGeneration)?;

        let closing = self
            .sessions
            .with_active(session_id, |session| {
                let outcome = InterviewOutcome {
                    status: ApplicationStatus::Completed,
                    results: json!({
                        "interview_results": transcript,
                        "proctoring_flags": merge_flags(&session.proctoring_flags, &client_flags),
                    }),
                    report_path: Some(report_path.clone()),
                };
                session.close(outcome.clone());
                Ok(ClosingSession {
                    application_id,
                    tab_switch_count: session.tab_switch_count,
                    outcome,
                })
            })
            .map_err(|e| {
                warn!(
                    "Session {session_id} ended during finalization; report {report_path} left unreferenced"
                );
                e
            })?;

        self.persist_outcome(session_id, &closing).await?;

        info!("Interview for application {application_id} completed; report at {report_path}");
        Ok(FinalizedInterview {
            application_id,
            report_path,
        })
    }

    /// Rephrases a question conversationally, or returns it unchanged.
    pub async fn make_casual(&self, question: &str) -> Result<String, AppError> {
        if question.trim().is_empty() {
            return Err(AppError::Validation("question cannot be empty".to_string()));
        }
        match self
            .bounded("casual rephrasing", self.ai.make_casual(question))
            .await
        {
            Ok(casual) if !casual.casual_question.trim().is_empty() => Ok(casual.casual_question),
            Ok(_) => Ok(question.to_string()),
            Err(e) => {
                warn!("Casual rephrasing failed ({e}); keeping original wording");
                Ok(question.to_string())
            }
        }
    }

    /// Retries outcome writes that failed earlier, then drops sessions older
    /// than the age limit. Returns how many were dropped.
    pub async fn sweep_sessions(&self, now: DateTime<Utc>) -> usize {
        for (id, closing) in self.sessions.closing_sessions(None) {
            if let Err(e) = self.persist_outcome(id, &closing).await {
                warn!("Retry of session {id} outcome failed: {e}");
            }
        }
        let evicted = self.sessions.evict_stale(now, self.max_session_age);
        if evicted > 0 {
            info!("Evicted {evicted} abandoned interview sessions");
        }
        evicted
    }

    /// Runs `sweep_sessions` every `period` in the background.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                controller.sweep_sessions(Utc::now()).await;
            }
        })
    }

    /// Writes a closed session's outcome, then releases the session. On
    /// failure the session stays closing so the write can be retried.
    async fn persist_outcome(
        &self,
        session_id: Uuid,
        closing: &ClosingSession,
    ) -> Result<(), AppError> {
        if let Err(e) = self
            .applications
            .close_interview(closing.application_id, &closing.outcome)
            .await
        {
            warn!(
                "Session {session_id} closed as {} but the outcome was not stored: {e}",
                closing.outcome.status
            );
            return Err(e);
        }
        self.sessions.release(session_id);
        Ok(())
    }

    /// Awaits an external call under the configured timeout.
    async fn bounded<T, E: Display>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, String> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "{what} timed out after {}s",
                self.call_timeout.as_secs()
            )),
        }
    }
}

fn fallback_questions() -> Vec<String> {
    FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

fn is_usable(set: &QuestionSet) -> bool {
    set.questions.len() == QUESTION_COUNT && set.questions.iter().all(|q| !q.trim().is_empty())
}

/// Formats the transcript into the block layout the scorecard prompt expects.
pub fn format_transcript(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|r| {
            format!(
                "Q: {}\nA: {}\nScore: {}/{MAX_SCORE}\nFeedback: {}\n",
                r.question, r.answer, r.score, r.feedback
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Union of both flag lists, sorted and de-duplicated.
fn merge_flags(server: &[String], client: &[String]) -> Vec<String> {
    server
        .iter()
        .chain(client)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
