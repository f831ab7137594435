//! In-memory collaborators for unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::applications::models::{
    ApplicantContactRow, ApplicationContextRow, ApplicationStatus, InterviewOutcome, JobRow,
};
use crate::applications::store::ApplicationStore;
use crate::config::Config;
use crate::errors::AppError;
use crate::interview::ai::{
    AnswerScore, CasualQuestion, FitDecision, InterviewAi, QuestionSet, Scorecard,
};
use crate::interview::controller::InterviewController;
use crate::interview::session::ProctorPolicy;
use crate::llm_client::{parse_json_reply, LlmError};
use crate::notify::{NotificationError, Notifier};
use crate::reports::{report_key, ReportError, ReportStore};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Application store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakeApplication {
    pub job_id: i32,
    pub resume_text: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub shortlist_reason: Option<String>,
    pub interview_results: Option<String>,
    pub report_path: Option<String>,
}

#[derive(Default)]
pub struct FakeStore {
    jobs: Mutex<HashMap<i32, JobRow>>,
    applications: Mutex<HashMap<i32, FakeApplication>>,
    /// Number of upcoming writes that fail like a dropped connection.
    failing_writes: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_application(&self, id: i32, job_id: i32, job_description: &str, resume: &str) {
        self.jobs.lock().entry(job_id).or_insert_with(|| JobRow {
            id: job_id,
            admin_id: 1,
            title: "Backend Engineer".to_string(),
            description: job_description.to_string(),
        });
        self.applications.lock().insert(
            id,
            FakeApplication {
                job_id,
                resume_text: resume.to_string(),
                email: format!("candidate{id}@example.com"),
                status: ApplicationStatus::Applied,
                shortlist_reason: None,
                interview_results: None,
                report_path: None,
            },
        );
    }

    pub fn application(&self, id: i32) -> FakeApplication {
        self.applications.lock()[&id].clone()
    }

    /// The next `n` writes fail without touching any application.
    pub fn fail_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    pub fn set_report_path(&self, id: i32, path: &str) {
        if let Some(app) = self.applications.lock().get_mut(&id) {
            app.report_path = Some(path.to_string());
        }
    }

    fn context(&self, id: i32, app: &FakeApplication) -> ApplicationContextRow {
        let description = self.jobs.lock()[&app.job_id].description.clone();
        ApplicationContextRow {
            application_id: id,
            job_description: description,
            resume_text: app.resume_text.clone(),
            status: app.status.as_str().to_string(),
        }
    }

    fn update(&self, id: i32, f: impl FnOnce(&mut FakeApplication)) -> Result<(), AppError> {
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(AppError::Internal(anyhow::anyhow!("connection reset by peer")));
        }
        let mut apps = self.applications.lock();
        let app = apps
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
        f(app);
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for FakeStore {
    async fn find_application_context(
        &self,
        application_id: i32,
    ) -> Result<Option<ApplicationContextRow>, AppError> {
        let app = self.applications.lock().get(&application_id).cloned();
        Ok(app.map(|a| self.context(application_id, &a)))
    }

    async fn set_application_status(
        &self,
        application_id: i32,
        status: ApplicationStatus,
    ) -> Result<(), AppError> {
        self.update(application_id, |a| a.status = status)
    }

    async fn close_interview(
        &self,
        application_id: i32,
        outcome: &InterviewOutcome,
    ) -> Result<(), AppError> {
        self.update(application_id, |a| {
            a.status = outcome.status;
            a.interview_results = Some(outcome.results.to_string());
            if let Some(path) = &outcome.report_path {
                a.report_path = Some(path.clone());
            }
        })
    }

    async fn find_job(&self, job_id: i32) -> Result<Option<JobRow>, AppError> {
        Ok(self.jobs.lock().get(&job_id).cloned())
    }

    async fn list_applications_by_status(
        &self,
        job_id: i32,
        status: ApplicationStatus,
    ) -> Result<Vec<ApplicationContextRow>, AppError> {
        let apps: Vec<(i32, FakeApplication)> = self
            .applications
            .lock()
            .iter()
            .filter(|(_, a)| a.job_id == job_id && a.status == status)
            .map(|(id, a)| (*id, a.clone()))
            .collect();
        let mut rows: Vec<_> = apps.iter().map(|(id, a)| self.context(*id, a)).collect();
        rows.sort_by_key(|r| r.application_id);
        Ok(rows)
    }

    async fn record_shortlist(&self, application_id: i32, reason: &str) -> Result<(), AppError> {
        self.update(application_id, |a| {
            a.status = ApplicationStatus::Shortlisted;
            a.shortlist_reason = Some(reason.to_string());
        })
    }

    async fn find_applicant_contact(
        &self,
        application_id: i32,
    ) -> Result<Option<ApplicantContactRow>, AppError> {
        let app = self.applications.lock().get(&application_id).cloned();
        Ok(app.map(|a| ApplicantContactRow {
            email: a.email,
            job_title: self.jobs.lock()[&a.job_id].title.clone(),
            company_name: "Acme".to_string(),
        }))
    }

    async fn find_report_path(&self, application_id: i32) -> Result<Option<String>, AppError> {
        Ok(self
            .applications
            .lock()
            .get(&application_id)
            .and_then(|a| a.report_path.clone()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AI service
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeAi {
    malformed: bool,
    delay: Option<Duration>,
    questions: Mutex<Vec<String>>,
    score: Mutex<u8>,
    /// Resumes containing this get shortlisted.
    fit_keyword: &'static str,
    score_calls: AtomicUsize,
    scorecard_calls: AtomicUsize,
}

impl Default for FakeAi {
    fn default() -> Self {
        Self {
            malformed: false,
            delay: None,
            questions: Mutex::new(Self::default_questions()),
            score: Mutex::new(7),
            fit_keyword: "Rust",
            score_calls: AtomicUsize::new(0),
            scorecard_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeAi {
    /// Every call fails the way an unparseable model reply does.
    pub fn malformed() -> Self {
        Self {
            malformed: true,
            ..Self::default()
        }
    }

    /// Every call takes `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn default_questions() -> Vec<String> {
        (1..=5).map(|i| format!("Tailored question {i}")).collect()
    }

    pub fn set_questions(&self, questions: Vec<String>) {
        *self.questions.lock() = questions;
    }

    pub fn set_score(&self, score: u8) {
        *self.score.lock() = score;
    }

    pub fn score_calls(&self) -> usize {
        self.score_calls.load(Ordering::SeqCst)
    }

    pub fn scorecard_calls(&self) -> usize {
        self.scorecard_calls.load(Ordering::SeqCst)
    }

    async fn reply<T: Send>(&self, value: T) -> Result<T, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.malformed {
            return parse_json_reply::<serde_json::Value>("I'm sorry, I can't help with that.")
                .map(|_| value);
        }
        Ok(value)
    }
}

#[async_trait]
impl InterviewAi for FakeAi {
    async fn generate_questions(
        &self,
        _job_description: &str,
        _candidate_skills: &str,
    ) -> Result<QuestionSet, LlmError> {
        let questions = self.questions.lock().clone();
        self.reply(QuestionSet { questions }).await
    }

    async fn score_answer(&self, _question: &str, answer: &str) -> Result<AnswerScore, LlmError> {
        self.score_calls.fetch_add(1, Ordering::SeqCst);
        let score = *self.score.lock();
        self.reply(AnswerScore {
            score,
            feedback: format!("Heard: {answer}"),
        })
        .await
    }

    async fn generate_scorecard(
        &self,
        _job_description: &str,
        _transcript: &str,
    ) -> Result<Scorecard, LlmError> {
        self.scorecard_calls.fetch_add(1, Ordering::SeqCst);
        self.reply(Scorecard {
            overall_summary: "Capable engineer".to_string(),
            strengths: vec!["Rust".to_string()],
            areas_for_improvement: vec!["Testing".to_string()],
            final_recommendation: "Proceed".to_string(),
        })
        .await
    }

    async fn assess_fit(
        &self,
        _job_description: &str,
        resume_text: &str,
    ) -> Result<FitDecision, LlmError> {
        let shortlisted = resume_text.contains(self.fit_keyword);
        self.reply(FitDecision {
            shortlisted,
            reason: if shortlisted {
                "Matches the core stack".to_string()
            } else {
                "Missing core stack".to_string()
            },
        })
        .await
    }

    async fn make_casual(&self, question: &str) -> Result<CasualQuestion, LlmError> {
        self.reply(CasualQuestion {
            casual_question: format!("So, {question}"),
        })
        .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Report store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeReports {
    fail: Mutex<bool>,
    documents: Mutex<HashMap<String, Bytes>>,
    flags: Mutex<HashMap<i32, Vec<String>>>,
}

impl FakeReports {
    pub fn fail_uploads(&self) {
        *self.fail.lock() = true;
    }

    pub fn flags_for(&self, application_id: i32) -> Vec<String> {
        self.flags
            .lock()
            .get(&application_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn put(&self, path: &str, body: &'static str) {
        self.documents
            .lock()
            .insert(path.to_string(), Bytes::from_static(body.as_bytes()));
    }
}

#[async_trait]
impl ReportStore for FakeReports {
    async fn render_and_persist(
        &self,
        scorecard: &Scorecard,
        proctoring_flags: &[String],
        application_id: i32,
    ) -> Result<String, ReportError> {
        if *self.fail.lock() {
            return Err(ReportError::Upload("bucket unavailable".to_string()));
        }
        let key = report_key(application_id);
        let document = crate::reports::render_report_md(scorecard, proctoring_flags);
        self.documents.lock().insert(key.clone(), Bytes::from(document));
        self.flags
            .lock()
            .insert(application_id, proctoring_flags.to_vec());
        Ok(key)
    }

    async fn fetch(&self, report_path: &str) -> Result<Option<Bytes>, ReportError> {
        Ok(self.documents.lock().get(report_path).cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Notifier
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct FakeNotifier {
    fail: Mutex<bool>,
    sent: Mutex<Vec<SentEmail>>,
}

impl FakeNotifier {
    pub fn fail_sends(&self) {
        *self.fail.lock() = true;
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        if *self.fail.lock() {
            return Err(NotificationError::Rejected {
                status: 401,
                body: "The provided authorization grant is invalid".to_string(),
            });
        }
        self.sent.lock().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Router state
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/interviews_test".to_string(),
        s3_bucket: "reports-test".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        anthropic_api_key: "sk-ant-test".to_string(),
        sendgrid_api_key: "SG.test".to_string(),
        mail_default_sender: "hiring@example.com".to_string(),
        public_base_url: "http://localhost:8080".to_string(),
        port: 8080,
        rust_log: "debug".to_string(),
        tab_switch_limit: 3,
        tab_switch_debounce_ms: 1000,
        session_max_age_secs: 7200,
        ai_timeout_secs: 5,
    }
}

/// Full handler state over in-memory collaborators.
pub fn test_state(store: Arc<FakeStore>, notifier: Arc<FakeNotifier>) -> AppState {
    let config = test_config();
    let ai: Arc<dyn InterviewAi> = Arc::new(FakeAi::default());
    let reports: Arc<dyn ReportStore> = Arc::new(FakeReports::default());
    let applications: Arc<dyn ApplicationStore> = store;

    let interviews = InterviewController::new(
        applications.clone(),
        ai.clone(),
        reports.clone(),
        ProctorPolicy::from_config(&config),
        Duration::from_secs(config.ai_timeout_secs),
    )
    .with_max_session_age(chrono::Duration::seconds(config.session_max_age_secs));

    AppState {
        interviews: Arc::new(interviews),
        applications,
        ai,
        reports,
        notifier,
        config,
    }
}
