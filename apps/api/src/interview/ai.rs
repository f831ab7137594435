//! AI Question/Scoring Service: free text in, declared JSON shape out.
//!
//! What to do when a reply is unusable is the caller's decision. Question
//! generation falls back to a fixed set; scoring and scorecards fail hard.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::interview::prompts::{
    fill, CASUAL_PROMPT, FIT_PROMPT, INTERVIEWER_SYSTEM, QUESTIONS_PROMPT, SCORECARD_PROMPT,
    SCORE_ANSWER_PROMPT,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerScore {
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub overall_summary: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_recommendation: String,
}

/// Shortlisting verdict for one resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDecision {
    pub shortlisted: bool,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasualQuestion {
    pub casual_question: String,
}

/// Carried in `AppState` as `Arc<dyn InterviewAi>`.
#[async_trait]
pub trait InterviewAi: Send + Sync {
    async fn generate_questions(
        &self,
        job_description: &str,
        candidate_skills: &str,
    ) -> Result<QuestionSet, LlmError>;

    async fn score_answer(&self, question: &str, answer: &str) -> Result<AnswerScore, LlmError>;

    async fn generate_scorecard(
        &self,
        job_description: &str,
        transcript: &str,
    ) -> Result<Scorecard, LlmError>;

    async fn assess_fit(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<FitDecision, LlmError>;

    async fn make_casual(&self, question: &str) -> Result<CasualQuestion, LlmError>;
}

pub struct LlmInterviewAi {
    /// Single attempt: interview calls sit on the candidate's request path.
    interview: LlmClient,
    /// Default retry budget, for admin-triggered batch work.
    batch: LlmClient,
}

impl LlmInterviewAi {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            interview: llm.clone().with_max_attempts(1),
            batch: llm,
        }
    }
}

#[async_trait]
impl InterviewAi for LlmInterviewAi {
    async fn generate_questions(
        &self,
        job_description: &str,
        candidate_skills: &str,
    ) -> Result<QuestionSet, LlmError> {
        let prompt = fill(
            QUESTIONS_PROMPT,
            &[
                ("job_description", job_description),
                ("candidate_skills", candidate_skills),
            ],
        );
        self.interview.call_json(&prompt, INTERVIEWER_SYSTEM).await
    }

    async fn score_answer(&self, question: &str, answer: &str) -> Result<AnswerScore, LlmError> {
        let prompt = fill(
            SCORE_ANSWER_PROMPT,
            &[("question", question), ("answer", answer)],
        );
        self.interview.call_json(&prompt, INTERVIEWER_SYSTEM).await
    }

    async fn generate_scorecard(
        &self,
        job_description: &str,
        transcript: &str,
    ) -> Result<Scorecard, LlmError> {
        let prompt = fill(
            SCORECARD_PROMPT,
            &[("job_description", job_description), ("transcript", transcript)],
        );
        self.interview.call_json(&prompt, INTERVIEWER_SYSTEM).await
    }

    async fn assess_fit(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<FitDecision, LlmError> {
        let prompt = fill(
            FIT_PROMPT,
            &[("job_description", job_description), ("resume_text", resume_text)],
        );
        self.batch.call_json(&prompt, JSON_ONLY_SYSTEM).await
    }

    async fn make_casual(&self, question: &str) -> Result<CasualQuestion, LlmError> {
        let prompt = fill(CASUAL_PROMPT, &[("question", question)]);
        self.interview.call_json(&prompt, JSON_ONLY_SYSTEM).await
    }
}
