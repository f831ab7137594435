// Interview sessions: lifecycle, tab-switch proctoring, scoring, finalization.
// All LLM calls go through llm_client via the InterviewAi trait.

pub mod ai;
pub mod controller;
pub mod handlers;
pub mod prompts;
pub mod session;
pub mod session_store;
