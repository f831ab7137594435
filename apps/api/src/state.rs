use std::sync::Arc;

use crate::applications::store::ApplicationStore;
use crate::config::Config;
use crate::interview::ai::InterviewAi;
use crate::interview::controller::InterviewController;
use crate::notify::Notifier;
use crate::reports::ReportStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the live interview sessions.
    pub interviews: Arc<InterviewController>,
    pub applications: Arc<dyn ApplicationStore>,
    pub ai: Arc<dyn InterviewAi>,
    pub reports: Arc<dyn ReportStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Config,
}
