pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::interview::handlers as interview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview session API
        .route("/api/v1/interviews", post(interview::handle_start_interview))
        .route(
            "/api/v1/interviews/casual-question",
            post(interview::handle_make_casual),
        )
        .route(
            "/api/v1/interviews/:session_id/tab-switch",
            post(interview::handle_tab_switch),
        )
        .route(
            "/api/v1/interviews/:session_id/answers",
            post(interview::handle_score_answer),
        )
        .route(
            "/api/v1/interviews/:session_id/finalize",
            post(interview::handle_finalize),
        )
        // Admin workflow API
        .route(
            "/api/v1/jobs/:job_id/shortlist",
            post(applications::handle_shortlist),
        )
        .route(
            "/api/v1/applications/:id/invite",
            post(applications::handle_send_invite),
        )
        .route(
            "/api/v1/applications/:id/status",
            post(applications::handle_update_status),
        )
        .route(
            "/api/v1/applications/:id/report",
            get(applications::handle_download_report),
        )
        .with_state(state)
}
