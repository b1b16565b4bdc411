pub mod health;
pub mod resumes;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume API
        .route(
            "/api/v1/resumes",
            post(resumes::handle_create).get(resumes::handle_list),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get)
                .patch(resumes::handle_update)
                .delete(resumes::handle_delete),
        )
        .route(
            "/api/v1/resumes/:id/duplicate",
            post(resumes::handle_duplicate),
        )
        .route("/api/v1/resumes/:id/lock", post(resumes::handle_set_lock))
        .route("/api/v1/resumes/:id/print", post(resumes::handle_print))
        .route("/api/v1/resumes/:id/export", get(resumes::handle_export))
        .route("/api/v1/resumes/:id/ai-edit", post(resumes::handle_ai_edit))
        // Public surface
        .route(
            "/api/v1/public/:username/:slug",
            get(resumes::handle_get_public),
        )
        .with_state(state)
}
