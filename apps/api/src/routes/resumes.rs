//! Axum route handlers for the Resume API.
//!
//! Identity is an opaque `user_id` supplied by the caller (the gateway in
//! front of this service owns authentication); every owner-scoped handler
//! takes it as a query parameter and passes it straight to the store, which
//! enforces ownership.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{Resume, ResumeData, SetOutcome, Visibility};
use crate::editor::EditorSession;
use crate::errors::AppError;
use crate::models::resume::PublicResume;
use crate::state::AppState;
use crate::store::ResumePatch;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub title: String,
    pub slug: Option<String>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResumeRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub visibility: Option<Visibility>,
    pub data: Option<ResumeData>,
}

#[derive(Debug, Deserialize)]
pub struct SetLockRequest {
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct AiEditRequest {
    pub instruction: String,
}

#[derive(Debug, Serialize)]
pub struct AiEditResponse {
    pub resume: Resume,
    pub applied: usize,
    pub skipped: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    Query(who): Query<UserIdQuery>,
    Json(request): Json<CreateResumeRequest>,
) -> Result<Json<Resume>, AppError> {
    let resume = state
        .store
        .create(
            who.user_id,
            &request.title,
            request.slug.as_deref(),
            request.visibility,
        )
        .await?;
    Ok(Json(resume))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(who): Query<UserIdQuery>,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(state.store.list(who.user_id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.store.get(id, who.user_id).await?))
}

/// PATCH /api/v1/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
    Json(request): Json<UpdateResumeRequest>,
) -> Result<Json<Resume>, AppError> {
    let patch = ResumePatch {
        title: request.title,
        slug: request.slug,
        visibility: request.visibility,
        data: request.data,
    };
    if patch.is_empty() {
        return Err(AppError::Validation("empty update".to_string()));
    }
    Ok(Json(state.store.update(id, who.user_id, patch).await?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.delete(id, who.user_id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// POST /api/v1/resumes/:id/duplicate
pub async fn handle_duplicate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.store.duplicate(id, who.user_id).await?))
}

/// POST /api/v1/resumes/:id/lock
pub async fn handle_set_lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
    Json(request): Json<SetLockRequest>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(
        state.store.set_lock(id, who.user_id, request.locked).await?,
    ))
}

/// POST /api/v1/resumes/:id/print
///
/// Renders the resume to PDF and bumps its download counter.
pub async fn handle_print(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let resume = state.store.get(id, who.user_id).await?;
    let pdf = state.exporter.export(&resume).await?;
    state.store.increment_downloads(id).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.pdf\"", resume.slug),
        ),
    ];
    Ok((headers, Bytes::from(pdf)))
}

/// GET /api/v1/resumes/:id/export
///
/// The raw document JSON, verbatim, as a download.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let resume = state.store.get(id, who.user_id).await?;
    let body = serde_json::to_vec_pretty(&resume.data).map_err(|e| AppError::Internal(e.into()))?;

    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.json\"", resume.slug),
        ),
    ];
    Ok((headers, Bytes::from(body)))
}

/// GET /api/v1/public/:username/:slug
///
/// The public view: notes redacted, view counter bumped. Private and
/// missing resumes are the same 404.
pub async fn handle_get_public(
    State(state): State<AppState>,
    Path((username, slug)): Path<(String, String)>,
) -> Result<Json<PublicResume>, AppError> {
    let public = state.store.get_public(&username, &slug).await?;
    state.store.increment_views(public.id).await?;
    Ok(Json(public))
}

/// POST /api/v1/resumes/:id/ai-edit
///
/// Sends the document and an instruction to the model, applies the returned
/// path edits through an editor session so every invariant is enforced, and
/// persists the result.
pub async fn handle_ai_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(who): Query<UserIdQuery>,
    Json(request): Json<AiEditRequest>,
) -> Result<Json<AiEditResponse>, AppError> {
    if request.instruction.trim().is_empty() {
        return Err(AppError::Validation(
            "instruction cannot be empty".to_string(),
        ));
    }

    let resume = state.store.get(id, who.user_id).await?;
    let ops = state
        .llm
        .edit_resume(&resume.data, &request.instruction)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let mut session = EditorSession::new(resume);
    let mut applied = 0;
    let mut skipped = 0;
    for op in ops {
        match session.set_value(&op.path, op.value)? {
            SetOutcome::Applied => applied += 1,
            SetOutcome::NotMaterialized => {
                warn!(path = %op.path, "model edit addressed a missing path, skipped");
                skipped += 1;
            }
        }
    }

    let patch = ResumePatch {
        data: Some(session.data().clone()),
        visibility: Some(session.resume().visibility),
        ..Default::default()
    };
    let updated = state.store.update(id, who.user_id, patch).await?;
    info!(resume_id = %id, applied, skipped, "ai edit persisted");

    Ok(Json(AiEditResponse {
        resume: updated,
        applied,
        skipped,
    }))
}
