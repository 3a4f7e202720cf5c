/// Project note endpoints
///
/// Notes are project-scoped plain text; every operation requires
/// membership in the note's project (any role).
///
/// # Endpoints
///
/// - `GET    /api/v1/projects/:project_id/notes` - list notes with authors
/// - `POST   /api/v1/projects/:project_id/notes` - create note
/// - `GET    /api/v1/notes/:note_id` - fetch one note
/// - `PUT    /api/v1/notes/:note_id` - update content
/// - `DELETE /api/v1/notes/:note_id` - delete note

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskcamp_shared::auth::authorization::ANY_MEMBER;
use taskcamp_shared::models::note::{NoteWithAuthor, ProjectNote};
use uuid::Uuid;
use validator::Validate;

/// Create/update note request
#[derive(Debug, Deserialize, Validate)]
pub struct NoteContentRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Resolves a note and checks the caller belongs to its project.
async fn note_for_member(
    state: &AppState,
    user_id: Uuid,
    note_id: Uuid,
) -> ApiResult<ProjectNote> {
    let note = ProjectNote::find_by_id(&state.db, note_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("note not found".to_string()))?;

    state
        .guard
        .require_role(user_id, note.project_id, ANY_MEMBER)
        .await?;

    Ok(note)
}

/// `GET /api/v1/projects/:project_id/notes`
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<NoteWithAuthor>>> {
    state
        .guard
        .require_role(user.id, project_id, ANY_MEMBER)
        .await?;

    let notes = ProjectNote::list_by_project(&state.db, project_id).await?;

    Ok(Json(notes))
}

/// `POST /api/v1/projects/:project_id/notes`
pub async fn create_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<NoteContentRequest>,
) -> ApiResult<(StatusCode, Json<ProjectNote>)> {
    req.validate().map_err(ApiError::from_validation)?;

    state
        .guard
        .require_role(user.id, project_id, ANY_MEMBER)
        .await?;

    let note =
        ProjectNote::create(&state.db, project_id, req.content.trim(), user.id).await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /api/v1/notes/:note_id`
pub async fn get_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(note_id): Path<Uuid>,
) -> ApiResult<Json<ProjectNote>> {
    let note = note_for_member(&state, user.id, note_id).await?;

    Ok(Json(note))
}

/// `PUT /api/v1/notes/:note_id`
pub async fn update_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(note_id): Path<Uuid>,
    Json(req): Json<NoteContentRequest>,
) -> ApiResult<Json<ProjectNote>> {
    req.validate().map_err(ApiError::from_validation)?;

    note_for_member(&state, user.id, note_id).await?;

    let note = ProjectNote::update_content(&state.db, note_id, req.content.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("note not found".to_string()))?;

    Ok(Json(note))
}

/// `DELETE /api/v1/notes/:note_id`
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(note_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    note_for_member(&state, user.id, note_id).await?;

    ProjectNote::delete(&state.db, note_id).await?;

    Ok(Json(MessageResponse {
        message: "note deleted successfully",
    }))
}
