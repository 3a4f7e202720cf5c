/// Project and membership endpoints
///
/// Destructive and member-management operations are guarded by an explicit
/// allow-list of roles; the guard runs after the access-token middleware,
/// so identity is always established before the role check.
///
/// # Endpoints
///
/// - `GET    /api/v1/projects` - projects the caller created or joined
/// - `POST   /api/v1/projects` - create project (caller becomes project_admin)
/// - `GET    /api/v1/projects/:project_id` - fetch one project
/// - `PUT    /api/v1/projects/:project_id` - update name/description
/// - `DELETE /api/v1/projects/:project_id` - cascade delete [managers]
/// - `GET    /api/v1/projects/:project_id/members` - list members
/// - `POST   /api/v1/projects/:project_id/members` - add member [managers]
/// - `PUT    /api/v1/projects/:project_id/members/:user_id` - change role [managers]
/// - `DELETE /api/v1/projects/:project_id/members/:user_id` - remove member [managers]

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
use taskcamp_shared::auth::authorization::{ProjectRole, PROJECT_MANAGERS};
use taskcamp_shared::models::member::{MemberWithUser, ProjectMember};
use taskcamp_shared::models::project::{NewProject, Project};
use uuid::Uuid;
use validator::Validate;

/// Create-project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Update-project request; at least one field must be present
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Add-member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: ProjectRole,
}

/// Update-member-role request
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: ProjectRole,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `GET /api/v1/projects`
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_for_user(&state.db, user.id).await?;

    Ok(Json(projects))
}

/// `POST /api/v1/projects`
pub async fn create_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let project = state
        .lifecycle
        .create_project(NewProject {
            name: req.name.trim().to_string(),
            description: req.description.trim().to_string(),
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// `GET /api/v1/projects/:project_id`
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("project not found".to_string()))?;

    Ok(Json(project))
}

/// `PUT /api/v1/projects/:project_id`
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    if req.name.as_deref().map_or(true, |n| n.trim().is_empty())
        && req
            .description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
    {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }

    let project = Project::update(&state.db, project_id, req.name, req.description)
        .await?
        .ok_or_else(|| ApiError::NotFound("project not found".to_string()))?;

    Ok(Json(project))
}

/// `DELETE /api/v1/projects/:project_id`
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .guard
        .require_role(user.id, project_id, PROJECT_MANAGERS)
        .await?;

    state.lifecycle.delete_project(project_id).await?;

    Ok(Json(MessageResponse {
        message: "project deleted successfully",
    }))
}

/// `GET /api/v1/projects/:project_id/members`
pub async fn list_members(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberWithUser>>> {
    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("project not found".to_string()))?;

    let members = ProjectMember::list_with_users(&state.db, project_id).await?;

    Ok(Json(members))
}

/// `POST /api/v1/projects/:project_id/members`
pub async fn add_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProjectMember>)> {
    state
        .guard
        .require_role(user.id, project_id, PROJECT_MANAGERS)
        .await?;

    let member = state
        .lifecycle
        .add_member(project_id, req.user_id, req.role)
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// `PUT /api/v1/projects/:project_id/members/:user_id`
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((project_id, member_user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRoleRequest>,
) -> ApiResult<Json<ProjectMember>> {
    state
        .guard
        .require_role(user.id, project_id, PROJECT_MANAGERS)
        .await?;

    let member = state
        .lifecycle
        .update_member_role(project_id, member_user_id, req.role)
        .await?;

    Ok(Json(member))
}

/// `DELETE /api/v1/projects/:project_id/members/:user_id`
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((project_id, member_user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .guard
        .require_role(user.id, project_id, PROJECT_MANAGERS)
        .await?;

    state
        .lifecycle
        .remove_member(project_id, member_user_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "member removed from project",
    }))
}
