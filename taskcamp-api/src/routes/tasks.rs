/// Task and subtask endpoints
///
/// Every operation requires membership in the task's project (any role);
/// routes keyed by a task or subtask id resolve the entity first to find
/// its project, then run the role check.
///
/// # Endpoints
///
/// - `GET    /api/v1/projects/:project_id/tasks` - list tasks
/// - `POST   /api/v1/projects/:project_id/tasks` - create task
/// - `GET    /api/v1/tasks/:task_id` - task detail with resolved usernames
/// - `PUT    /api/v1/tasks/:task_id` - update task
/// - `DELETE /api/v1/tasks/:task_id` - delete task and its subtasks
/// - `GET    /api/v1/tasks/:task_id/subtasks` - list subtasks
/// - `POST   /api/v1/tasks/:task_id/subtasks` - create subtask
/// - `PUT    /api/v1/subtasks/:subtask_id` - update subtask
/// - `DELETE /api/v1/subtasks/:subtask_id` - delete subtask

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
use taskcamp_shared::models::subtask::{NewSubTask, SubTask};
use taskcamp_shared::models::task::{
    Attachment, NewTask, Task, TaskDetail, TaskStatus, TaskUpdate,
};
use uuid::Uuid;
use validator::Validate;

/// Create-task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub assigned_to: Uuid,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Update-task request
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub attachments: Option<Vec<Attachment>>,
}

/// Create-subtask request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
}

/// Update-subtask request
#[derive(Debug, Deserialize)]
pub struct UpdateSubTaskRequest {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Resolves a task and checks the caller belongs to its project.
async fn task_for_member(
    state: &AppState,
    user_id: Uuid,
    task_id: Uuid,
) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

    state
        .guard
        .require_role(user_id, task.project_id, ANY_MEMBER)
        .await?;

    Ok(task)
}

/// Resolves a subtask and checks the caller belongs to its project.
async fn subtask_for_member(
    state: &AppState,
    user_id: Uuid,
    subtask_id: Uuid,
) -> ApiResult<SubTask> {
    let subtask = SubTask::find_by_id(&state.db, subtask_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("subtask not found".to_string()))?;

    task_for_member(state, user_id, subtask.task_id).await?;

    Ok(subtask)
}

/// `GET /api/v1/projects/:project_id/tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    state
        .guard
        .require_role(user.id, project_id, ANY_MEMBER)
        .await?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;

    Ok(Json(tasks))
}

/// `POST /api/v1/projects/:project_id/tasks`
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(ApiError::from_validation)?;

    state
        .guard
        .require_role(user.id, project_id, ANY_MEMBER)
        .await?;

    let task = state
        .lifecycle
        .create_task(NewTask {
            project_id,
            title: req.title.trim().to_string(),
            description: req.description,
            assigned_to: req.assigned_to,
            assigned_by: user.id,
            status: req.status,
            attachments: req.attachments,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /api/v1/tasks/:task_id`
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskDetail>> {
    task_for_member(&state, user.id, task_id).await?;

    let detail = Task::find_detail(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

    Ok(Json(detail))
}

/// `PUT /api/v1/tasks/:task_id`
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    task_for_member(&state, user.id, task_id).await?;

    let task = Task::update(
        &state.db,
        task_id,
        TaskUpdate {
            title: req.title,
            description: req.description,
            status: req.status,
            attachments: req.attachments,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

    Ok(Json(task))
}

/// `DELETE /api/v1/tasks/:task_id`
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    task_for_member(&state, user.id, task_id).await?;

    state.lifecycle.delete_task(task_id).await?;

    Ok(Json(MessageResponse {
        message: "task and related subtasks deleted successfully",
    }))
}

/// `GET /api/v1/tasks/:task_id/subtasks`
pub async fn list_subtasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SubTask>>> {
    task_for_member(&state, user.id, task_id).await?;

    let subtasks = SubTask::list_by_task(&state.db, task_id).await?;

    Ok(Json(subtasks))
}

/// `POST /api/v1/tasks/:task_id/subtasks`
pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateSubTaskRequest>,
) -> ApiResult<(StatusCode, Json<SubTask>)> {
    req.validate().map_err(ApiError::from_validation)?;

    task_for_member(&state, user.id, task_id).await?;

    let subtask = state
        .lifecycle
        .create_subtask(NewSubTask {
            task_id,
            title: req.title.trim().to_string(),
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(subtask)))
}

/// `PUT /api/v1/subtasks/:subtask_id`
pub async fn update_subtask(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(subtask_id): Path<Uuid>,
    Json(req): Json<UpdateSubTaskRequest>,
) -> ApiResult<Json<SubTask>> {
    subtask_for_member(&state, user.id, subtask_id).await?;

    let subtask = SubTask::update(&state.db, subtask_id, req.title, req.is_completed)
        .await?
        .ok_or_else(|| ApiError::NotFound("subtask not found".to_string()))?;

    Ok(Json(subtask))
}

/// `DELETE /api/v1/subtasks/:subtask_id`
pub async fn delete_subtask(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(subtask_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    subtask_for_member(&state, user.id, subtask_id).await?;

    state.lifecycle.delete_subtask(subtask_id).await?;

    Ok(Json(MessageResponse {
        message: "subtask deleted successfully",
    }))
}
