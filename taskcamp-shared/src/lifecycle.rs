/// Cascading lifecycle operations across projects, tasks, subtasks, and
/// memberships.
///
/// Creation validates the named parent before inserting; deletion removes
/// children before the parent, in a fixed order, so no record ever
/// references a deleted parent:
///
/// ```text
/// delete project: members → notes → subtasks (of its tasks) → tasks → project
/// delete task:    subtasks → task
/// ```
///
/// The steps are individually atomic but not wrapped in a cross-entity
/// transaction, so a create racing a delete can still slip a child in
/// between steps. A stricter deployment would run the sequence inside a
/// store-level transaction.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::authorization::ProjectRole;
use crate::models::member::{NewMember, ProjectMember};
use crate::models::project::{NewProject, Project};
use crate::models::subtask::{NewSubTask, SubTask};
use crate::models::task::{NewTask, Task};
use crate::store::{MembershipStore, StoreError, WorkspaceStore};

/// Error type for lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    #[error("subtask {0} not found")]
    SubTaskNotFound(Uuid),

    /// The (user, project) pair already has a membership row
    #[error("user {user_id} is already a member of project {project_id}")]
    AlreadyMember { user_id: Uuid, project_id: Uuid },

    /// No membership row for the (user, project) pair
    #[error("user {user_id} is not a member of project {project_id}")]
    NotAMember { user_id: Uuid, project_id: Uuid },

    /// Role update that would not change anything; treated as caller error
    #[error("member already holds role {0:?}")]
    RoleUnchanged(ProjectRole),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coordinates multi-entity creation and deletion so the containment
/// invariants (no orphaned members, tasks, or subtasks) hold.
#[derive(Clone)]
pub struct LifecycleCoordinator {
    workspace: Arc<dyn WorkspaceStore>,
    memberships: Arc<dyn MembershipStore>,
}

impl LifecycleCoordinator {
    pub fn new(workspace: Arc<dyn WorkspaceStore>, memberships: Arc<dyn MembershipStore>) -> Self {
        Self {
            workspace,
            memberships,
        }
    }

    /// Creates a project and makes its creator a `project_admin` member.
    ///
    /// Without the membership row the creator could not pass any of the
    /// role-guarded operations on their own project.
    pub async fn create_project(&self, data: NewProject) -> Result<Project, LifecycleError> {
        let creator = data.created_by;
        let project = self.workspace.insert_project(data).await?;

        self.memberships
            .insert(NewMember {
                user_id: creator,
                project_id: project.id,
                role: ProjectRole::ProjectAdmin,
            })
            .await?;

        Ok(project)
    }

    /// Deletes a project and everything that references it.
    ///
    /// Order: memberships, notes, subtasks of the project's tasks, tasks,
    /// then the project row itself.
    ///
    /// # Errors
    ///
    /// `LifecycleError::ProjectNotFound` when the project does not exist.
    pub async fn delete_project(&self, project_id: Uuid) -> Result<(), LifecycleError> {
        self.workspace
            .project_by_id(project_id)
            .await?
            .ok_or(LifecycleError::ProjectNotFound(project_id))?;

        let members = self.memberships.remove_by_project(project_id).await?;
        let notes = self.workspace.delete_notes_by_project(project_id).await?;

        let task_ids = self.workspace.task_ids_by_project(project_id).await?;
        let subtasks = self.workspace.delete_subtasks_by_tasks(&task_ids).await?;
        let tasks = self.workspace.delete_tasks_by_project(project_id).await?;

        self.workspace.delete_project(project_id).await?;

        tracing::info!(
            %project_id,
            members,
            notes,
            tasks,
            subtasks,
            "project deleted with cascade"
        );
        Ok(())
    }

    /// Creates a task after checking its project exists.
    pub async fn create_task(&self, data: NewTask) -> Result<Task, LifecycleError> {
        self.workspace
            .project_by_id(data.project_id)
            .await?
            .ok_or(LifecycleError::ProjectNotFound(data.project_id))?;

        Ok(self.workspace.insert_task(data).await?)
    }

    /// Deletes a task and its subtasks, children first.
    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), LifecycleError> {
        self.workspace
            .task_by_id(task_id)
            .await?
            .ok_or(LifecycleError::TaskNotFound(task_id))?;

        let subtasks = self.workspace.delete_subtasks_by_task(task_id).await?;
        self.workspace.delete_task(task_id).await?;

        tracing::info!(%task_id, subtasks, "task deleted with cascade");
        Ok(())
    }

    /// Creates a subtask after checking its task exists.
    pub async fn create_subtask(&self, data: NewSubTask) -> Result<SubTask, LifecycleError> {
        self.workspace
            .task_by_id(data.task_id)
            .await?
            .ok_or(LifecycleError::TaskNotFound(data.task_id))?;

        Ok(self.workspace.insert_subtask(data).await?)
    }

    /// Deletes a single subtask.
    pub async fn delete_subtask(&self, subtask_id: Uuid) -> Result<(), LifecycleError> {
        let deleted = self.workspace.delete_subtask(subtask_id).await?;
        if !deleted {
            return Err(LifecycleError::SubTaskNotFound(subtask_id));
        }

        Ok(())
    }

    /// Adds a member to a project.
    ///
    /// # Errors
    ///
    /// - `LifecycleError::ProjectNotFound` when the project does not exist
    /// - `LifecycleError::AlreadyMember` when the (user, project) pair
    ///   already has a row
    pub async fn add_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember, LifecycleError> {
        self.workspace
            .project_by_id(project_id)
            .await?
            .ok_or(LifecycleError::ProjectNotFound(project_id))?;

        if self.memberships.find(user_id, project_id).await?.is_some() {
            return Err(LifecycleError::AlreadyMember {
                user_id,
                project_id,
            });
        }

        let member = match self
            .memberships
            .insert(NewMember {
                user_id,
                project_id,
                role,
            })
            .await
        {
            Ok(member) => member,
            // Lost the race between the existence check and the insert
            Err(StoreError::Duplicate(_)) => {
                return Err(LifecycleError::AlreadyMember {
                    user_id,
                    project_id,
                })
            }
            Err(err) => return Err(err.into()),
        };

        Ok(member)
    }

    /// Removes a member from a project. Removing an absent membership is a
    /// no-op, matching delete idempotency elsewhere.
    pub async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, LifecycleError> {
        Ok(self.memberships.remove(user_id, project_id).await?)
    }

    /// Overwrites a member's role.
    ///
    /// # Errors
    ///
    /// - `LifecycleError::NotAMember` when no membership exists
    /// - `LifecycleError::RoleUnchanged` when the requested role equals the
    ///   current one
    pub async fn update_member_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember, LifecycleError> {
        let current = self
            .memberships
            .find(user_id, project_id)
            .await?
            .ok_or(LifecycleError::NotAMember {
                user_id,
                project_id,
            })?;

        if current.role == role {
            return Err(LifecycleError::RoleUnchanged(role));
        }

        self.memberships
            .set_role(user_id, project_id, role)
            .await?
            .ok_or(LifecycleError::NotAMember {
                user_id,
                project_id,
            })
    }
}
