/// Database models
///
/// One module per entity, each owning its row struct, input structs, and
/// query functions:
///
/// - `user`: accounts, credential fields, refresh-token slot
/// - `project`: projects
/// - `member`: (user, project, role) memberships
/// - `task`: tasks with attachments
/// - `subtask`: subtasks
/// - `note`: plain-text project notes

pub mod member;
pub mod note;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;
