use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::TaskStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub reporting_manager: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub due_date: Option<Date>,
    pub status: TaskStatus,
    pub progress: i32, // percentage (0 - 100)
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub reporting_manager: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub due_date: Option<Date>,
    pub status: Option<TaskStatus>,
    pub progress: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub reporting_manager: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub due_date: Option<Date>,
    pub status: Option<TaskStatus>,
    pub progress: Option<i32>,
}

/// Query filters for task listing
#[derive(Debug, Default, Clone)]
pub struct TaskFilter {
    /// Restrict to tasks assigned to or created by this user
    pub owner_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub status: Option<TaskStatus>,
}
