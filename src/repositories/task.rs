use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use uuid::Uuid;

use crate::entity::project::{Column as ProjectColumn, Entity as ProjectEntity};
use crate::entity::task::{self, ActiveModel, Column, Entity as TaskEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTask, Task, TaskFilter, UpdateTask};
use crate::repositories::{Repository, UserRepository};

/// Name and project of a task, for display fields on entries
#[derive(Debug, Clone)]
pub struct TaskSummary {
    pub name: String,
    pub project_id: Uuid,
    pub project_name: String,
}

/// Task repository for database operations
pub struct TaskRepository;

#[async_trait]
impl Repository<Task> for TaskRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Task> {
        let model = TaskEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Task".to_string()))?;

        Ok(model.into())
    }

    /// Subtasks and entries are removed via ON DELETE CASCADE
    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let result = TaskEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Task".to_string()));
        }

        Ok(())
    }

    async fn list(db: &DatabaseConnection, limit: u64, offset: u64) -> AppResult<Vec<Task>> {
        Self::list_filtered(db, &TaskFilter::default(), limit, offset).await
    }

    async fn count(db: &DatabaseConnection) -> AppResult<u64> {
        let count = TaskEntity::find().count(db).await?;
        Ok(count)
    }
}

impl TaskRepository {
    /// Create a new task
    pub async fn create(
        db: &DatabaseConnection,
        created_by: Uuid,
        input: &CreateTask,
    ) -> AppResult<Task> {
        ProjectEntity::find_by_id(input.project_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::Validation("Project does not exist".to_string()))?;
        if let Some(parent_id) = input.parent_task_id {
            Self::verify_parent(db, input.project_id, None, parent_id).await?;
        }
        Self::verify_users(db, [input.assigned_to, input.reporting_manager]).await?;

        let now = time::OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(input.project_id),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            assigned_to: Set(input.assigned_to),
            created_by: Set(Some(created_by)),
            reporting_manager: Set(input.reporting_manager),
            parent_task_id: Set(input.parent_task_id),
            due_date: Set(input.due_date),
            status: Set(input.status.unwrap_or_default()),
            progress: Set(input.progress.unwrap_or(0)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await.map_err(Self::map_name_conflict)?;
        Ok(result.into())
    }

    /// List tasks matching `filter`, ordered by project name then task name
    pub async fn list_filtered(
        db: &DatabaseConnection,
        filter: &TaskFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<Task>> {
        let models = Self::filtered(filter)
            .join(JoinType::InnerJoin, task::Relation::Project.def())
            .order_by_asc(ProjectColumn::Name)
            .order_by_asc(Column::Name)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    pub async fn count_filtered(db: &DatabaseConnection, filter: &TaskFilter) -> AppResult<u64> {
        let count = Self::filtered(filter).count(db).await?;
        Ok(count)
    }

    fn filtered(filter: &TaskFilter) -> Select<TaskEntity> {
        let mut condition = Condition::all();

        if let Some(owner_id) = filter.owner_id {
            condition = condition.add(
                Condition::any()
                    .add(Column::AssignedTo.eq(owner_id))
                    .add(Column::CreatedBy.eq(owner_id)),
            );
        }
        if let Some(project_id) = filter.project_id {
            condition = condition.add(Column::ProjectId.eq(project_id));
        }
        if let Some(assigned_to) = filter.assigned_to {
            condition = condition.add(Column::AssignedTo.eq(assigned_to));
        }
        if let Some(status) = filter.status {
            condition = condition.add(Column::Status.eq(status));
        }

        TaskEntity::find().filter(condition)
    }

    /// Update task
    pub async fn update(db: &DatabaseConnection, id: Uuid, input: &UpdateTask) -> AppResult<Task> {
        let model = TaskEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Task".to_string()))?;

        if let Some(parent_id) = input.parent_task_id {
            Self::verify_parent(db, model.project_id, Some(id), parent_id).await?;
        }
        Self::verify_users(db, [input.assigned_to, input.reporting_manager]).await?;

        let mut active: ActiveModel = model.into();

        if let Some(name) = &input.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &input.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(assigned_to) = input.assigned_to {
            active.assigned_to = Set(Some(assigned_to));
        }
        if let Some(reporting_manager) = input.reporting_manager {
            active.reporting_manager = Set(Some(reporting_manager));
        }
        if let Some(parent_task_id) = input.parent_task_id {
            active.parent_task_id = Set(Some(parent_task_id));
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(Some(due_date));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(progress) = input.progress {
            active.progress = Set(progress);
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await.map_err(Self::map_name_conflict)?;
        Ok(result.into())
    }

    /// Task name and project name keyed by task id
    pub async fn summaries(
        db: &DatabaseConnection,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> AppResult<HashMap<Uuid, TaskSummary>> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = TaskEntity::find()
            .filter(Column::Id.is_in(ids))
            .find_also_related(ProjectEntity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(task, project)| {
                let summary = TaskSummary {
                    name: task.name,
                    project_id: task.project_id,
                    project_name: project.map(|p| p.name).unwrap_or_default(),
                };
                (task.id, summary)
            })
            .collect())
    }

    /// The parent must exist in the same project and must not be the task
    /// itself or one of its descendants
    async fn verify_parent(
        db: &DatabaseConnection,
        project_id: Uuid,
        task_id: Option<Uuid>,
        parent_id: Uuid,
    ) -> AppResult<()> {
        if Some(parent_id) == task_id {
            return Err(AppError::Validation(
                "A task cannot be its own parent".to_string(),
            ));
        }

        let parent = TaskEntity::find_by_id(parent_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::Validation("Parent task does not exist".to_string()))?;

        if parent.project_id != project_id {
            return Err(AppError::Validation(
                "Parent task must belong to the same project".to_string(),
            ));
        }

        // Walk up from the new parent; reaching the task itself would close a loop
        if let Some(task_id) = task_id {
            let mut ancestor = parent.parent_task_id;
            while let Some(ancestor_id) = ancestor {
                if ancestor_id == task_id {
                    return Err(AppError::Validation(
                        "A task cannot be moved under one of its own subtasks".to_string(),
                    ));
                }
                ancestor = TaskEntity::find_by_id(ancestor_id)
                    .one(db)
                    .await?
                    .and_then(|t| t.parent_task_id);
            }
        }
        Ok(())
    }

    async fn verify_users(
        db: &DatabaseConnection,
        ids: impl IntoIterator<Item = Option<Uuid>>,
    ) -> AppResult<()> {
        for id in ids.into_iter().flatten() {
            if !UserRepository::exists(db, id).await? {
                return Err(AppError::Validation(format!("User {} does not exist", id)));
            }
        }
        Ok(())
    }

    fn map_name_conflict(e: sea_orm::DbErr) -> AppError {
        if e.to_string().contains("duplicate key") || e.to_string().contains("unique") {
            AppError::Conflict("Task with this name in the project".to_string())
        } else {
            AppError::from(e)
        }
    }
}

// Conversion from SeaORM model to our domain model
impl From<task::Model> for Task {
    fn from(m: task::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            name: m.name,
            description: m.description,
            assigned_to: m.assigned_to,
            created_by: m.created_by,
            reporting_manager: m.reporting_manager,
            parent_task_id: m.parent_task_id,
            due_date: m.due_date,
            status: m.status,
            progress: m.progress,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
