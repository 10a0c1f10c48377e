use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entity::task::{Column as TaskColumn, Entity as TaskEntity};
use crate::entity::task_time_entry::{self, ActiveModel, Column, Entity as TaskTimeEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTaskTimeEntry, TaskTimeEntry, TaskTimeEntryFilter, UpdateTaskTimeEntry};
use crate::repositories::{Repository, UserRepository};
use crate::services::workflow::validate_time_range;

/// Task time entry repository for database operations
pub struct TaskTimeEntryRepository;

#[async_trait]
impl Repository<TaskTimeEntry> for TaskTimeEntryRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<TaskTimeEntry> {
        let model = TaskTimeEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Task time entry".to_string()))?;

        Ok(model.into())
    }

    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let result = TaskTimeEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Task time entry".to_string()));
        }

        Ok(())
    }

    async fn list(
        db: &DatabaseConnection,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<TaskTimeEntry>> {
        Self::list_filtered(db, &TaskTimeEntryFilter::default(), limit, offset).await
    }

    async fn count(db: &DatabaseConnection) -> AppResult<u64> {
        let count = TaskTimeEntity::find().count(db).await?;
        Ok(count)
    }
}

impl TaskTimeEntryRepository {
    /// Create a new time entry
    pub async fn create(
        db: &DatabaseConnection,
        input: &CreateTaskTimeEntry,
    ) -> AppResult<TaskTimeEntry> {
        validate_time_range(input.start_time, input.end_time)?;
        Self::verify_task(db, input.task_id).await?;
        if !UserRepository::exists(db, input.user_id).await? {
            return Err(AppError::Validation("User does not exist".to_string()));
        }

        let now = time::OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            task_id: Set(input.task_id),
            start_time: Set(input.start_time),
            end_time: Set(input.end_time),
            description: Set(input.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// List entries matching `filter`, ordered by start time
    pub async fn list_filtered(
        db: &DatabaseConnection,
        filter: &TaskTimeEntryFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<TaskTimeEntry>> {
        let models = Self::filtered(filter)
            .order_by_asc(Column::StartTime)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    pub async fn count_filtered(
        db: &DatabaseConnection,
        filter: &TaskTimeEntryFilter,
    ) -> AppResult<u64> {
        let count = Self::filtered(filter).count(db).await?;
        Ok(count)
    }

    fn filtered(filter: &TaskTimeEntryFilter) -> Select<TaskTimeEntity> {
        let mut condition = Condition::all();

        if let Some(user_id) = filter.user_id {
            condition = condition.add(Column::UserId.eq(user_id));
        }
        if let Some(task_id) = filter.task_id {
            condition = condition.add(Column::TaskId.eq(task_id));
        }
        if let Some(project_id) = filter.project_id {
            condition = condition.add(
                Column::TaskId.in_subquery(
                    Query::select()
                        .column(TaskColumn::Id)
                        .from(TaskEntity)
                        .and_where(Expr::col(TaskColumn::ProjectId).eq(project_id))
                        .to_owned(),
                ),
            );
        }
        if let Some(start) = filter.start_time_gte {
            condition = condition.add(Column::StartTime.gte(start));
        }
        if let Some(end) = filter.end_time_lte {
            condition = condition.add(Column::EndTime.lte(end));
        }

        TaskTimeEntity::find().filter(condition)
    }

    /// Update an entry; the resulting range must still end after it starts
    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        input: &UpdateTaskTimeEntry,
    ) -> AppResult<TaskTimeEntry> {
        let model = TaskTimeEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Task time entry".to_string()))?;

        validate_time_range(
            input.start_time.unwrap_or(model.start_time),
            input.end_time.unwrap_or(model.end_time),
        )?;
        if let Some(task_id) = input.task_id {
            Self::verify_task(db, task_id).await?;
        }

        let mut active: ActiveModel = model.into();

        if let Some(task_id) = input.task_id {
            active.task_id = Set(task_id);
        }
        if let Some(start_time) = input.start_time {
            active.start_time = Set(start_time);
        }
        if let Some(end_time) = input.end_time {
            active.end_time = Set(end_time);
        }
        if let Some(description) = &input.description {
            active.description = Set(Some(description.clone()));
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }

    async fn verify_task(db: &DatabaseConnection, task_id: Uuid) -> AppResult<()> {
        let count = TaskEntity::find()
            .filter(TaskColumn::Id.eq(task_id))
            .count(db)
            .await?;

        if count == 0 {
            return Err(AppError::Validation("Task does not exist".to_string()));
        }
        Ok(())
    }
}

// Conversion from SeaORM model to our domain model
impl From<task_time_entry::Model> for TaskTimeEntry {
    fn from(m: task_time_entry::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            task_id: m.task_id,
            start_time: m.start_time,
            end_time: m.end_time,
            description: m.description,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
