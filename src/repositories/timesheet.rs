use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use uuid::Uuid;

use crate::entity::task::{Column as TaskColumn, Entity as TaskEntity};
use crate::entity::timesheet_entry::{self, ActiveModel, Column, Entity as TimesheetEntity};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateTimesheetEntry, TimesheetEntry, TimesheetFilter, TimesheetStatus, UpdateTimesheetEntry,
};
use crate::repositories::{Repository, UserRepository};

/// Timesheet entry repository for database operations
pub struct TimesheetRepository;

#[async_trait]
impl Repository<TimesheetEntry> for TimesheetRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<TimesheetEntry> {
        let model = TimesheetEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Timesheet entry".to_string()))?;

        Ok(model.into())
    }

    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let result = TimesheetEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Timesheet entry".to_string()));
        }

        Ok(())
    }

    async fn list(
        db: &DatabaseConnection,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<TimesheetEntry>> {
        Self::list_filtered(db, &TimesheetFilter::default(), limit, offset).await
    }

    async fn count(db: &DatabaseConnection) -> AppResult<u64> {
        let count = TimesheetEntity::find().count(db).await?;
        Ok(count)
    }
}

impl TimesheetRepository {
    /// Create a new draft entry
    pub async fn create(
        db: &DatabaseConnection,
        input: &CreateTimesheetEntry,
    ) -> AppResult<TimesheetEntry> {
        Self::verify_task(db, input.task_id).await?;
        if !UserRepository::exists(db, input.user_id).await? {
            return Err(AppError::Validation("User does not exist".to_string()));
        }

        let now = time::OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            task_id: Set(input.task_id),
            date: Set(input.date),
            hours: Set(input.hours),
            description: Set(input.description.clone()),
            status: Set(TimesheetStatus::Draft),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await.map_err(Self::map_day_conflict)?;
        Ok(result.into())
    }

    /// List entries matching `filter`, newest date first, then by task name
    pub async fn list_filtered(
        db: &DatabaseConnection,
        filter: &TimesheetFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<TimesheetEntry>> {
        let models = Self::filtered(filter)
            .join(JoinType::InnerJoin, timesheet_entry::Relation::Task.def())
            .order_by_desc(Column::Date)
            .order_by_asc(TaskColumn::Name)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    pub async fn count_filtered(
        db: &DatabaseConnection,
        filter: &TimesheetFilter,
    ) -> AppResult<u64> {
        let count = Self::filtered(filter).count(db).await?;
        Ok(count)
    }

    fn filtered(filter: &TimesheetFilter) -> Select<TimesheetEntity> {
        let mut condition = Condition::all();

        if let Some(user_id) = filter.user_id {
            condition = condition.add(Column::UserId.eq(user_id));
        }
        if let Some(task_id) = filter.task_id {
            condition = condition.add(Column::TaskId.eq(task_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(Column::Status.eq(status));
        }
        if let Some(date_from) = filter.date_from {
            condition = condition.add(Column::Date.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            condition = condition.add(Column::Date.lte(date_to));
        }

        TimesheetEntity::find().filter(condition)
    }

    /// Update content fields and/or status
    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        input: &UpdateTimesheetEntry,
    ) -> AppResult<TimesheetEntry> {
        let model = TimesheetEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Timesheet entry".to_string()))?;

        if let Some(task_id) = input.task_id {
            Self::verify_task(db, task_id).await?;
        }

        let mut active: ActiveModel = model.into();

        if let Some(task_id) = input.task_id {
            active.task_id = Set(task_id);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(hours) = input.hours {
            active.hours = Set(hours);
        }
        if let Some(description) = &input.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await.map_err(Self::map_day_conflict)?;
        Ok(result.into())
    }

    /// Set only the status (submit / review)
    pub async fn set_status(
        db: &DatabaseConnection,
        id: Uuid,
        status: TimesheetStatus,
    ) -> AppResult<TimesheetEntry> {
        let input = UpdateTimesheetEntry {
            status: Some(status),
            ..Default::default()
        };
        Self::update(db, id, &input).await
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

    fn map_day_conflict(e: sea_orm::DbErr) -> AppError {
        if e.to_string().contains("duplicate key") || e.to_string().contains("unique") {
            AppError::Conflict("Timesheet entry for this task and date".to_string())
        } else {
            AppError::from(e)
        }
    }
}

// Conversion from SeaORM model to our domain model
impl From<timesheet_entry::Model> for TimesheetEntry {
    fn from(m: timesheet_entry::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            task_id: m.task_id,
            date: m.date,
            hours: m.hours,
            description: m.description,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
