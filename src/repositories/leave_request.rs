use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entity::leave_request::{self, ActiveModel, Column, Entity as LeaveRequestEntity};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApproverChange, CreateLeaveRequest, LeaveRequest, LeaveRequestFilter, LeaveStatus,
    UpdateLeaveRequest,
};
use crate::repositories::{Repository, UserRepository};
use crate::services::workflow::validate_leave_period;

/// Leave request repository for database operations
pub struct LeaveRequestRepository;

#[async_trait]
impl Repository<LeaveRequest> for LeaveRequestRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<LeaveRequest> {
        let model = LeaveRequestEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request".to_string()))?;

        Ok(model.into())
    }

    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let result = LeaveRequestEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Leave request".to_string()));
        }

        Ok(())
    }

    async fn list(
        db: &DatabaseConnection,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<LeaveRequest>> {
        Self::list_filtered(db, &LeaveRequestFilter::default(), limit, offset).await
    }

    async fn count(db: &DatabaseConnection) -> AppResult<u64> {
        let count = LeaveRequestEntity::find().count(db).await?;
        Ok(count)
    }
}

impl LeaveRequestRepository {
    /// Create a new pending leave request
    pub async fn create(
        db: &DatabaseConnection,
        input: &CreateLeaveRequest,
    ) -> AppResult<LeaveRequest> {
        validate_leave_period(
            input.start_date,
            input.end_date,
            input.is_hourly,
            input.start_time,
            input.end_time,
        )?;
        if !UserRepository::exists(db, input.user_id).await? {
            return Err(AppError::Validation("User does not exist".to_string()));
        }

        let now = time::OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            leave_type: Set(input.leave_type),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            reason: Set(input.reason.clone()),
            status: Set(LeaveStatus::Pending),
            is_hourly: Set(input.is_hourly),
            start_time: Set(input.start_time.filter(|_| input.is_hourly)),
            end_time: Set(input.end_time.filter(|_| input.is_hourly)),
            admin_comments: Set(None),
            approved_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// List requests matching `filter`, newest first.
    ///
    /// The date range matches any request whose leave period overlaps it.
    pub async fn list_filtered(
        db: &DatabaseConnection,
        filter: &LeaveRequestFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<LeaveRequest>> {
        let models = Self::filtered(filter)
            .order_by_desc(Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    pub async fn count_filtered(
        db: &DatabaseConnection,
        filter: &LeaveRequestFilter,
    ) -> AppResult<u64> {
        let count = Self::filtered(filter).count(db).await?;
        Ok(count)
    }

    fn filtered(filter: &LeaveRequestFilter) -> Select<LeaveRequestEntity> {
        let mut condition = Condition::all();

        if let Some(user_id) = filter.user_id {
            condition = condition.add(Column::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(Column::Status.eq(status));
        }
        if let Some(date_from) = filter.date_from {
            condition = condition.add(
                Condition::any()
                    .add(Column::EndDate.gte(date_from))
                    .add(
                        Condition::all()
                            .add(Column::EndDate.is_null())
                            .add(Column::StartDate.gte(date_from)),
                    ),
            );
        }
        if let Some(date_to) = filter.date_to {
            condition = condition.add(Column::StartDate.lte(date_to));
        }

        LeaveRequestEntity::find().filter(condition)
    }

    /// Apply an update. The merged period is re-validated and the approver
    /// is adjusted as decided by the caller.
    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        input: &UpdateLeaveRequest,
        approver: ApproverChange,
    ) -> AppResult<LeaveRequest> {
        let model = LeaveRequestEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request".to_string()))?;

        // Clock times only apply to hourly leave
        let is_hourly = input.is_hourly.unwrap_or(model.is_hourly);
        let (start_time, end_time) = if is_hourly {
            (
                input.start_time.or(model.start_time),
                input.end_time.or(model.end_time),
            )
        } else {
            (None, None)
        };

        validate_leave_period(
            input.start_date.unwrap_or(model.start_date),
            input.end_date.or(model.end_date),
            is_hourly,
            start_time,
            end_time,
        )?;

        let mut active: ActiveModel = model.into();

        if let Some(leave_type) = input.leave_type {
            active.leave_type = Set(leave_type);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(Some(end_date));
        }
        if let Some(reason) = &input.reason {
            active.reason = Set(reason.clone());
        }
        active.is_hourly = Set(is_hourly);
        active.start_time = Set(start_time);
        active.end_time = Set(end_time);
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(admin_comments) = &input.admin_comments {
            active.admin_comments = Set(Some(admin_comments.clone()));
        }
        match approver {
            ApproverChange::Keep => {}
            ApproverChange::Set(admin_id) => active.approved_by = Set(Some(admin_id)),
            ApproverChange::Clear => active.approved_by = Set(None),
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }

    /// Record an admin decision on a request
    pub async fn review(
        db: &DatabaseConnection,
        id: Uuid,
        status: LeaveStatus,
        admin_comments: Option<String>,
        approver: ApproverChange,
    ) -> AppResult<LeaveRequest> {
        let input = UpdateLeaveRequest {
            status: Some(status),
            admin_comments,
            ..Default::default()
        };
        Self::update(db, id, &input, approver).await
    }
}

// Conversion from SeaORM model to our domain model
impl From<leave_request::Model> for LeaveRequest {
    fn from(m: leave_request::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            leave_type: m.leave_type,
            start_date: m.start_date,
            end_date: m.end_date,
            reason: m.reason,
            status: m.status,
            is_hourly: m.is_hourly,
            start_time: m.start_time,
            end_time: m.end_time,
            admin_comments: m.admin_comments,
            approved_by: m.approved_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
