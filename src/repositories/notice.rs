use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    Set,
};
use uuid::Uuid;

use crate::entity::notice::{self, ActiveModel, Column, Entity as NoticeEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateNotice, Notice, UpdateNotice};
use crate::repositories::Repository;

/// Notice repository for database operations
pub struct NoticeRepository;

#[async_trait]
impl Repository<Notice> for NoticeRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Notice> {
        let model = NoticeEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notice".to_string()))?;

        Ok(model.into())
    }

    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let result = NoticeEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Notice".to_string()));
        }

        Ok(())
    }

    async fn list(db: &DatabaseConnection, limit: u64, offset: u64) -> AppResult<Vec<Notice>> {
        let models = NoticeEntity::find()
            .order_by_desc(Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count(db: &DatabaseConnection) -> AppResult<u64> {
        let count = NoticeEntity::find().count(db).await?;
        Ok(count)
    }
}

impl NoticeRepository {
    pub async fn create(
        db: &DatabaseConnection,
        created_by: Uuid,
        input: &CreateNotice,
    ) -> AppResult<Notice> {
        let now = time::OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title.clone()),
            content: Set(input.content.clone()),
            created_by: Set(Some(created_by)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    pub async fn update(db: &DatabaseConnection, id: Uuid, input: &UpdateNotice) -> AppResult<Notice> {
        let model = NoticeEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notice".to_string()))?;

        let mut active: ActiveModel = model.into();

        if let Some(title) = &input.title {
            active.title = Set(title.clone());
        }
        if let Some(content) = &input.content {
            active.content = Set(content.clone());
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }
}

impl From<notice::Model> for Notice {
    fn from(m: notice::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
