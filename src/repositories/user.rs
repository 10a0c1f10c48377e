use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use time::Date;
use uuid::Uuid;

use crate::entity::timesheet_entry;
use crate::entity::user::{self, ActiveModel, Column, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateUser, Role, UpdateUser, User, ROLE_ADMIN, ROLE_USER};
use crate::repositories::Repository;

/// User repository for database operations
pub struct UserRepository;

// Implement the base Repository trait
#[async_trait]
impl Repository<User> for UserRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(model.into())
    }

    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id).exec(db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        Ok(())
    }

    async fn list(db: &DatabaseConnection, limit: u64, offset: u64) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(Column::Username)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count(db: &DatabaseConnection) -> AppResult<u64> {
        let count = UserEntity::find().count(db).await?;
        Ok(count)
    }
}

// User-specific methods (not in the base trait)
impl UserRepository {
    /// Create a new regular user
    pub async fn create(
        db: &DatabaseConnection,
        input: &CreateUser,
        password_hash: &str,
    ) -> AppResult<User> {
        Self::insert(db, input, password_hash, ROLE_USER).await
    }

    /// Create a new user with an explicit role
    pub async fn create_with_role(
        db: &DatabaseConnection,
        input: &CreateUser,
        password_hash: &str,
        role: Role,
    ) -> AppResult<User> {
        Self::insert(db, input, password_hash, role.code()).await
    }

    async fn insert(
        db: &DatabaseConnection,
        input: &CreateUser,
        password_hash: &str,
        role: i16,
    ) -> AppResult<User> {
        let now = time::OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username.clone()),
            email: Set(input.email.clone()),
            password_hash: Set(password_hash.to_string()),
            first_name: Set(input.first_name.clone()),
            last_name: Set(input.last_name.clone()),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await.map_err(|e| {
            if e.to_string().contains("duplicate key") || e.to_string().contains("unique") {
                AppError::Conflict("Username or email".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        Ok(result.into())
    }

    /// Find user by username (for login)
    pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> AppResult<User> {
        let model = UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(model.into())
    }

    /// Check if a user exists
    pub async fn exists(db: &DatabaseConnection, id: Uuid) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(Column::Id.eq(id))
            .count(db)
            .await?;

        Ok(count > 0)
    }

    /// Update profile fields
    pub async fn update(db: &DatabaseConnection, id: Uuid, input: &UpdateUser) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let mut active: ActiveModel = model.into();

        if let Some(email) = &input.email {
            active.email = Set(email.clone());
        }
        if let Some(first_name) = &input.first_name {
            active.first_name = Set(Some(first_name.clone()));
        }
        if let Some(last_name) = &input.last_name {
            active.last_name = Set(Some(last_name.clone()));
        }
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }

    /// Change a user's role
    pub async fn set_role(db: &DatabaseConnection, id: Uuid, role: Role) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let mut active: ActiveModel = model.into();
        active.role = Set(role.code());
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }

    /// Create the admin account, or promote the existing user of that name
    pub async fn ensure_admin(
        db: &DatabaseConnection,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<User> {
        match Self::find_by_username(db, username).await {
            Ok(user) if user.is_admin() => Ok(user),
            Ok(user) => Self::set_role(db, user.id, Role::Admin).await,
            Err(AppError::NotFound(_)) => {
                let input = CreateUser {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: String::new(),
                    first_name: None,
                    last_name: None,
                };
                Self::create_with_role(db, &input, password_hash, Role::Admin).await
            }
            Err(e) => Err(e),
        }
    }

    /// Usernames keyed by id, for display fields on other resources
    pub async fn username_map(
        db: &DatabaseConnection,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> AppResult<HashMap<Uuid, String>> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> = UserEntity::find()
            .select_only()
            .column(Column::Id)
            .column(Column::Username)
            .filter(Column::Id.is_in(ids))
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Active regular users with no timesheet entry on `date`
    pub async fn list_missing_timesheet(db: &DatabaseConnection, date: Date) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::Role.ne(ROLE_ADMIN))
            .filter(
                Column::Id.not_in_subquery(
                    Query::select()
                        .column(timesheet_entry::Column::UserId)
                        .from(timesheet_entry::Entity)
                        .and_where(Expr::col(timesheet_entry::Column::Date).eq(date))
                        .to_owned(),
                ),
            )
            .order_by_asc(Column::Username)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}

// Conversion from SeaORM model to our domain model
impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            password_hash: m.password_hash,
            first_name: m.first_name,
            last_name: m.last_name,
            role: Role::from_code(m.role),
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
