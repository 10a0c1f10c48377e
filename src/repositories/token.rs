use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entity::revoked_token::{ActiveModel, Column, Entity as RevokedTokenEntity};
use crate::error::AppResult;
use crate::services::Claims;

/// Denylist of refresh tokens invalidated by logout
pub struct RevokedTokenRepository;

impl RevokedTokenRepository {
    /// Revoke the token identified by `claims`. Revoking twice is a no-op.
    pub async fn revoke(db: &DatabaseConnection, claims: &Claims) -> AppResult<()> {
        let model = ActiveModel {
            jti: Set(claims.jti),
            user_id: Set(claims.sub),
            expires_at: Set(claims.expires_at()?),
            revoked_at: Set(OffsetDateTime::now_utc()),
        };

        RevokedTokenEntity::insert(model)
            .on_conflict(OnConflict::column(Column::Jti).do_nothing().to_owned())
            .do_nothing()
            .exec(db)
            .await?;

        Ok(())
    }

    pub async fn is_revoked(db: &DatabaseConnection, jti: Uuid) -> AppResult<bool> {
        let count = RevokedTokenEntity::find()
            .filter(Column::Jti.eq(jti))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// Drop entries whose token would have expired anyway
    pub async fn purge_expired(db: &DatabaseConnection) -> AppResult<u64> {
        let result = RevokedTokenEntity::delete_many()
            .filter(Column::ExpiresAt.lt(OffsetDateTime::now_utc()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
