use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sqlx::postgres::PgPool;

use crate::config::Config;
use crate::repositories::UserRepository;
use crate::services::AuthService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// SeaORM database connection (primary for queries)
    pub db: DatabaseConnection,
    /// SQLx pool for migrations only
    pub pg_pool: PgPool,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState: connect, migrate, and ensure the bootstrap admin
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        // Connect to PostgreSQL with SQLx (for migrations)
        let pg_pool = PgPool::connect(&config.database_url)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pg_pool)
            .await
            .map_err(|e| AppStateError::Migration(e.to_string()))?;

        // Connect to PostgreSQL with SeaORM
        let mut opt = ConnectOptions::new(&config.database_url);
        opt.max_connections(config.database_max_connections)
            .min_connections(1)
            .sqlx_logging(true);

        let db = Database::connect(opt)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        let state = Self {
            db,
            pg_pool,
            config,
        };
        state.ensure_bootstrap_admin().await?;

        Ok(state)
    }

    async fn ensure_bootstrap_admin(&self) -> Result<(), AppStateError> {
        let Some(admin) = &self.config.bootstrap_admin else {
            return Ok(());
        };

        let password_hash = AuthService::hash_password(&admin.password)
            .map_err(|e| AppStateError::Bootstrap(e.to_string()))?;
        let user =
            UserRepository::ensure_admin(&self.db, &admin.username, &admin.email, &password_hash)
                .await
                .map_err(|e| AppStateError::Bootstrap(e.to_string()))?;

        tracing::info!(username = %user.username, "Bootstrap admin account ready");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("PostgreSQL connection error: {0}")]
    Postgres(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Admin bootstrap error: {0}")]
    Bootstrap(String),
}
