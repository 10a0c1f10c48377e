pub mod leave_request;
pub mod notice;
pub mod project;
pub mod task;
pub mod task_time_entry;
pub mod timesheet;
pub mod token;
pub mod user;

pub use leave_request::LeaveRequestRepository;
pub use notice::NoticeRepository;
pub use project::ProjectRepository;
pub use task::{TaskRepository, TaskSummary};
pub use task_time_entry::TaskTimeEntryRepository;
pub use timesheet::TimesheetRepository;
pub use token::RevokedTokenRepository;
pub use user::UserRepository;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::AppResult;

/// Base repository trait for common CRUD operations
#[async_trait]
pub trait Repository<T>
where
    T: Send + Sync,
{
    /// Find entity by ID
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<T>;

    /// Delete entity by ID
    async fn delete(db: &DatabaseConnection, id: Uuid) -> AppResult<()>;

    /// List entities with pagination
    async fn list(db: &DatabaseConnection, limit: u64, offset: u64) -> AppResult<Vec<T>>;

    /// Count total entities
    async fn count(db: &DatabaseConnection) -> AppResult<u64>;
}
