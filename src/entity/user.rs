use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: i16,
    pub is_active: bool,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::timesheet_entry::Entity")]
    TimesheetEntries,
    #[sea_orm(has_many = "super::task_time_entry::Entity")]
    TaskTimeEntries,
    #[sea_orm(has_many = "super::leave_request::Entity")]
    LeaveRequests,
}

impl Related<super::timesheet_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimesheetEntries.def()
    }
}

impl Related<super::task_time_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskTimeEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
