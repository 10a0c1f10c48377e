use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use worklog::models::{
    CreateLeaveRequest, CreateNotice, CreateProject, CreateTask, CreateTaskTimeEntry,
    CreateTimesheetEntry, CreateUser, LeaveRequest, LeaveType, Notice, Project, Role, Task,
    TaskTimeEntry, TimesheetEntry, TimesheetStatus, User,
};
use worklog::repositories::{
    LeaveRequestRepository, NoticeRepository, ProjectRepository, TaskRepository,
    TaskTimeEntryRepository, TimesheetRepository, UserRepository,
};
use worklog::services::AuthService;
use worklog::state::AppState;

pub const TEST_PASSWORD: &str = "TestPassword123!";

/// Authentication info for tests
#[allow(dead_code)]
pub struct TestAuth {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

impl TestAuth {
    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

#[allow(dead_code)]
impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create a regular user and return auth info
    pub async fn create_user(&self) -> TestAuth {
        self.create_with_role(Role::User).await
    }

    /// Create an admin and return auth info
    pub async fn create_admin(&self) -> TestAuth {
        self.create_with_role(Role::Admin).await
    }

    async fn create_with_role(&self, role: Role) -> TestAuth {
        let unique_id = Uuid::new_v4().simple().to_string();
        let username = format!("user_{}", unique_id);
        let email = format!("test-{}@example.com", unique_id);

        let input = CreateUser {
            username: username.clone(),
            email: email.clone(),
            password: TEST_PASSWORD.to_string(),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        };

        let password_hash = AuthService::hash_password(TEST_PASSWORD).unwrap();
        let user: User =
            UserRepository::create_with_role(&self.state.db, &input, &password_hash, role)
                .await
                .unwrap();

        let tokens = AuthService::generate_token_pair(&user, &self.state.config).unwrap();

        TestAuth {
            user_id: user.id,
            username,
            email,
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }

    /// Create a test project
    pub async fn create_project(&self) -> Project {
        let input = CreateProject {
            name: format!("Test Project {}", Uuid::new_v4()),
            description: Some("Test project description".to_string()),
        };

        ProjectRepository::create(&self.state.db, &input)
            .await
            .unwrap()
    }

    /// Create a task in `project_id`, created by `created_by`
    pub async fn create_task(
        &self,
        project_id: Uuid,
        created_by: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Task {
        let input = CreateTask {
            project_id,
            name: format!("Test Task {}", Uuid::new_v4()),
            description: None,
            assigned_to,
            reporting_manager: None,
            parent_task_id: None,
            due_date: None,
            status: None,
            progress: None,
        };

        TaskRepository::create(&self.state.db, created_by, &input)
            .await
            .unwrap()
    }

    /// Create a project with a task assigned to `user_id`
    pub async fn create_task_for(&self, user_id: Uuid) -> Task {
        let project = self.create_project().await;
        self.create_task(project.id, user_id, Some(user_id)).await
    }

    /// Create a draft timesheet entry
    pub async fn create_timesheet(&self, user_id: Uuid, task_id: Uuid, date: Date) -> TimesheetEntry {
        let input = CreateTimesheetEntry {
            user_id,
            task_id,
            date,
            hours: Decimal::new(750, 2),
            description: Some("Worked on it".to_string()),
        };

        TimesheetRepository::create(&self.state.db, &input)
            .await
            .unwrap()
    }

    /// Create an entry and move it straight to `status`
    pub async fn create_timesheet_with_status(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        date: Date,
        status: TimesheetStatus,
    ) -> TimesheetEntry {
        let entry = self.create_timesheet(user_id, task_id, date).await;
        TimesheetRepository::set_status(&self.state.db, entry.id, status)
            .await
            .unwrap()
    }

    /// Create a one-hour time entry ending now
    pub async fn create_time_entry(&self, user_id: Uuid, task_id: Uuid) -> TaskTimeEntry {
        let end_time = OffsetDateTime::now_utc();
        let input = CreateTaskTimeEntry {
            user_id,
            task_id,
            start_time: end_time - Duration::hours(1),
            end_time,
            description: None,
        };

        TaskTimeEntryRepository::create(&self.state.db, &input)
            .await
            .unwrap()
    }

    /// Create a pending full-day leave request
    pub async fn create_leave(&self, user_id: Uuid, start_date: Date) -> LeaveRequest {
        let input = CreateLeaveRequest {
            user_id,
            leave_type: LeaveType::Vacation,
            start_date,
            end_date: Some(start_date + Duration::days(2)),
            reason: "Family trip".to_string(),
            is_hourly: false,
            start_time: None,
            end_time: None,
        };

        LeaveRequestRepository::create(&self.state.db, &input)
            .await
            .unwrap()
    }

    /// Create a notice authored by `created_by`
    pub async fn create_notice(&self, created_by: Uuid) -> Notice {
        let input = CreateNotice {
            title: format!("Notice {}", Uuid::new_v4()),
            content: "Office closed on Friday".to_string(),
        };

        NoticeRepository::create(&self.state.db, created_by, &input)
            .await
            .unwrap()
    }
}
