//! Status transition rules for timesheet entries and leave requests, plus the
//! field invariants checked before either is written.

use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, Time};

use crate::error::{AppError, AppResult};
use crate::models::{
    ApproverChange, LeaveRequest, LeaveStatus, TimesheetEntry, TimesheetStatus, UpdateLeaveRequest,
    UpdateTimesheetEntry,
};
use crate::services::access::Actor;

// ---------------------------------------------------------------------------
// Timesheet entries
// ---------------------------------------------------------------------------

/// Who is allowed to perform a given transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Owner,
    Admin,
}

pub struct TimesheetWorkflow;

impl TimesheetWorkflow {
    /// Transition table:
    /// - `draft`     -> `submitted`            (owner)
    /// - `submitted` -> `approved`, `rejected` (admin)
    pub fn transition_party(from: TimesheetStatus, to: TimesheetStatus) -> Option<Party> {
        use TimesheetStatus::*;
        match (from, to) {
            (Draft, Submitted) => Some(Party::Owner),
            (Submitted, Approved) | (Submitted, Rejected) => Some(Party::Admin),
            _ => None,
        }
    }

    /// Validate that `actor` may move `entry` to `next`. Same-status is a no-op.
    pub fn check_transition(
        actor: &Actor,
        entry: &TimesheetEntry,
        next: TimesheetStatus,
    ) -> AppResult<()> {
        if entry.status == next {
            return Ok(());
        }

        match Self::transition_party(entry.status, next) {
            None => Err(AppError::Validation(format!(
                "Cannot move timesheet entry from '{}' to '{}'",
                entry.status.as_str(),
                next.as_str()
            ))),
            Some(Party::Owner) if entry.user_id != actor.id => Err(AppError::Forbidden(
                "Only the owner can submit a timesheet entry".to_string(),
            )),
            Some(Party::Admin) if !actor.is_admin() => Err(AppError::Forbidden(
                "Only an admin can approve or reject a timesheet entry".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Content edits (and deletion) are limited to drafts unless the actor is an admin
    pub fn check_edit(actor: &Actor, entry: &TimesheetEntry) -> AppResult<()> {
        if actor.is_admin() || entry.status == TimesheetStatus::Draft {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Timesheet entry is {} and can no longer be edited",
                entry.status.as_str()
            )))
        }
    }

    /// Validate a partial update: content changes and any status change
    pub fn check_update(
        actor: &Actor,
        entry: &TimesheetEntry,
        input: &UpdateTimesheetEntry,
    ) -> AppResult<()> {
        let touches_content = input.task_id.is_some()
            || input.date.is_some()
            || input.hours.is_some()
            || input.description.is_some();

        if touches_content {
            Self::check_edit(actor, entry)?;
        }
        if let Some(next) = input.status {
            Self::check_transition(actor, entry, next)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Leave requests
// ---------------------------------------------------------------------------

pub struct LeaveWorkflow;

impl LeaveWorkflow {
    /// Approver bookkeeping for an admin setting `next` on `current`:
    /// a real change records the admin, a return to `pending` clears it.
    pub fn approver_change(actor: &Actor, current: LeaveStatus, next: LeaveStatus) -> ApproverChange {
        if current == next {
            ApproverChange::Keep
        } else if next == LeaveStatus::Pending {
            ApproverChange::Clear
        } else {
            ApproverChange::Set(actor.id)
        }
    }

    /// Admin-only review of a leave request
    pub fn review(actor: &Actor, current: &LeaveRequest, next: LeaveStatus) -> AppResult<ApproverChange> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only an admin can approve or reject a leave request".to_string(),
            ));
        }
        Ok(Self::approver_change(actor, current.status, next))
    }

    /// Owners may only change (or delete) a request while it is pending
    pub fn check_edit(actor: &Actor, current: &LeaveRequest) -> AppResult<()> {
        if actor.is_admin() || current.status == LeaveStatus::Pending {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Leave request is {} and can no longer be edited",
                current.status.as_str()
            )))
        }
    }

    /// Validate a general update and work out what happens to the approver.
    ///
    /// Owners may edit content while the request is pending; they can never
    /// approve/reject or write admin comments.
    pub fn plan_update(
        actor: &Actor,
        current: &LeaveRequest,
        input: &UpdateLeaveRequest,
    ) -> AppResult<ApproverChange> {
        if actor.is_admin() {
            return Ok(match input.status {
                Some(next) => Self::approver_change(actor, current.status, next),
                None => ApproverChange::Keep,
            });
        }

        Self::check_edit(actor, current)?;
        if matches!(input.status, Some(s) if s != LeaveStatus::Pending) {
            return Err(AppError::Forbidden(
                "Only an admin can approve or reject a leave request".to_string(),
            ));
        }
        if input.admin_comments.is_some() {
            return Err(AppError::Forbidden(
                "Only an admin can set admin comments".to_string(),
            ));
        }
        Ok(ApproverChange::Keep)
    }
}

// ---------------------------------------------------------------------------
// Field invariants
// ---------------------------------------------------------------------------

/// Maximum hours that can be booked on a single timesheet entry.
pub const MAX_HOURS_PER_ENTRY: i64 = 24;

pub fn validate_hours(hours: Decimal) -> AppResult<()> {
    if hours <= Decimal::ZERO || hours > Decimal::from(MAX_HOURS_PER_ENTRY) {
        return Err(AppError::Validation(format!(
            "Hours must be greater than 0 and at most {}",
            MAX_HOURS_PER_ENTRY
        )));
    }
    if hours.scale() > 2 {
        return Err(AppError::Validation(
            "Hours can have at most 2 decimal places".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_progress(progress: i32) -> AppResult<()> {
    if !(0..=100).contains(&progress) {
        return Err(AppError::Validation(
            "Progress must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_time_range(start: OffsetDateTime, end: OffsetDateTime) -> AppResult<()> {
    if end <= start {
        return Err(AppError::Validation(
            "End time must be after start time".to_string(),
        ));
    }
    Ok(())
}

/// Date range, plus a clock-time window when the leave is hourly
pub fn validate_leave_period(
    start_date: Date,
    end_date: Option<Date>,
    is_hourly: bool,
    start_time: Option<Time>,
    end_time: Option<Time>,
) -> AppResult<()> {
    if let Some(end_date) = end_date {
        if end_date < start_date {
            return Err(AppError::Validation(
                "End date cannot be before start date".to_string(),
            ));
        }
    }

    if is_hourly {
        match (start_time, end_time) {
            (Some(start), Some(end)) if end > start => {}
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "End time must be after start time".to_string(),
                ))
            }
            _ => {
                return Err(AppError::Validation(
                    "Hourly leave requires start_time and end_time".to_string(),
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeaveType, Role};
    use std::str::FromStr;
    use time::macros::{date, datetime, time};
    use uuid::Uuid;

    fn actor(role: Role) -> Actor {
        Actor::new(Uuid::new_v4(), role)
    }

    fn entry(owner: &Actor, status: TimesheetStatus) -> TimesheetEntry {
        let now = OffsetDateTime::now_utc();
        TimesheetEntry {
            id: Uuid::new_v4(),
            user_id: owner.id,
            task_id: Uuid::new_v4(),
            date: date!(2025 - 03 - 14),
            hours: Decimal::new(8, 0),
            description: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn leave(owner: &Actor, status: LeaveStatus) -> LeaveRequest {
        let now = OffsetDateTime::now_utc();
        LeaveRequest {
            id: Uuid::new_v4(),
            user_id: owner.id,
            leave_type: LeaveType::Vacation,
            start_date: date!(2025 - 07 - 01),
            end_date: Some(date!(2025 - 07 - 05)),
            reason: "Summer trip".to_string(),
            status,
            is_hourly: false,
            start_time: None,
            end_time: None,
            admin_comments: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_can_submit_draft() {
        let owner = actor(Role::User);
        let e = entry(&owner, TimesheetStatus::Draft);
        assert!(TimesheetWorkflow::check_transition(&owner, &e, TimesheetStatus::Submitted).is_ok());
    }

    #[test]
    fn admin_cannot_submit_someone_elses_draft() {
        let owner = actor(Role::User);
        let e = entry(&owner, TimesheetStatus::Draft);
        let result = TimesheetWorkflow::check_transition(&actor(Role::Admin), &e, TimesheetStatus::Submitted);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn only_admin_reviews_submitted_entries() {
        let owner = actor(Role::User);
        let e = entry(&owner, TimesheetStatus::Submitted);

        assert!(matches!(
            TimesheetWorkflow::check_transition(&owner, &e, TimesheetStatus::Approved),
            Err(AppError::Forbidden(_))
        ));
        let admin = actor(Role::Admin);
        assert!(TimesheetWorkflow::check_transition(&admin, &e, TimesheetStatus::Approved).is_ok());
        assert!(TimesheetWorkflow::check_transition(&admin, &e, TimesheetStatus::Rejected).is_ok());
    }

    #[test]
    fn transitions_outside_the_table_are_invalid() {
        let owner = actor(Role::User);
        let admin = actor(Role::Admin);

        let draft = entry(&owner, TimesheetStatus::Draft);
        assert!(matches!(
            TimesheetWorkflow::check_transition(&admin, &draft, TimesheetStatus::Approved),
            Err(AppError::Validation(_))
        ));

        let approved = entry(&owner, TimesheetStatus::Approved);
        assert!(matches!(
            TimesheetWorkflow::check_transition(&admin, &approved, TimesheetStatus::Draft),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn same_status_is_a_no_op() {
        let owner = actor(Role::User);
        let e = entry(&owner, TimesheetStatus::Approved);
        assert!(TimesheetWorkflow::check_transition(&owner, &e, TimesheetStatus::Approved).is_ok());
    }

    #[test]
    fn owner_cannot_edit_after_submission() {
        let owner = actor(Role::User);
        for status in [
            TimesheetStatus::Submitted,
            TimesheetStatus::Approved,
            TimesheetStatus::Rejected,
        ] {
            let e = entry(&owner, status);
            let input = UpdateTimesheetEntry {
                hours: Some(Decimal::new(4, 0)),
                ..Default::default()
            };
            assert!(matches!(
                TimesheetWorkflow::check_update(&owner, &e, &input),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn admin_can_edit_at_any_status() {
        let owner = actor(Role::User);
        let e = entry(&owner, TimesheetStatus::Approved);
        let input = UpdateTimesheetEntry {
            description: Some("corrected".to_string()),
            ..Default::default()
        };
        assert!(TimesheetWorkflow::check_update(&actor(Role::Admin), &e, &input).is_ok());
    }

    #[test]
    fn admin_decision_records_approver() {
        let owner = actor(Role::User);
        let admin = actor(Role::Admin);
        let l = leave(&owner, LeaveStatus::Pending);

        assert_eq!(
            LeaveWorkflow::review(&admin, &l, LeaveStatus::Approved).unwrap(),
            ApproverChange::Set(admin.id)
        );
        assert_eq!(
            LeaveWorkflow::review(&admin, &l, LeaveStatus::Pending).unwrap(),
            ApproverChange::Keep
        );
    }

    #[test]
    fn reverting_to_pending_clears_approver() {
        let owner = actor(Role::User);
        let admin = actor(Role::Admin);
        let l = leave(&owner, LeaveStatus::Rejected);

        let input = UpdateLeaveRequest {
            status: Some(LeaveStatus::Pending),
            ..Default::default()
        };
        assert_eq!(
            LeaveWorkflow::plan_update(&admin, &l, &input).unwrap(),
            ApproverChange::Clear
        );
    }

    #[test]
    fn owner_cannot_review_own_leave() {
        let owner = actor(Role::User);
        let l = leave(&owner, LeaveStatus::Pending);

        assert!(matches!(
            LeaveWorkflow::review(&owner, &l, LeaveStatus::Approved),
            Err(AppError::Forbidden(_))
        ));

        let input = UpdateLeaveRequest {
            status: Some(LeaveStatus::Approved),
            ..Default::default()
        };
        assert!(matches!(
            LeaveWorkflow::plan_update(&owner, &l, &input),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn owner_edits_pending_content_only() {
        let owner = actor(Role::User);
        let pending = leave(&owner, LeaveStatus::Pending);

        let content = UpdateLeaveRequest {
            reason: Some("Family event".to_string()),
            status: Some(LeaveStatus::Pending),
            ..Default::default()
        };
        assert_eq!(
            LeaveWorkflow::plan_update(&owner, &pending, &content).unwrap(),
            ApproverChange::Keep
        );

        let comments = UpdateLeaveRequest {
            admin_comments: Some("approve me".to_string()),
            ..Default::default()
        };
        assert!(LeaveWorkflow::plan_update(&owner, &pending, &comments).is_err());

        let approved = leave(&owner, LeaveStatus::Approved);
        assert!(LeaveWorkflow::plan_update(&owner, &approved, &content).is_err());
    }

    #[test]
    fn hours_must_be_positive_and_bounded() {
        assert!(validate_hours(Decimal::from_str("7.5").unwrap()).is_ok());
        assert!(validate_hours(Decimal::from(24)).is_ok());
        assert!(validate_hours(Decimal::ZERO).is_err());
        assert!(validate_hours(Decimal::from(25)).is_err());
        assert!(validate_hours(Decimal::from_str("1.125").unwrap()).is_err());
    }

    #[test]
    fn time_range_requires_end_after_start() {
        let start = datetime!(2025-03-14 09:00 UTC);
        assert!(validate_time_range(start, datetime!(2025-03-14 10:30 UTC)).is_ok());
        assert!(validate_time_range(start, start).is_err());
        assert!(validate_time_range(start, datetime!(2025-03-14 08:00 UTC)).is_err());
    }

    #[test]
    fn hourly_leave_needs_a_window() {
        let day = date!(2025 - 03 - 14);
        assert!(validate_leave_period(day, None, true, Some(time!(9:00)), Some(time!(12:00))).is_ok());
        assert!(validate_leave_period(day, None, true, None, Some(time!(12:00))).is_err());
        assert!(validate_leave_period(day, None, true, Some(time!(12:00)), Some(time!(9:00))).is_err());
        assert!(validate_leave_period(day, Some(date!(2025 - 03 - 13)), false, None, None).is_err());
    }
}
