//! Row-level access rules.
//!
//! Every resource is either *shared* (projects, notices: anyone signed in can
//! read, only admins write) or *owned* through one or more user reference
//! fields. Admins bypass ownership entirely.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LeaveRequest, Notice, Project, Role, Task, TaskTimeEntry, TimesheetEntry};

/// The authenticated caller of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

/// Who a record belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// Visible to everyone, writable by admins only
    Shared,
    /// Owned by any of the listed users
    Owners(Vec<Uuid>),
}

pub trait Owned {
    fn ownership(&self) -> Ownership;
}

impl Owned for Project {
    fn ownership(&self) -> Ownership {
        Ownership::Shared
    }
}

impl Owned for Notice {
    fn ownership(&self) -> Ownership {
        Ownership::Shared
    }
}

impl Owned for Task {
    fn ownership(&self) -> Ownership {
        Ownership::Owners(self.assigned_to.into_iter().chain(self.created_by).collect())
    }
}

impl Owned for TimesheetEntry {
    fn ownership(&self) -> Ownership {
        Ownership::Owners(vec![self.user_id])
    }
}

impl Owned for TaskTimeEntry {
    fn ownership(&self) -> Ownership {
        Ownership::Owners(vec![self.user_id])
    }
}

impl Owned for LeaveRequest {
    fn ownership(&self) -> Ownership {
        Ownership::Owners(vec![self.user_id])
    }
}

pub struct AccessPolicy;

impl AccessPolicy {
    /// Whether `actor` may perform `operation` on an existing `entity`.
    ///
    /// For `Create` this answers whether the entity as it would be stored is
    /// acceptable, i.e. whether the actor would own it.
    pub fn can_access<E: Owned + ?Sized>(actor: &Actor, entity: &E, operation: Operation) -> bool {
        if actor.is_admin() {
            return true;
        }
        match (entity.ownership(), operation) {
            (Ownership::Shared, Operation::Read) => true,
            (Ownership::Shared, _) => false,
            (Ownership::Owners(owners), _) => owners.contains(&actor.id),
        }
    }

    /// Resolve the owner for a new record. Non-admins may only name themselves.
    pub fn resolve_owner(actor: &Actor, requested: Option<Uuid>) -> AppResult<Uuid> {
        match requested {
            None => Ok(actor.id),
            Some(id) if id == actor.id || actor.is_admin() => Ok(id),
            Some(_) => Err(AppError::Forbidden(
                "You can only create records for yourself".to_string(),
            )),
        }
    }

    /// Owner scope for list queries: admins see everything (optionally
    /// narrowed by `requested`), everyone else sees only their own rows.
    pub fn list_scope(actor: &Actor, requested: Option<Uuid>) -> Option<Uuid> {
        if actor.is_admin() {
            requested
        } else {
            Some(actor.id)
        }
    }

    /// Rows outside the caller's read scope are reported as missing
    pub fn ensure_readable<E: Owned + ?Sized>(actor: &Actor, entity: &E, resource: &str) -> AppResult<()> {
        if Self::can_access(actor, entity, Operation::Read) {
            Ok(())
        } else {
            Err(AppError::NotFound(resource.to_string()))
        }
    }

    pub fn ensure<E: Owned + ?Sized>(
        actor: &Actor,
        entity: &E,
        operation: Operation,
        resource: &str,
    ) -> AppResult<()> {
        if operation == Operation::Read {
            return Self::ensure_readable(actor, entity, resource);
        }
        if Self::can_access(actor, entity, operation) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "You do not have permission to modify this {}",
                resource.to_lowercase()
            )))
        }
    }

    pub fn require_admin(actor: &Actor) -> AppResult<()> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }
}
