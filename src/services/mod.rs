pub mod access;
pub mod auth;
pub mod workflow;

pub use access::{AccessPolicy, Actor, Operation, Owned, Ownership};
pub use auth::{AuthService, Claims, TokenKind, TokenPair};
pub use workflow::{LeaveWorkflow, Party, TimesheetWorkflow};
