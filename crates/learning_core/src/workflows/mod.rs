//! Request-level orchestration on top of the entity adapters.

pub mod identity;
pub mod progress;

use serde::Serialize;

use crate::domain::PublicUser;
use crate::ports::PortError;

pub use identity::{IdentityWorkflow, OneTimeCodePolicy};
pub use progress::ProgressWorkflow;

/// Every way a workflow can fail, as seen by the caller.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Email already in use")]
    Conflict,
    /// Deliberately the same for an unknown email and a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired OTP")]
    InvalidOrExpiredCode,
    #[error("User not found")]
    NotFound,
    #[error("Server error: {0}")]
    Server(String),
}

impl From<PortError> for WorkflowError {
    fn from(err: PortError) -> Self {
        WorkflowError::Server(err.to_string())
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// A successful authentication: the issued credential plus the public user shape.
#[derive(Debug, Clone, Serialize)]
pub struct Authenticated {
    pub token: String,
    pub user: PublicUser,
}
