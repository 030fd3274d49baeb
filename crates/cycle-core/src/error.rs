use thiserror::Error;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("not initialized: run 'cycles init'")]
    NotInitialized,

    #[error("order cycle not found: {0}")]
    OrderCycleNotFound(i64),

    #[error("enterprise not found: {0}")]
    EnterpriseNotFound(i64),

    #[error("user not found: {0}")]
    UserNotFound(i64),

    #[error("schedule not found: {0}")]
    ScheduleNotFound(i64),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    #[error("{}", crate::messages::NO_PERMISSION_TO_COORDINATE)]
    NoCoordinatorPermission,

    #[error("{}", crate::messages::NO_PERMISSION_TO_CREATE)]
    CoordinatorNotPermitted(i64),

    #[error("{}", crate::messages::BULK_UPDATE_NO_DATA)]
    NoBulkData,

    #[error("invalid listing role: {0}")]
    InvalidRole(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CycleError {
    /// Messages to show the caller verbatim, one per line.
    pub fn full_messages(&self) -> Vec<String> {
        match self {
            CycleError::ValidationFailed(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

pub type Result<T> = std::result::Result<T, CycleError>;
