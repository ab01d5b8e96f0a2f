use thiserror::Error;

/// Failures surfaced by the tree engine and the workspace store.
///
/// Everything except [`WorkspaceError::Storage`] is deterministic given the
/// tree state, so callers should never retry them.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T, E = WorkspaceError> = std::result::Result<T, E>;

impl WorkspaceError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        WorkspaceError::PathNotFound(path.into())
    }

    pub(crate) fn conflict(path: impl Into<String>) -> Self {
        WorkspaceError::Conflict(path.into())
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        WorkspaceError::InvalidPath(reason.into())
    }
}
