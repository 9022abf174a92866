//! Error types for the repository layer

use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Project or flow does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Project exists but belongs to someone else
    #[error("Access denied to project: {project_id}")]
    Forbidden { project_id: String },

    /// Submitted flow breaks graph invariants or size limits
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Another save claimed the same version first
    #[error("Version conflict: project {project_id} already has version {version}")]
    Conflict { project_id: String, version: u32 },

    /// Database error (when database feature is enabled)
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Stored document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("Repository error: {0}")]
    Other(String),
}

impl RepositoryError {
    pub fn project_not_found(id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity: "Project",
            id: id.into(),
        }
    }

    pub fn flow_not_found(project_id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity: "Flow",
            id: project_id.into(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(err)
    }
}
