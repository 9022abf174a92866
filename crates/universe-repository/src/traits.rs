//! Core trait definitions for the repository pattern
//!
//! [`ProjectStore`] is the storage seam: it knows how to persist projects and
//! flow versions atomically but nothing about ownership or validation, which
//! live in [`ProjectService`](crate::ProjectService).
//!
//! # Examples
//!
//! ```
//! use universe_core::{FlowDraft, Project};
//! use universe_repository::{MemoryStore, ProjectStore};
//!
//! # #[tokio::main]
//! # async fn main() -> universe_repository::RepositoryResult<()> {
//! let store = MemoryStore::new();
//! let project = Project::new("user-1", "A quiz bot for kids");
//! store.insert_project(&project, None).await?;
//!
//! // No flow yet: the first save is version 1
//! let flow = store.save_flow(&project.id, FlowDraft::default()).await?;
//! assert_eq!(flow.version, 1);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use universe_core::{Flow, FlowDraft, Project};

use crate::{FlowVersionSummary, RepositoryResult};

/// Persistence for projects and their versioned flows
///
/// # Implementation Notes
///
/// - `save_flow` is all-or-nothing: reading the latest version, writing the
///   next one and marking the project `in_progress` commit together
/// - One record per flow version; the highest version is the active one
/// - `delete_project` removes the project and every flow version together
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Store a new project, optionally with its seed flow
    async fn insert_project(&self, project: &Project, seed_flow: Option<&Flow>)
        -> RepositoryResult<()>;

    async fn get_project(&self, id: &str) -> RepositoryResult<Option<Project>>;

    /// Projects owned by `owner`, newest first
    async fn list_projects(&self, owner: &str) -> RepositoryResult<Vec<Project>>;

    /// Overwrite a project record
    async fn update_project(&self, project: &Project) -> RepositoryResult<()>;

    /// Append the next flow version built from `draft`.
    ///
    /// With an existing flow this is `latest.next_version(draft)`; otherwise
    /// `Flow::first_version`. The project's status becomes `in_progress`.
    async fn save_flow(&self, project_id: &str, draft: FlowDraft) -> RepositoryResult<Flow>;

    /// Highest version, if any
    async fn latest_flow(&self, project_id: &str) -> RepositoryResult<Option<Flow>>;

    /// Every stored version, oldest first
    async fn flow_versions(&self, project_id: &str) -> RepositoryResult<Vec<FlowVersionSummary>>;

    /// Delete the project and all of its flows; `false` if it did not exist
    async fn delete_project(&self, id: &str) -> RepositoryResult<bool>;
}
