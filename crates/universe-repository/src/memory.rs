//! In-memory project store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use universe_core::{Flow, FlowDraft, Project, ProjectStatus};

use crate::{FlowVersionSummary, ProjectStore, RepositoryError, RepositoryResult};

#[derive(Default)]
struct State {
    projects: HashMap<String, Project>,
    /// Versions per project, ascending
    flows: HashMap<String, Vec<Flow>>,
}

/// Process-local store for tests and key-less development.
///
/// A single write lock spans each mutation, which makes `save_flow` atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(
        &self,
        project: &Project,
        seed_flow: Option<&Flow>,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if state.projects.contains_key(&project.id) {
            return Err(RepositoryError::Other(format!(
                "Project already exists: {}",
                project.id
            )));
        }
        state.projects.insert(project.id.clone(), project.clone());
        if let Some(flow) = seed_flow {
            state.flows.insert(project.id.clone(), vec![flow.clone()]);
        }
        Ok(())
    }

    async fn get_project(&self, id: &str) -> RepositoryResult<Option<Project>> {
        Ok(self.state.read().await.projects.get(id).cloned())
    }

    async fn list_projects(&self, owner: &str) -> RepositoryResult<Vec<Project>> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn update_project(&self, project: &Project) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        match state.projects.get_mut(&project.id) {
            Some(stored) => {
                *stored = project.clone();
                Ok(())
            }
            None => Err(RepositoryError::project_not_found(&project.id)),
        }
    }

    async fn save_flow(&self, project_id: &str, draft: FlowDraft) -> RepositoryResult<Flow> {
        let mut state = self.state.write().await;

        let project = state
            .projects
            .get_mut(project_id)
            .ok_or_else(|| RepositoryError::project_not_found(project_id))?;
        project.status = ProjectStatus::InProgress;
        project.updated_at = Utc::now();

        let versions = state.flows.entry(project_id.to_string()).or_default();
        let flow = match versions.last() {
            Some(latest) => latest.next_version(draft),
            None => Flow::first_version(project_id, draft),
        };
        versions.push(flow.clone());

        debug!(project_id, version = flow.version, "flow saved");
        Ok(flow)
    }

    async fn latest_flow(&self, project_id: &str) -> RepositoryResult<Option<Flow>> {
        let state = self.state.read().await;
        Ok(state
            .flows
            .get(project_id)
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn flow_versions(&self, project_id: &str) -> RepositoryResult<Vec<FlowVersionSummary>> {
        let state = self.state.read().await;
        Ok(state
            .flows
            .get(project_id)
            .map(|versions| versions.iter().map(FlowVersionSummary::from).collect())
            .unwrap_or_default())
    }

    async fn delete_project(&self, id: &str) -> RepositoryResult<bool> {
        let mut state = self.state.write().await;
        state.flows.remove(id);
        Ok(state.projects.remove(id).is_some())
    }
}
