//! Ownership-checked project and flow operations
//!
//! [`ProjectService`] sits between the HTTP layer and a [`ProjectStore`]. Every
//! operation that touches an existing project first resolves it and checks the
//! actor owns it, so a foreign or missing project is rejected before anything
//! is written.

use std::sync::Arc;
use tracing::{debug, info, warn};
use universe_core::{
    BotFiles, Flow, FlowDraft, GeneratedQuestion, Project, ProjectCategory, ProjectStatus,
};

use crate::{FlowVersionSummary, ProjectStore, RepositoryError, RepositoryResult};

/// Maps an initial prompt to a project category
pub type Classifier = Arc<dyn Fn(&str) -> ProjectCategory + Send + Sync>;

/// Fields accepted when creating a project
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub prompt: String,
    pub name: Option<String>,
    pub category: Option<ProjectCategory>,
}

impl NewProject {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: ProjectCategory) -> Self {
        self.category = Some(category);
        self
    }
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
    classifier: Classifier,
}

impl ProjectService {
    /// Service over `store`. Projects created without a category are
    /// `generic` until a classifier is installed.
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            store,
            classifier: Arc::new(|_| ProjectCategory::Generic),
        }
    }

    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&str) -> ProjectCategory + Send + Sync + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn store(&self) -> &Arc<dyn ProjectStore> {
        &self.store
    }

    /// Resolve `project_id` and require `actor_id` to own it
    async fn owned_project(&self, project_id: &str, actor_id: &str) -> RepositoryResult<Project> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| RepositoryError::project_not_found(project_id))?;

        if !project.is_owned_by(actor_id) {
            warn!(project_id, actor_id, "access to foreign project denied");
            return Err(RepositoryError::Forbidden {
                project_id: project_id.to_string(),
            });
        }
        Ok(project)
    }

    fn build_project(&self, owner: &str, request: NewProject) -> RepositoryResult<Project> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(RepositoryError::Validation(vec![
                "prompt is required".to_string(),
            ]));
        }

        let category = request
            .category
            .unwrap_or_else(|| (self.classifier)(prompt));
        let mut project = Project::new(owner, prompt).with_category(category);
        if let Some(name) = request.name.filter(|n| !n.trim().is_empty()) {
            project = project.with_name(name.trim());
        }
        Ok(project)
    }

    /// Insert the project and its version-1 seed flow in one store write
    async fn insert_with_seed(&self, project: &Project) -> RepositoryResult<()> {
        let seed = Flow::seed(&project.id, &project.initial_prompt);
        self.store.insert_project(project, Some(&seed)).await
    }

    /// Create a draft project together with its version-1 seed flow
    pub async fn create_project(&self, owner: &str, request: NewProject) -> RepositoryResult<Project> {
        let project = self.build_project(owner, request)?;
        self.insert_with_seed(&project).await?;

        info!(project_id = %project.id, owner, category = %project.category, "project created");
        Ok(project)
    }

    /// Create a `completed` project that already carries generated bot
    /// files. Nothing is stored unless the whole insert succeeds.
    pub async fn create_generated_project(
        &self,
        owner: &str,
        request: NewProject,
        files: BotFiles,
        metadata: Option<serde_json::Value>,
    ) -> RepositoryResult<Project> {
        let mut project = self.build_project(owner, request)?;
        project.bot_files = Some(files);
        project.metadata = metadata;
        project.set_status(ProjectStatus::Completed);
        self.insert_with_seed(&project).await?;

        info!(project_id = %project.id, owner, "generated project created");
        Ok(project)
    }

    pub async fn get_project(&self, project_id: &str, actor_id: &str) -> RepositoryResult<Project> {
        self.owned_project(project_id, actor_id).await
    }

    pub async fn list_projects(&self, owner: &str) -> RepositoryResult<Vec<Project>> {
        self.store.list_projects(owner).await
    }

    /// Validate `draft` and append it as the project's next flow version
    pub async fn save_flow(
        &self,
        project_id: &str,
        actor_id: &str,
        draft: FlowDraft,
    ) -> RepositoryResult<Flow> {
        self.owned_project(project_id, actor_id).await?;

        let report = draft.validate();
        if !report.is_valid {
            debug!(project_id, errors = ?report.errors, "flow rejected");
            return Err(RepositoryError::Validation(report.errors));
        }

        let flow = self.store.save_flow(project_id, draft).await?;
        info!(project_id, version = flow.version, "flow version stored");
        Ok(flow)
    }

    /// Highest stored version
    pub async fn get_latest_flow(&self, project_id: &str, actor_id: &str) -> RepositoryResult<Flow> {
        self.owned_project(project_id, actor_id).await?;
        self.store
            .latest_flow(project_id)
            .await?
            .ok_or_else(|| RepositoryError::flow_not_found(project_id))
    }

    pub async fn list_flow_versions(
        &self,
        project_id: &str,
        actor_id: &str,
    ) -> RepositoryResult<Vec<FlowVersionSummary>> {
        self.owned_project(project_id, actor_id).await?;
        self.store.flow_versions(project_id).await
    }

    /// Store generated questions as a new flow version, keeping the current
    /// graph. Graph validation is skipped: the graph itself is unchanged.
    pub async fn record_questions(
        &self,
        project_id: &str,
        actor_id: &str,
        questions: Vec<GeneratedQuestion>,
    ) -> RepositoryResult<Flow> {
        self.owned_project(project_id, actor_id).await?;

        let draft = match self.store.latest_flow(project_id).await? {
            Some(latest) => latest.to_draft().with_questions(questions),
            None => FlowDraft::default().with_questions(questions),
        };
        self.store.save_flow(project_id, draft).await
    }

    /// Attach generated bot files and mark the project `completed`
    pub async fn attach_bot_files(
        &self,
        project_id: &str,
        actor_id: &str,
        files: BotFiles,
        metadata: Option<serde_json::Value>,
    ) -> RepositoryResult<Project> {
        let mut project = self.owned_project(project_id, actor_id).await?;

        project.bot_files = Some(files);
        if metadata.is_some() {
            project.metadata = metadata;
        }
        project.set_status(ProjectStatus::Completed);
        self.store.update_project(&project).await?;

        info!(project_id, "bot files attached");
        Ok(project)
    }

    /// Remove the project and every flow version
    pub async fn delete_project(&self, project_id: &str, actor_id: &str) -> RepositoryResult<()> {
        self.owned_project(project_id, actor_id).await?;
        if !self.store.delete_project(project_id).await? {
            return Err(RepositoryError::project_not_found(project_id));
        }
        info!(project_id, "project deleted");
        Ok(())
    }
}
