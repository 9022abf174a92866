//! REST API type definitions
//!
//! Request and response types for the REST API endpoints.

use crate::auth::TokenVerifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use universe_core::{BotFiles, FlowConfiguration, FlowEdge, FlowNode, Flow, Project, ProjectCategory};
use universe_llm::{
    BotGenerator, BotGeneratorConfig, BotSummary, CandidateQuestion, FlowGenerator, FlowQuestion,
    QuestionAnswer, QuestionGenerator,
};
use universe_repository::{
    FlowVersionSummary, GenerationSession, InMemorySessionStore, ProjectService, SessionStore,
};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub projects: ProjectService,
    pub sessions: Arc<dyn SessionStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub questions: Arc<QuestionGenerator>,
    pub flows: Arc<FlowGenerator>,
    pub bots: Arc<BotGenerator>,
    /// Render internal error detail in responses
    pub dev_mode: bool,
}

impl AppState {
    /// State with deterministic generators, no bot provider and an in-memory
    /// session store
    pub fn new(projects: ProjectService, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            projects,
            sessions: Arc::new(InMemorySessionStore::default()),
            verifier,
            questions: Arc::new(QuestionGenerator::deterministic()),
            flows: Arc::new(FlowGenerator::deterministic()),
            bots: Arc::new(BotGenerator::new(None, BotGeneratorConfig::default())),
            dev_mode: false,
        }
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_question_generator(mut self, generator: QuestionGenerator) -> Self {
        self.questions = Arc::new(generator);
        self
    }

    pub fn with_flow_generator(mut self, generator: FlowGenerator) -> Self {
        self.flows = Arc::new(generator);
        self
    }

    pub fn with_bot_generator(mut self, generator: BotGenerator) -> Self {
        self.bots = Arc::new(generator);
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub context: Option<String>,
    /// Store the questions on this project's flow
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub success: bool,
    pub questions: Vec<CandidateQuestion>,
    pub prompt: String,
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateFlowRequest {
    pub questions: Vec<FlowQuestion>,
    /// Answers keyed by question text or by `question-{n}`
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFlowResponse {
    pub success: bool,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    pub flow_configuration: FlowConfiguration,
}

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub success: bool,
    pub flow: Flow,
}

#[derive(Debug, Serialize)]
pub struct FlowVersionsResponse {
    pub success: bool,
    pub versions: Vec<FlowVersionSummary>,
}

/// A follow-up question as submitted in the `questions` form field
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionInput {
    Text(String),
    Answered(QuestionAnswer),
}

impl From<QuestionInput> for QuestionAnswer {
    fn from(input: QuestionInput) -> Self {
        match input {
            QuestionInput::Text(question) => QuestionAnswer::new(question, None),
            QuestionInput::Answered(answered) => answered,
        }
    }
}

/// The `options` form field of `generate-bot`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotOptions {
    /// Name for the created project
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<ProjectCategory>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBotResponse {
    pub success: bool,
    pub project_id: String,
    pub session_id: String,
    pub bot_files: BotFiles,
    pub summary: BotSummary,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: GenerationSession,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<ProjectCategory>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub success: bool,
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub success: bool,
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
