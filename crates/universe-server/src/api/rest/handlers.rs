//! API endpoint handlers
//!
//! HTTP request handlers for all REST API endpoints.

use super::extractors::{BotForm, JsonExtractor};
use super::types::*;
use crate::auth::AuthUser;
use crate::error::ServerError;
use axum::{
    extract::{multipart::{Multipart, MultipartRejection}, Path, State},
    http::StatusCode,
    Json,
};
use universe_core::{FlowDraft, GeneratedQuestion};
use universe_llm::{BotOutcome, GenerationObserver, GenerationStage};
use universe_repository::{GenerationSession, NewProject, SessionStore};
use tracing::{info, warn};

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Clarifying questions for a chatbot idea
pub(super) async fn generate_questions(
    State(state): State<AppState>,
    user: AuthUser,
    JsonExtractor(payload): JsonExtractor<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, ServerError> {
    let prompt = payload.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ServerError::Validation("prompt is required".to_string()));
    }

    let questions = state
        .questions
        .generate(&prompt, payload.context.as_deref())
        .await;

    if let Some(project_id) = payload.project_id.as_deref().filter(|id| !id.is_empty()) {
        let generated: Vec<GeneratedQuestion> =
            questions.iter().cloned().map(GeneratedQuestion::from).collect();
        let flow = state
            .projects
            .record_questions(project_id, &user.id, generated)
            .await?;
        info!(project_id, version = flow.version, "questions stored on flow");
    }

    Ok(Json(GenerateQuestionsResponse {
        success: true,
        questions,
        prompt,
        context: payload.context,
    }))
}

/// Store a new flow version
pub(super) async fn save_flow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
    JsonExtractor(draft): JsonExtractor<FlowDraft>,
) -> Result<Json<FlowResponse>, ServerError> {
    let flow = state.projects.save_flow(&project_id, &user.id, draft).await?;
    Ok(Json(FlowResponse {
        success: true,
        flow,
    }))
}

pub(super) async fn get_flow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<FlowResponse>, ServerError> {
    let flow = state.projects.get_latest_flow(&project_id, &user.id).await?;
    Ok(Json(FlowResponse {
        success: true,
        flow,
    }))
}

pub(super) async fn list_flow_versions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<FlowVersionsResponse>, ServerError> {
    let versions = state
        .projects
        .list_flow_versions(&project_id, &user.id)
        .await?;
    Ok(Json(FlowVersionsResponse {
        success: true,
        versions,
    }))
}

/// Build a flow graph from answered questions. Nothing is stored.
pub(super) async fn generate_flow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
    JsonExtractor(payload): JsonExtractor<GenerateFlowRequest>,
) -> Result<Json<GenerateFlowResponse>, ServerError> {
    let project = state.projects.get_project(&project_id, &user.id).await?;

    let generated = state
        .flows
        .generate(&payload.questions, &payload.answers, &project.initial_prompt)
        .await;

    Ok(Json(GenerateFlowResponse {
        success: true,
        nodes: generated.nodes,
        edges: generated.edges,
        flow_configuration: generated.flow_configuration,
    }))
}

/// Publishes pipeline stages to a generation session
struct SessionProgress<'a> {
    sessions: &'a dyn SessionStore,
    session_id: &'a str,
}

impl GenerationObserver for SessionProgress<'_> {
    fn stage(&self, stage: GenerationStage) {
        self.sessions
            .update(self.session_id, &mut |session| session.enter_stage(stage.as_str()));
    }
}

/// Run the bot pipeline and store the result as a new completed project.
/// The session is registered before generation starts.
pub(super) async fn generate_bot(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateBotResponse>, ServerError> {
    let multipart = multipart.map_err(|e| ServerError::Validation(e.body_text()))?;
    let BotForm {
        request,
        options,
        session_id,
    } = BotForm::read(multipart).await?;

    let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    if state.sessions.get(&session_id).is_some() {
        return Err(ServerError::Validation(format!(
            "sessionId '{}' is already in use",
            session_id
        )));
    }
    state
        .sessions
        .put(GenerationSession::new(&session_id, &user.id));

    let prompt = request.prompt.trim().to_string();
    let observer = SessionProgress {
        sessions: state.sessions.as_ref(),
        session_id: &session_id,
    };

    let bot = match state.bots.run_observed(request, &observer).await {
        BotOutcome::Success(bot) => bot,
        BotOutcome::Failure(err) => {
            state
                .sessions
                .update(&session_id, &mut |session| session.fail(err.code.as_str()));
            return Err(ServerError::Bot(err));
        }
    };

    let mut new_project = NewProject::new(prompt);
    if let Some(name) = options.name {
        new_project = new_project.with_name(name);
    }
    if let Some(category) = options.category {
        new_project = new_project.with_category(category);
    }

    let metadata = serde_json::to_value(&bot.summary).ok();
    let stored = state
        .projects
        .create_generated_project(&user.id, new_project, bot.files.clone(), metadata)
        .await;

    let project = match stored {
        Ok(project) => project,
        Err(err) => {
            warn!(session_id = %session_id, error = %err, "generated bot could not be stored");
            state
                .sessions
                .update(&session_id, &mut |session| session.fail("STORAGE_FAILED"));
            return Err(err.into());
        }
    };

    state
        .sessions
        .update(&session_id, &mut |session| session.complete(&project.id));
    info!(
        project_id = %project.id,
        session_id = %session_id,
        file_count = bot.summary.file_count,
        "bot generated"
    );

    Ok(Json(GenerateBotResponse {
        success: true,
        project_id: project.id,
        session_id,
        bot_files: bot.files,
        summary: bot.summary,
    }))
}

pub(super) async fn generation_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    // Foreign sessions are reported as missing
    let session = state
        .sessions
        .get(&session_id)
        .filter(|session| session.owner == user.id)
        .ok_or_else(|| ServerError::NotFound(format!("Session not found: {}", session_id)))?;

    Ok(Json(SessionResponse {
        success: true,
        session,
    }))
}

pub(super) async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    JsonExtractor(payload): JsonExtractor<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ServerError> {
    let mut request = NewProject::new(payload.prompt);
    if let Some(name) = payload.name {
        request = request.with_name(name);
    }
    if let Some(category) = payload.category {
        request = request.with_category(category);
    }

    let project = state.projects.create_project(&user.id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            success: true,
            project,
        }),
    ))
}

pub(super) async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProjectsResponse>, ServerError> {
    let projects = state.projects.list_projects(&user.id).await?;
    Ok(Json(ProjectsResponse {
        success: true,
        projects,
    }))
}

pub(super) async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ServerError> {
    let project = state.projects.get_project(&project_id, &user.id).await?;
    Ok(Json(ProjectResponse {
        success: true,
        project,
    }))
}

pub(super) async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    state.projects.delete_project(&project_id, &user.id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Project and all flow versions deleted".to_string(),
    }))
}
