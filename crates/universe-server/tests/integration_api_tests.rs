//! Integration tests for REST API endpoints
//!
//! These tests drive the real router over an in-memory store.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tokio::sync::Semaphore;
use universe_llm::{
    BotGenerator, BotGeneratorConfig, LLMClient, LLMRequest, LLMResponse, MockProvider,
    MockReply, ModelChain,
};
use universe_repository::{MemoryStore, ProjectService};
use universe_server::api::{create_router, rest::AppState};
use universe_server::auth::JwtVerifier;

const SECRET: &str = "integration-secret";
const BOUNDARY: &str = "universe-test-boundary";

struct TestApp {
    router: Router,
    verifier: Arc<JwtVerifier>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_state(|state| state)
    }

    fn with_state(customize: impl FnOnce(AppState) -> AppState) -> Self {
        let verifier = Arc::new(JwtVerifier::new(SECRET));
        let projects = ProjectService::new(Arc::new(MemoryStore::new()))
            .with_classifier(universe_llm::classify);
        let state = customize(AppState::new(projects, verifier.clone()));
        Self {
            router: create_router(state),
            verifier,
        }
    }

    fn token(&self, user: &str) -> String {
        self.verifier.issue(user, Duration::hours(1)).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn json(&self, method: Method, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn get(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn create_project(&self, user: &str, prompt: &str) -> String {
        let (status, body) = self
            .json(Method::POST, "/api/projects", user, json!({"prompt": prompt}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["project"]["id"].as_str().unwrap().to_string()
    }
}

fn valid_flow() -> Value {
    json!({
        "nodes": [
            {"id": "start-1", "type": "start", "data": {"label": "Start"}, "position": {"x": 250.0, "y": 50.0}},
            {"id": "question-1", "type": "question", "data": {"label": "Name", "question": "What is your name?"}, "position": {"x": 250.0, "y": 200.0}},
            {"id": "end-1", "type": "end", "data": {"label": "End"}, "position": {"x": 250.0, "y": 350.0}}
        ],
        "edges": [
            {"id": "e1", "source": "start-1", "target": "question-1"},
            {"id": "e2", "source": "question-1", "target": "end-1"}
        ]
    })
}

fn multipart_body(fields: &[(&str, &str)]) -> Body {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    Body::from(body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/projects")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/projects")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_list_projects() {
    let app = TestApp::new();
    let (status, body) = app
        .json(
            Method::POST,
            "/api/projects",
            "alice",
            json!({"prompt": "I need a customer support bot for my restaurant"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project"]["category"], "support");
    assert_eq!(body["project"]["status"], "draft");

    let (_, listed) = app.get("/api/projects", "alice").await;
    assert_eq!(listed["projects"].as_array().unwrap().len(), 1);

    let (_, other) = app.get("/api/projects", "bob").await;
    assert!(other["projects"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/prompts/flow/does-not-exist", "alice").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_foreign_project_is_forbidden() {
    let app = TestApp::new();
    let project_id = app.create_project("alice", "Quiz bot for biology").await;

    let (status, _) = app
        .get(&format!("/api/projects/{}", project_id), "mallory")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/api/prompts/save-flow/{}", project_id),
            "mallory",
            valid_flow(),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing was written
    let (_, versions) = app
        .get(&format!("/api/prompts/flow/{}/versions", project_id), "alice")
        .await;
    assert_eq!(versions["versions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_graph_is_bad_request() {
    let app = TestApp::new();
    let project_id = app.create_project("alice", "Survey bot").await;

    let mut flow = valid_flow();
    flow["edges"]
        .as_array_mut()
        .unwrap()
        .push(json!({"id": "e3", "source": "question-1", "target": "ghost"}));

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/prompts/save-flow/{}", project_id),
            "alice",
            flow,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let details = body["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d.as_str().unwrap().contains("ghost")));
    // Detail is withheld outside dev mode
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_saves_increment_version() {
    let app = TestApp::new();
    let project_id = app.create_project("alice", "Event RSVP bot").await;
    let uri = format!("/api/prompts/save-flow/{}", project_id);

    let (status, first) = app.json(Method::POST, &uri, "alice", valid_flow()).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = app.json(Method::POST, &uri, "alice", valid_flow()).await;

    let v1 = first["flow"]["version"].as_u64().unwrap();
    let v2 = second["flow"]["version"].as_u64().unwrap();
    assert_eq!(v2, v1 + 1);

    let (_, latest) = app
        .get(&format!("/api/prompts/flow/{}", project_id), "alice")
        .await;
    assert_eq!(latest["flow"]["version"].as_u64(), Some(v2));
    assert_eq!(latest["flow"]["flowConfiguration"]["metadata"]["nodeCount"], 3);

    let (_, project) = app
        .get(&format!("/api/projects/{}", project_id), "alice")
        .await;
    assert_eq!(project["project"]["status"], "in_progress");
}

#[tokio::test]
async fn test_generate_questions_stores_on_project() {
    let app = TestApp::new();
    let project_id = app.create_project("alice", "Support bot").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/prompts/generate-questions",
            "alice",
            json!({
                "prompt": "I need a customer support bot for my restaurant",
                "projectId": project_id
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 4);

    let (_, latest) = app
        .get(&format!("/api/prompts/flow/{}", project_id), "alice")
        .await;
    assert_eq!(latest["flow"]["generatedQuestions"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_generate_questions_requires_prompt() {
    let app = TestApp::new();
    let (status, body) = app
        .json(
            Method::POST,
            "/api/prompts/generate-questions",
            "alice",
            json!({"prompt": "   "}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "prompt is required");
}

#[tokio::test]
async fn test_generate_flow_layout() {
    let app = TestApp::new();
    let project_id = app.create_project("alice", "Help users").await;

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/prompts/generate-flow/{}", project_id),
            "alice",
            json!({"questions": [{"question": "What is your name?", "type": "text"}]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["start-1", "question-1", "condition-1", "action-1", "end-1"]);
    assert_eq!(body["edges"].as_array().unwrap().len(), 4);
    assert_eq!(
        body["flowConfiguration"]["variables"],
        json!([{"name": "response_1", "type": "text", "defaultValue": ""}])
    );
}

#[tokio::test]
async fn test_delete_project() {
    let app = TestApp::new();
    let project_id = app.create_project("alice", "Temporary bot").await;
    let uri = format!("/api/projects/{}", project_id);

    let request = |user: &str| {
        Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", app.token(user)))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = app.send(request("mallory")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(request("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.get(&uri, "alice").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_bot_without_provider_is_missing_api_key() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/prompts/generate-bot")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token("alice")))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(multipart_body(&[(
            "prompt",
            "A friendly FAQ assistant for a bakery",
        )]))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_API_KEY");
}

#[tokio::test]
async fn test_generate_bot_creates_completed_project() {
    let mock = Arc::new(code_provider());
    let chain = ModelChain::new(mock, vec!["m1".to_string()], vec![]);
    let app = TestApp::with_state(|state| {
        state.with_bot_generator(BotGenerator::new(Some(chain), BotGeneratorConfig::default()))
    });

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/prompts/generate-bot")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token("alice")))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(multipart_body(&[
            ("prompt", "A friendly FAQ assistant for a bakery"),
            ("questions", r#"[{"question": "Opening hours?", "answer": "7am-3pm"}]"#),
            ("trainingText", "We bake sourdough daily."),
            ("options", r#"{"name": "Bakery FAQ"}"#),
        ]))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["botFiles"]["backend"]["server.js"]
        .as_str()
        .unwrap()
        .starts_with("const express"));
    assert_eq!(body["summary"]["modelsUsed"]["frontend"], "m1");

    let project_id = body["projectId"].as_str().unwrap();
    let (_, project) = app
        .get(&format!("/api/projects/{}", project_id), "alice")
        .await;
    assert_eq!(project["project"]["status"], "completed");
    assert_eq!(project["project"]["name"], "Bakery FAQ");

    let session_id = body["sessionId"].as_str().unwrap();
    let (status, session) = app
        .get(&format!("/api/prompts/generation-status/{}", session_id), "alice")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["session"]["status"], "completed");
    assert_eq!(session["session"]["projectId"], project_id);

    // Sessions are private to their owner
    let (status, _) = app
        .get(&format!("/api/prompts/generation-status/{}", session_id), "bob")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

const BACKEND: &str = "```javascript\nconst express = require('express');\nconst app = express();\napp.listen(3001);\n```";
const FRONTEND: &str = "```jsx\nimport React, { useState } from 'react';\nexport default function App() { return null; }\n```";

fn code_provider() -> MockProvider {
    MockProvider::new()
        .when_prompt_contains("Write the backend", MockReply::Text(BACKEND.into()))
        .when_prompt_contains("Write the frontend", MockReply::Text(FRONTEND.into()))
}

/// Holds every call until a permit is released
struct GatedClient {
    gate: Arc<Semaphore>,
    inner: MockProvider,
}

#[async_trait]
impl LLMClient for GatedClient {
    async fn call(&self, request: LLMRequest) -> universe_llm::Result<LLMResponse> {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.inner.call(request).await
    }

    fn name(&self) -> &str {
        "gated"
    }
}

fn bot_request(app: &TestApp, user: &str, fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/prompts/generate-bot")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(user)))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(multipart_body(fields))
        .unwrap()
}

#[tokio::test]
async fn test_generation_status_is_visible_while_running() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient {
        gate: gate.clone(),
        inner: code_provider(),
    });
    let chain = ModelChain::new(client, vec!["m1".to_string()], vec![]);
    let app = TestApp::with_state(|state| {
        state.with_bot_generator(BotGenerator::new(Some(chain), BotGeneratorConfig::default()))
    });

    let request = bot_request(
        &app,
        "alice",
        &[
            ("prompt", "A friendly FAQ assistant for a bakery"),
            ("questions", r#"["Opening hours?"]"#),
            ("sessionId", "bakery-run-1"),
        ],
    );
    let router = app.router.clone();
    let running = tokio::spawn(async move { router.oneshot(request).await.unwrap() });

    let mut seen = Value::Null;
    for _ in 0..200 {
        let (status, body) = app
            .get("/api/prompts/generation-status/bakery-run-1", "alice")
            .await;
        if status == StatusCode::OK && body["session"]["stage"] == "code" {
            seen = body;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(seen["session"]["status"], "running");

    gate.add_permits(2);
    let response = running.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, done) = app
        .get("/api/prompts/generation-status/bakery-run-1", "alice")
        .await;
    assert_eq!(done["session"]["status"], "completed");
}

#[tokio::test]
async fn test_reused_session_id_is_rejected() {
    let chain = ModelChain::new(Arc::new(code_provider()), vec!["m1".to_string()], vec![]);
    let app = TestApp::with_state(|state| {
        state.with_bot_generator(BotGenerator::new(Some(chain), BotGeneratorConfig::default()))
    });
    let fields = [
        ("prompt", "A friendly FAQ assistant for a bakery"),
        ("questions", r#"["Opening hours?"]"#),
        ("sessionId", "bakery-run-2"),
    ];

    let (status, body) = app.send(bot_request(&app, "alice", &fields)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], "bakery-run-2");

    let (status, _) = app.send(bot_request(&app, "alice", &fields)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_not_found_route() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/unknown")
        .body(Body::empty())
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
