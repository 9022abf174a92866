//! Tests for REST API components

#![cfg(test)]

use super::types::*;
use serde_json::json;
use universe_core::AnswerType;
use universe_llm::QuestionAnswer;

#[test]
fn test_generate_questions_request_camel_case() {
    let request: GenerateQuestionsRequest = serde_json::from_value(json!({
        "prompt": "A bot for my yoga studio",
        "projectId": "p1"
    }))
    .unwrap();

    assert_eq!(request.project_id.as_deref(), Some("p1"));
    assert!(request.context.is_none());
}

#[test]
fn test_generate_flow_request_defaults_answers() {
    let request: GenerateFlowRequest = serde_json::from_value(json!({
        "questions": [{"question": "What is your name?", "type": "text"}]
    }))
    .unwrap();

    assert_eq!(request.questions[0].answer_type, AnswerType::Text);
    assert!(request.answers.is_empty());
}

#[test]
fn test_question_input_variants() {
    let inputs: Vec<QuestionInput> =
        serde_json::from_value(json!(["Plain?", {"question": "Answered?", "answer": "yes"}]))
            .unwrap();
    let answers: Vec<QuestionAnswer> = inputs.into_iter().map(Into::into).collect();

    assert_eq!(answers[0].answer, None);
    assert_eq!(answers[1].answer.as_deref(), Some("yes"));
}

#[test]
fn test_create_project_request_category() {
    let request: CreateProjectRequest =
        serde_json::from_value(json!({"prompt": "Shop helper", "category": "ecommerce"})).unwrap();
    assert_eq!(
        request.category,
        Some(universe_core::ProjectCategory::Ecommerce)
    );

    let err = serde_json::from_value::<CreateProjectRequest>(json!({"category": "space"}));
    assert!(err.is_err());
}

#[test]
fn test_health_response_serialization() {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: "0.1.0".to_string(),
    };
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value, json!({"status": "healthy", "version": "0.1.0"}));
}

#[test]
fn test_message_response_serialization() {
    let response = MessageResponse {
        success: true,
        message: "done".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": true, "message": "done"})
    );
}
