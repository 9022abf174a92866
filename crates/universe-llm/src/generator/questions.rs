//! Clarifying questions for a chatbot idea

use crate::client::LLMClient;
use crate::generator::json_extractor::extract_json_array;
use crate::generator::prompt_templates::{render, QUESTION_GENERATION_PROMPT};
use crate::generator::GeneratorConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use universe_core::flow::question::{MAX_PRIORITY, MIN_PRIORITY};
use universe_core::{AnswerType, GeneratedQuestion, ProjectCategory};

/// Questions returned by the template path
pub const MAX_TEMPLATE_QUESTIONS: usize = 4;
/// Questions kept from a model answer
pub const MAX_LLM_QUESTIONS: usize = 6;

/// A question proposed to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuestion {
    pub question: String,
    #[serde(rename = "type", default)]
    pub answer_type: AnswerType,
    pub priority: u8,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl CandidateQuestion {
    fn new(question: &str, answer_type: AnswerType, priority: u8, choices: &[&str]) -> Self {
        Self {
            context: context_for(question),
            question: question.to_string(),
            answer_type,
            priority,
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl From<CandidateQuestion> for GeneratedQuestion {
    fn from(candidate: CandidateQuestion) -> Self {
        GeneratedQuestion::new(candidate.question, candidate.context, candidate.priority)
    }
}

fn context_for(question: &str) -> String {
    let topic = question.trim().trim_end_matches('?').to_lowercase();
    format!("Helps tailor the chatbot: {}", topic)
}

static CATEGORY_PATTERNS: Lazy<Vec<(ProjectCategory, Regex)>> = Lazy::new(|| {
    [
        (
            ProjectCategory::Education,
            r"(?i)\b(educat\w*|learn\w*|teach\w*|course|student|school|tutor\w*|quiz\w*|lesson)",
        ),
        (
            ProjectCategory::Ecommerce,
            r"(?i)\b(e-?commerce|shop\w*|store|products?|cart|orders?|retail|checkout)\b",
        ),
        (
            ProjectCategory::Healthcare,
            r"(?i)\b(health\w*|medic\w*|doctor|patients?|clinic|hospital|symptoms?|appointments?)",
        ),
        (
            ProjectCategory::Support,
            r"(?i)\b(support|help ?desk|customer service|faq|tickets?|complain\w*|troubleshoot\w*)",
        ),
    ]
    .into_iter()
    .filter_map(|(category, pattern)| Regex::new(pattern).ok().map(|re| (category, re)))
    .collect()
});

/// Category of a chatbot idea; the first matching category wins.
pub fn classify(prompt: &str) -> ProjectCategory {
    CATEGORY_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(prompt))
        .map(|(category, _)| *category)
        .unwrap_or(ProjectCategory::Generic)
}

fn templates(category: ProjectCategory) -> Vec<CandidateQuestion> {
    use AnswerType::*;
    let q = CandidateQuestion::new;
    match category {
        ProjectCategory::Education => vec![
            q("What subject or topic will the chatbot teach?", Text, 5, &[]),
            q(
                "What age group or level are the learners?",
                Choice,
                5,
                &["Children", "High school", "University", "Professionals"],
            ),
            q(
                "How should lessons be delivered?",
                Choice,
                4,
                &["Explanations", "Quizzes", "Step-by-step exercises"],
            ),
            q("Should the chatbot grade answers and give feedback?", Boolean, 3, &[]),
            q("Do you need to track learner progress over time?", Boolean, 2, &[]),
        ],
        ProjectCategory::Ecommerce => vec![
            q("What kinds of products do you sell?", Text, 5, &[]),
            q("Should the chatbot help customers track their orders?", Boolean, 4, &[]),
            q(
                "Which payment methods should it mention?",
                Choice,
                4,
                &["Card", "PayPal", "Bank transfer", "Cash on delivery"],
            ),
            q("What is your return and refund policy?", Text, 3, &[]),
            q("Should it recommend products based on preferences?", Boolean, 2, &[]),
        ],
        ProjectCategory::Healthcare => vec![
            q(
                "What type of healthcare services do you provide?",
                Choice,
                5,
                &["General practice", "Dental", "Mental health", "Specialist clinic"],
            ),
            q("Should patients be able to book appointments?", Boolean, 5, &[]),
            q("How should the chatbot respond to emergencies?", Text, 4, &[]),
            q("What patient information may the chatbot collect?", Text, 4, &[]),
            q("Do you accept insurance, and which providers?", Text, 2, &[]),
        ],
        ProjectCategory::Support => vec![
            q(
                "What type of support will the chatbot provide?",
                Choice,
                5,
                &["Technical", "Billing", "General enquiries", "Reservations"],
            ),
            q(
                "Should the chatbot escalate to a human agent when it cannot help?",
                Boolean,
                4,
                &[],
            ),
            q("What are your business hours?", Text, 3, &[]),
            q("Which questions do customers ask most often?", Text, 3, &[]),
            q("Should conversations be logged for review?", Boolean, 2, &[]),
        ],
        ProjectCategory::Generic => vec![
            q("What is the main purpose of your chatbot?", Text, 5, &[]),
            q("Who is the target audience?", Text, 4, &[]),
            q(
                "What tone should the chatbot use?",
                Choice,
                3,
                &["Friendly", "Professional", "Playful"],
            ),
            q("What information should the chatbot collect from users?", Text, 3, &[]),
            q("Does it need to integrate with other services?", Text, 2, &[]),
        ],
    }
}

/// Top questions for the prompt's category, highest priority first
pub fn template_questions(prompt: &str) -> Vec<CandidateQuestion> {
    let mut questions = templates(classify(prompt));
    // sort_by is stable: equal priorities keep template order
    questions.sort_by(|a, b| b.priority.cmp(&a.priority));
    questions.truncate(MAX_TEMPLATE_QUESTIONS);
    questions
}

/// Loose shape of a model-proposed question
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question: String,
    #[serde(rename = "type", default)]
    answer_type: Option<String>,
    #[serde(default)]
    priority: Option<serde_json::Value>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    choices: Vec<String>,
}

impl RawQuestion {
    fn into_candidate(self) -> Option<CandidateQuestion> {
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return None;
        }
        let answer_type = self
            .answer_type
            .and_then(|t| serde_json::from_value(serde_json::Value::String(t.to_lowercase())).ok())
            .unwrap_or_default();
        let priority = self
            .priority
            .and_then(|p| p.as_u64().or_else(|| p.as_str()?.parse().ok()))
            .map(|p| p.clamp(MIN_PRIORITY as u64, MAX_PRIORITY as u64) as u8)
            .unwrap_or(3);
        let context = self
            .context
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| context_for(&question));
        Some(CandidateQuestion {
            question,
            answer_type,
            priority,
            context,
            choices: self.choices,
        })
    }
}

fn parse_candidates(content: &str) -> crate::error::Result<Vec<CandidateQuestion>> {
    let value = extract_json_array(content)?;
    let raw: Vec<RawQuestion> = serde_json::from_value(value)?;
    let mut questions: Vec<_> = raw.into_iter().filter_map(RawQuestion::into_candidate).collect();
    questions.sort_by(|a, b| b.priority.cmp(&a.priority));
    questions.truncate(MAX_LLM_QUESTIONS);
    Ok(questions)
}

/// Clarifying-question generator
pub struct QuestionGenerator {
    client: Option<Arc<dyn LLMClient>>,
    config: GeneratorConfig,
}

impl QuestionGenerator {
    /// Create a new question generator backed by a model
    pub fn new(client: Arc<dyn LLMClient>, config: GeneratorConfig) -> Self {
        Self {
            client: Some(client),
            config,
        }
    }

    /// Templates only; never calls a model
    pub fn deterministic() -> Self {
        Self {
            client: None,
            config: GeneratorConfig::default(),
        }
    }

    /// Model-backed when a client is given, templates otherwise
    pub fn from_optional(client: Option<Arc<dyn LLMClient>>, config: GeneratorConfig) -> Self {
        Self { client, config }
    }

    /// Generate questions for a chatbot idea. Never fails.
    pub async fn generate(&self, prompt: &str, context: Option<&str>) -> Vec<CandidateQuestion> {
        let Some(client) = &self.client else {
            return template_questions(prompt);
        };

        let text = render(
            QUESTION_GENERATION_PROMPT,
            &[("prompt", prompt), ("context", context.unwrap_or("None"))],
        );

        let reason = match client.call(self.config.request(text)).await {
            Ok(response) => match parse_candidates(&response.content) {
                Ok(questions) if !questions.is_empty() => {
                    debug!(count = questions.len(), model = %response.model, "model questions accepted");
                    return questions;
                }
                Ok(_) => "model returned no questions".to_string(),
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };

        warn!(fallback = "questions", reason = %reason, "using template questions");
        template_questions(prompt)
    }
}
