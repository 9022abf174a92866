//! Conversational flow generation from answered questions

use crate::client::LLMClient;
use crate::generator::json_extractor::extract_json_object;
use crate::generator::prompt_templates::{render, FLOW_GENERATION_PROMPT};
use crate::generator::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use universe_core::flow::validation::MAX_LABEL_LEN;
use universe_core::{
    AnswerType, FlowConfiguration, FlowDraft, FlowEdge, FlowNode, FlowVariable, NodeData,
    NodeKind, Position,
};

/// Column every generated node is placed in
pub const LAYOUT_X: f64 = 250.0;
/// Row of the start node
pub const LAYOUT_TOP: f64 = 50.0;
/// Vertical distance between consecutive nodes
pub const LAYOUT_STEP: f64 = 150.0;

/// A question to lay out as a node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowQuestion {
    pub question: String,
    #[serde(rename = "type", default)]
    pub answer_type: AnswerType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// Recorded answer, if the question carries its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl FlowQuestion {
    pub fn new(question: impl Into<String>, answer_type: AnswerType) -> Self {
        Self {
            question: question.into(),
            answer_type,
            ..Default::default()
        }
    }
}

/// A generated graph ready to be saved as a flow draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFlow {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    pub flow_configuration: FlowConfiguration,
}

impl GeneratedFlow {
    pub fn into_draft(self) -> FlowDraft {
        FlowDraft::new(self.nodes, self.edges).with_configuration(self.flow_configuration)
    }
}

/// Answer recorded for question `index` (1-based): the question's own answer,
/// else `answers` keyed by question text, else by node id (`question-{i}`).
fn answer_for<'a>(
    question: &'a FlowQuestion,
    index: usize,
    answers: &'a BTreeMap<String, String>,
) -> Option<&'a str> {
    question
        .answer
        .as_deref()
        .or_else(|| answers.get(&question.question).map(String::as_str))
        .or_else(|| answers.get(&format!("question-{}", index)).map(String::as_str))
        .filter(|a| !a.trim().is_empty())
}

/// Fixed vertical layout: start, one node per question, condition, action, end.
/// A recorded answer labels the edge leading into its question node.
pub fn layout_flow(
    questions: &[FlowQuestion],
    answers: &BTreeMap<String, String>,
    initial_prompt: &str,
) -> GeneratedFlow {
    let row = |i: usize| Position::new(LAYOUT_X, LAYOUT_TOP + LAYOUT_STEP * i as f64);

    let mut nodes = vec![FlowNode::new(
        "start-1",
        NodeKind::Start,
        NodeData::labeled("Welcome")
            .with_message(format!("Welcome! I'm here to help with: {}", initial_prompt)),
        row(0),
    )];
    let mut variables = Vec::with_capacity(questions.len());
    // Per node, the label of the edge entering it
    let mut incoming_labels: Vec<Option<String>> = vec![None];

    for (i, question) in questions.iter().enumerate() {
        let index = i + 1;
        nodes.push(FlowNode::new(
            format!("question-{}", index),
            NodeKind::Question,
            NodeData::labeled(format!("Question {}", index))
                .with_question(question.question.clone(), question.answer_type)
                .with_choices(question.choices.clone()),
            row(index),
        ));
        incoming_labels.push(
            answer_for(question, index, answers)
                .map(|a| a.chars().take(MAX_LABEL_LEN).collect::<String>()),
        );
        variables.push(FlowVariable::typed(
            format!("response_{}", index),
            question.answer_type,
        ));
    }

    let tail = [
        ("condition-1", NodeKind::Condition, "Process Requirements"),
        ("action-1", NodeKind::Action, "Generate Response"),
        ("end-1", NodeKind::End, "Complete"),
    ];
    for (offset, (id, kind, label)) in tail.into_iter().enumerate() {
        let mut data = NodeData::labeled(label);
        if kind == NodeKind::End {
            data = data.with_message("Thank you! Your requirements have been recorded.");
        }
        nodes.push(FlowNode::new(id, kind, data, row(questions.len() + 1 + offset)));
        incoming_labels.push(None);
    }

    let edges: Vec<FlowEdge> = nodes
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let edge = FlowEdge::new(format!("edge-{}", i + 1), &pair[0].id, &pair[1].id);
            match incoming_labels.get(i + 1).cloned().flatten() {
                Some(label) => edge.with_label(label),
                None => edge,
            }
        })
        .collect();

    let flow_configuration = FlowConfiguration::derive_from(&nodes, &edges).with_variables(variables);

    GeneratedFlow {
        nodes,
        edges,
        flow_configuration,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFlow {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    #[serde(default)]
    flow_configuration: Option<FlowConfiguration>,
}

/// Flow generator
pub struct FlowGenerator {
    client: Option<Arc<dyn LLMClient>>,
    config: GeneratorConfig,
}

impl FlowGenerator {
    /// Create a new flow generator backed by a model
    pub fn new(client: Arc<dyn LLMClient>, config: GeneratorConfig) -> Self {
        Self {
            client: Some(client),
            config,
        }
    }

    /// Layout only; never calls a model
    pub fn deterministic() -> Self {
        Self {
            client: None,
            config: GeneratorConfig::default(),
        }
    }

    pub fn from_optional(client: Option<Arc<dyn LLMClient>>, config: GeneratorConfig) -> Self {
        Self { client, config }
    }

    /// Build a flow for the answered questions. Never fails.
    pub async fn generate(
        &self,
        questions: &[FlowQuestion],
        answers: &BTreeMap<String, String>,
        initial_prompt: &str,
    ) -> GeneratedFlow {
        let Some(client) = &self.client else {
            return layout_flow(questions, answers, initial_prompt);
        };

        let transcript = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                format!(
                    "{}. {} -> {}",
                    i + 1,
                    q.question,
                    answer_for(q, i + 1, answers).unwrap_or("(no answer)")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let text = render(
            FLOW_GENERATION_PROMPT,
            &[("prompt", initial_prompt), ("answers", transcript.as_str())],
        );

        let reason = match client.call(self.config.request(text)).await {
            Ok(response) => match self.accept(&response.content) {
                Ok(flow) => {
                    debug!(nodes = flow.nodes.len(), model = %response.model, "model flow accepted");
                    return flow;
                }
                Err(reason) => reason,
            },
            Err(e) => e.to_string(),
        };

        warn!(fallback = "flow", reason = %reason, "using deterministic flow layout");
        layout_flow(questions, answers, initial_prompt)
    }

    /// Parse a model answer and keep it only if the graph is sound
    fn accept(&self, content: &str) -> Result<GeneratedFlow, String> {
        let value = extract_json_object(content).map_err(|e| e.to_string())?;
        let raw: RawFlow = serde_json::from_value(value).map_err(|e| e.to_string())?;

        let flow_configuration = raw
            .flow_configuration
            .unwrap_or_else(|| FlowConfiguration::derive_from(&raw.nodes, &raw.edges));
        let draft = FlowDraft::new(raw.nodes, raw.edges).with_configuration(flow_configuration);

        let report = draft.validate();
        if !report.is_valid {
            return Err(format!("invalid graph: {}", report.errors.join("; ")));
        }

        Ok(GeneratedFlow {
            nodes: draft.nodes,
            edges: draft.edges,
            flow_configuration: draft.flow_configuration.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use serde_json::json;

    #[test]
    fn test_single_question_layout() {
        let flow = layout_flow(
            &[FlowQuestion::new("What is your name?", AnswerType::Text)],
            &BTreeMap::new(),
            "Help users",
        );

        let ids: Vec<_> = flow.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["start-1", "question-1", "condition-1", "action-1", "end-1"]);
        assert_eq!(flow.edges.len(), 4);
        assert_eq!(
            serde_json::to_value(&flow.flow_configuration.variables).unwrap(),
            json!([{"name": "response_1", "type": "text", "defaultValue": ""}])
        );
        assert!(flow.nodes.iter().all(|n| n.position.x == LAYOUT_X));
        assert_eq!(flow.nodes[1].position.y, 200.0);
        assert!(flow.nodes[0].data.message.as_deref().unwrap().contains("Help users"));
    }

    #[test]
    fn test_layout_is_structurally_sound() {
        let questions = vec![
            FlowQuestion::new("Age?", AnswerType::Number),
            FlowQuestion::new("Subscribe?", AnswerType::Boolean),
            FlowQuestion::new("Plan?", AnswerType::Choice),
        ];
        let flow = layout_flow(&questions, &BTreeMap::new(), "x");

        assert!(flow.clone().into_draft().validate().is_valid);
        assert_eq!(flow.nodes.iter().filter(|n| n.is_start()).count(), 1);
        assert_eq!(flow.nodes.iter().filter(|n| n.is_end()).count(), 1);
        let defaults: Vec<_> = flow
            .flow_configuration
            .variables
            .iter()
            .map(|v| v.default_value.clone())
            .collect();
        assert_eq!(defaults, vec![json!(0), json!(false), json!(null)]);
        assert_eq!(flow.flow_configuration.start_node_id.as_deref(), Some("start-1"));
        assert_eq!(flow.flow_configuration.end_node_ids, vec!["end-1"]);
    }

    #[test]
    fn test_answers_label_the_edge_entering_the_question() {
        let questions = vec![
            FlowQuestion::new("What is your name?", AnswerType::Text),
            FlowQuestion {
                answer: Some("Pizza".to_string()),
                ..FlowQuestion::new("Favourite food?", AnswerType::Text)
            },
        ];
        let mut answers = BTreeMap::new();
        answers.insert("What is your name?".to_string(), "Ada".to_string());

        let flow = layout_flow(&questions, &answers, "x");

        assert_eq!(flow.edges[0].source, "start-1");
        assert_eq!(flow.edges[0].target, "question-1");
        assert_eq!(flow.edges[0].label.as_deref(), Some("Ada"));
        assert_eq!(flow.edges[1].target, "question-2");
        assert_eq!(flow.edges[1].label.as_deref(), Some("Pizza"));
        assert!(flow.edges[2..].iter().all(|e| e.label.is_none()));
    }

    #[test]
    fn test_unanswered_question_edge_has_no_label() {
        let questions = vec![
            FlowQuestion::new("What is your name?", AnswerType::Text),
            FlowQuestion::new("Favourite food?", AnswerType::Text),
        ];
        let mut answers = BTreeMap::new();
        answers.insert("question-2".to_string(), "  ".to_string());

        let flow = layout_flow(&questions, &answers, "x");

        assert!(flow.edges.iter().all(|e| e.label.is_none()));
    }

    #[tokio::test]
    async fn test_invalid_model_graph_falls_back() {
        // Two start nodes
        let reply = json!({
            "nodes": [
                {"id": "a", "type": "start", "data": {"label": "A"}, "position": {"x": 0, "y": 0}},
                {"id": "b", "type": "start", "data": {"label": "B"}, "position": {"x": 0, "y": 0}},
                {"id": "c", "type": "end", "data": {"label": "C"}, "position": {"x": 0, "y": 0}}
            ],
            "edges": [{"id": "e", "source": "a", "target": "c"}]
        });
        let mock = Arc::new(MockProvider::with_response(reply.to_string()));
        let generator = FlowGenerator::new(mock, GeneratorConfig::new("m"));
        let questions = [FlowQuestion::new("Q?", AnswerType::Text)];

        let flow = generator.generate(&questions, &BTreeMap::new(), "p").await;

        assert_eq!(flow, layout_flow(&questions, &BTreeMap::new(), "p"));
    }

    #[tokio::test]
    async fn test_valid_model_graph_is_used() {
        let reply = format!(
            "```json\n{}\n```",
            json!({
                "nodes": [
                    {"id": "hello", "type": "start", "data": {"label": "Hi"}, "position": {"x": 0, "y": 0}},
                    {"id": "bye", "type": "end", "data": {"label": "Bye"}, "position": {"x": 0, "y": 100}}
                ],
                "edges": [{"id": "e1", "source": "hello", "target": "bye"}]
            })
        );
        let mock = Arc::new(MockProvider::with_response(reply));
        let generator = FlowGenerator::new(mock, GeneratorConfig::new("m"));

        let flow = generator.generate(&[], &BTreeMap::new(), "p").await;

        assert_eq!(flow.nodes.len(), 2);
        assert_eq!(flow.flow_configuration.start_node_id.as_deref(), Some("hello"));
    }
}
