//! Advisory graph validation and persistence-boundary limits
//!
//! Nothing here fails: every check reports violations so callers decide what
//! to do with them. The persistence service rejects drafts that produce any.

use super::edge::FlowEdge;
use super::node::{FlowNode, NodeKind};
use super::question::{GeneratedQuestion, MAX_PRIORITY, MIN_PRIORITY};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Maximum number of entries in a node's choice list
pub const MAX_CHOICES: usize = 20;
pub const MAX_LABEL_LEN: usize = 100;
pub const MAX_QUESTION_LEN: usize = 500;
pub const MAX_MESSAGE_LEN: usize = 2000;
pub const MAX_CONTEXT_LEN: usize = 1000;
pub const MAX_ANSWER_LEN: usize = 2000;

/// A single structural or limit violation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowViolation {
    #[error("Flow must have exactly one start node, found {count}")]
    StartNodeCount { count: usize },

    #[error("Flow must have at least one end node")]
    MissingEndNode,

    #[error("Edge '{edge}' references unknown {endpoint} node '{node}'")]
    DanglingEdge {
        edge: String,
        endpoint: &'static str,
        node: String,
    },

    #[error("Duplicate node id '{id}'")]
    DuplicateNodeId { id: String },

    #[error("Duplicate edge id '{id}'")]
    DuplicateEdgeId { id: String },

    #[error("Node '{node}' has {count} choices, maximum is {max}")]
    TooManyChoices { node: String, count: usize, max: usize },

    #[error("{field} exceeds {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Question {index} has priority {priority}, expected {min}-{max}")]
    PriorityOutOfRange {
        index: usize,
        priority: u8,
        min: u8,
        max: u8,
    },
}

/// Result of validating a flow
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_violations<I>(violations: I) -> Self
    where
        I: IntoIterator<Item = FlowViolation>,
    {
        let errors: Vec<String> = violations.into_iter().map(|v| v.to_string()).collect();
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Append extra error messages
    pub fn extend(&mut self, errors: impl IntoIterator<Item = String>) {
        self.errors.extend(errors);
        self.is_valid = self.errors.is_empty();
    }
}

/// Check the structural invariants of a node/edge graph
pub fn validate_graph(nodes: &[FlowNode], edges: &[FlowEdge]) -> Vec<FlowViolation> {
    let mut violations = Vec::new();

    let start_count = nodes.iter().filter(|n| n.kind == NodeKind::Start).count();
    if start_count != 1 {
        violations.push(FlowViolation::StartNodeCount { count: start_count });
    }

    if !nodes.iter().any(|n| n.kind == NodeKind::End) {
        violations.push(FlowViolation::MissingEndNode);
    }

    let mut node_ids = HashSet::new();
    for node in nodes {
        if !node_ids.insert(node.id.as_str()) {
            violations.push(FlowViolation::DuplicateNodeId {
                id: node.id.clone(),
            });
        }
    }

    let mut edge_ids = HashSet::new();
    for edge in edges {
        if !edge_ids.insert(edge.id.as_str()) {
            violations.push(FlowViolation::DuplicateEdgeId {
                id: edge.id.clone(),
            });
        }
        if !node_ids.contains(edge.source.as_str()) {
            violations.push(FlowViolation::DanglingEdge {
                edge: edge.id.clone(),
                endpoint: "source",
                node: edge.source.clone(),
            });
        }
        if !node_ids.contains(edge.target.as_str()) {
            violations.push(FlowViolation::DanglingEdge {
                edge: edge.id.clone(),
                endpoint: "target",
                node: edge.target.clone(),
            });
        }
    }

    violations
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// Check size limits enforced when a flow is persisted
pub fn check_limits(
    nodes: &[FlowNode],
    edges: &[FlowEdge],
    questions: &[GeneratedQuestion],
) -> Vec<FlowViolation> {
    let mut violations = Vec::new();

    for node in nodes {
        let data = &node.data;
        if data.choices.len() > MAX_CHOICES {
            violations.push(FlowViolation::TooManyChoices {
                node: node.id.clone(),
                count: data.choices.len(),
                max: MAX_CHOICES,
            });
        }
        if too_long(&data.label, MAX_LABEL_LEN) {
            violations.push(FlowViolation::TooLong {
                field: format!("node '{}' label", node.id),
                max: MAX_LABEL_LEN,
            });
        }
        if data.question.as_deref().is_some_and(|q| too_long(q, MAX_QUESTION_LEN)) {
            violations.push(FlowViolation::TooLong {
                field: format!("node '{}' question", node.id),
                max: MAX_QUESTION_LEN,
            });
        }
        if data.message.as_deref().is_some_and(|m| too_long(m, MAX_MESSAGE_LEN)) {
            violations.push(FlowViolation::TooLong {
                field: format!("node '{}' message", node.id),
                max: MAX_MESSAGE_LEN,
            });
        }
    }

    for edge in edges {
        if edge.label.as_deref().is_some_and(|l| too_long(l, MAX_LABEL_LEN)) {
            violations.push(FlowViolation::TooLong {
                field: format!("edge '{}' label", edge.id),
                max: MAX_LABEL_LEN,
            });
        }
    }

    for (index, q) in questions.iter().enumerate() {
        if too_long(&q.question, MAX_QUESTION_LEN) {
            violations.push(FlowViolation::TooLong {
                field: format!("generatedQuestions[{}].question", index),
                max: MAX_QUESTION_LEN,
            });
        }
        if too_long(&q.context, MAX_CONTEXT_LEN) {
            violations.push(FlowViolation::TooLong {
                field: format!("generatedQuestions[{}].context", index),
                max: MAX_CONTEXT_LEN,
            });
        }
        if q.answer.as_deref().is_some_and(|a| too_long(a, MAX_ANSWER_LEN)) {
            violations.push(FlowViolation::TooLong {
                field: format!("generatedQuestions[{}].answer", index),
                max: MAX_ANSWER_LEN,
            });
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&q.priority) {
            violations.push(FlowViolation::PriorityOutOfRange {
                index,
                priority: q.priority,
                min: MIN_PRIORITY,
                max: MAX_PRIORITY,
            });
        }
    }

    violations
}
