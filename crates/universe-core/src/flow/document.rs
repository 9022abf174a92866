//! Versioned flow document

use super::config::{FlowConfiguration, FlowMetadata};
use super::edge::FlowEdge;
use super::node::{FlowNode, NodeData, NodeKind, Position};
use super::question::GeneratedQuestion;
use super::validation::{check_limits, validate_graph, ValidationReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// x coordinate of the seeded start node
const SEED_X: f64 = 250.0;
/// y coordinate of the seeded start node
const SEED_Y: f64 = 50.0;

/// Graph contents submitted by a save. Optional fields left unset keep the
/// values of the previous version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDraft {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub generated_questions: Option<Vec<GeneratedQuestion>>,
    #[serde(default)]
    pub flow_configuration: Option<FlowConfiguration>,
}

impl FlowDraft {
    pub fn new(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        Self {
            nodes,
            edges,
            generated_questions: None,
            flow_configuration: None,
        }
    }

    pub fn with_questions(mut self, questions: Vec<GeneratedQuestion>) -> Self {
        self.generated_questions = Some(questions);
        self
    }

    pub fn with_configuration(mut self, configuration: FlowConfiguration) -> Self {
        self.flow_configuration = Some(configuration);
        self
    }

    /// Graph invariants, size limits and, when supplied, configuration
    /// consistency.
    pub fn validate(&self) -> ValidationReport {
        let questions = self.generated_questions.as_deref().unwrap_or(&[]);
        let violations = validate_graph(&self.nodes, &self.edges)
            .into_iter()
            .chain(check_limits(&self.nodes, &self.edges, questions));

        let mut report = ValidationReport::from_violations(violations);
        if let Some(config) = &self.flow_configuration {
            report.extend(config.consistency_errors(&self.nodes));
        }
        report
    }
}

/// One version of a project's conversational flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Stable id shared by every version of the flow
    pub id: String,
    pub project_id: String,
    pub version: u32,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub generated_questions: Vec<GeneratedQuestion>,
    #[serde(default)]
    pub flow_configuration: FlowConfiguration,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// The version-1 flow created together with a project: a lone start node
    /// greeting the user with the project's prompt.
    pub fn seed(project_id: impl Into<String>, initial_prompt: &str) -> Self {
        let start = FlowNode::new(
            "start-1",
            NodeKind::Start,
            NodeData::labeled("Welcome")
                .with_message(format!("Welcome! Let's build: {}", initial_prompt)),
            Position::new(SEED_X, SEED_Y),
        );
        Self::first_version(project_id, FlowDraft::new(vec![start], Vec::new()))
    }

    /// Version 1 built from a draft. A missing configuration is inferred from
    /// the nodes.
    pub fn first_version(project_id: impl Into<String>, draft: FlowDraft) -> Self {
        let now = Utc::now();
        let mut flow_configuration = draft
            .flow_configuration
            .unwrap_or_else(|| FlowConfiguration::derive_from(&draft.nodes, &draft.edges));
        flow_configuration.metadata = FlowMetadata::from_graph(&draft.nodes, &draft.edges);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            version: 1,
            nodes: draft.nodes,
            edges: draft.edges,
            generated_questions: draft.generated_questions.unwrap_or_default(),
            flow_configuration,
            created_at: now,
            updated_at: now,
        }
    }

    /// The next version: graph replaced, questions and configuration replaced
    /// only when the draft carries them. A carried-over configuration keeps
    /// its variables; start and end ids always follow the new graph.
    pub fn next_version(&self, draft: FlowDraft) -> Self {
        let mut flow_configuration = match draft.flow_configuration {
            Some(config) => config,
            None => FlowConfiguration::derive_from(&draft.nodes, &draft.edges)
                .with_variables(self.flow_configuration.variables.clone()),
        };
        flow_configuration.metadata = FlowMetadata::from_graph(&draft.nodes, &draft.edges);

        Self {
            id: self.id.clone(),
            project_id: self.project_id.clone(),
            version: self.version + 1,
            nodes: draft.nodes,
            edges: draft.edges,
            generated_questions: draft
                .generated_questions
                .unwrap_or_else(|| self.generated_questions.clone()),
            flow_configuration,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }

    /// The node typed `start`, if any
    pub fn start_node(&self) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Start)
    }

    /// All nodes typed `end`
    pub fn end_nodes(&self) -> Vec<&FlowNode> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::End).collect()
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Structural invariants plus configuration consistency
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::from_violations(validate_graph(&self.nodes, &self.edges));
        report.extend(self.flow_configuration.consistency_errors(&self.nodes));
        report
    }

    /// The current graph as a draft, for re-saving
    pub fn to_draft(&self) -> FlowDraft {
        FlowDraft {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            generated_questions: Some(self.generated_questions.clone()),
            flow_configuration: Some(self.flow_configuration.clone()),
        }
    }
}
