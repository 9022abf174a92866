//! Flow configuration: entry/exit points, variables and derived metadata

use super::edge::FlowEdge;
use super::node::{AnswerType, FlowNode, NodeKind};
use serde::{Deserialize, Serialize};

/// Flows with at most this many nodes are `simple`
pub const SIMPLE_MAX_NODES: usize = 5;
/// Flows with at most this many nodes are `moderate`
pub const MODERATE_MAX_NODES: usize = 15;

/// Complexity classification derived from the node count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    pub fn from_node_count(count: usize) -> Self {
        if count <= SIMPLE_MAX_NODES {
            Complexity::Simple
        } else if count <= MODERATE_MAX_NODES {
            Complexity::Moderate
        } else {
            Complexity::Complex
        }
    }
}

/// Metadata derived from the graph shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMetadata {
    #[serde(default)]
    pub node_count: usize,
    #[serde(default)]
    pub edge_count: usize,
    #[serde(default)]
    pub complexity: Complexity,
}

impl FlowMetadata {
    pub fn from_graph(nodes: &[FlowNode], edges: &[FlowEdge]) -> Self {
        Self {
            node_count: nodes.len(),
            edge_count: edges.len(),
            complexity: Complexity::from_node_count(nodes.len()),
        }
    }
}

/// A named, typed variable collected while the flow runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVariable {
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: AnswerType,
    #[serde(default)]
    pub default_value: serde_json::Value,
}

impl FlowVariable {
    /// Variable with the type-appropriate default value
    pub fn typed(name: impl Into<String>, var_type: AnswerType) -> Self {
        Self {
            name: name.into(),
            var_type,
            default_value: var_type.default_value(),
        }
    }
}

/// Flow-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowConfiguration {
    #[serde(default)]
    pub start_node_id: Option<String>,
    #[serde(default)]
    pub end_node_ids: Vec<String>,
    #[serde(default)]
    pub variables: Vec<FlowVariable>,
    #[serde(default)]
    pub metadata: FlowMetadata,
}

impl FlowConfiguration {
    /// Infer a configuration from the graph: first `start` node, every `end`
    /// node, no variables.
    pub fn derive_from(nodes: &[FlowNode], edges: &[FlowEdge]) -> Self {
        let start_node_id = nodes
            .iter()
            .find(|n| n.kind == NodeKind::Start)
            .map(|n| n.id.clone());

        let end_node_ids = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::End)
            .map(|n| n.id.clone())
            .collect();

        Self {
            start_node_id,
            end_node_ids,
            variables: Vec::new(),
            metadata: FlowMetadata::from_graph(nodes, edges),
        }
    }

    pub fn with_variables(mut self, variables: Vec<FlowVariable>) -> Self {
        self.variables = variables;
        self
    }

    /// Mismatches between this configuration and the nodes it describes.
    ///
    /// An unset `startNodeId` is not reported; the graph validator already
    /// covers a missing start node.
    pub fn consistency_errors(&self, nodes: &[FlowNode]) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(start_id) = &self.start_node_id {
            let matches_start = nodes
                .iter()
                .any(|n| n.kind == NodeKind::Start && &n.id == start_id);
            if !matches_start {
                errors.push(format!(
                    "flowConfiguration.startNodeId '{}' is not a start node",
                    start_id
                ));
            }
        }

        let mut expected: Vec<&str> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::End)
            .map(|n| n.id.as_str())
            .collect();
        let mut actual: Vec<&str> = self.end_node_ids.iter().map(String::as_str).collect();
        expected.sort_unstable();
        expected.dedup();
        actual.sort_unstable();
        actual.dedup();
        if expected != actual {
            errors.push(format!(
                "flowConfiguration.endNodeIds {:?} does not match end nodes {:?}",
                actual, expected
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::node::{NodeData, Position};
    use serde_json::json;

    fn node(id: &str, kind: NodeKind) -> FlowNode {
        FlowNode::new(id, kind, NodeData::labeled(id), Position::default())
    }

    #[test]
    fn test_derive_from_nodes() {
        let nodes = vec![
            node("s", NodeKind::Start),
            node("q", NodeKind::Question),
            node("e1", NodeKind::End),
            node("e2", NodeKind::End),
        ];
        let config = FlowConfiguration::derive_from(&nodes, &[]);

        assert_eq!(config.start_node_id.as_deref(), Some("s"));
        assert_eq!(config.end_node_ids, vec!["e1", "e2"]);
        assert!(config.variables.is_empty());
        assert_eq!(config.metadata.node_count, 4);
        assert_eq!(config.metadata.complexity, Complexity::Simple);
    }

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(Complexity::from_node_count(5), Complexity::Simple);
        assert_eq!(Complexity::from_node_count(6), Complexity::Moderate);
        assert_eq!(Complexity::from_node_count(15), Complexity::Moderate);
        assert_eq!(Complexity::from_node_count(16), Complexity::Complex);
    }

    #[test]
    fn test_consistency_errors() {
        let nodes = vec![node("s", NodeKind::Start), node("e", NodeKind::End)];

        let good = FlowConfiguration::derive_from(&nodes, &[]);
        assert!(good.consistency_errors(&nodes).is_empty());

        let bad = FlowConfiguration {
            start_node_id: Some("e".to_string()),
            end_node_ids: vec![],
            ..Default::default()
        };
        assert_eq!(bad.consistency_errors(&nodes).len(), 2);
    }

    #[test]
    fn test_variable_wire_format() {
        let var = FlowVariable::typed("response_1", AnswerType::Choice);
        let value = serde_json::to_value(&var).unwrap();
        assert_eq!(value, json!({"name": "response_1", "type": "choice", "defaultValue": null}));
    }
}
