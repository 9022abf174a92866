//! Conversational flow document model
//!
//! A flow is a graph of typed nodes joined by directed edges, together with
//! the clarifying questions that produced it and a configuration block. Each
//! save produces a new version.

pub mod config;
pub mod document;
pub mod edge;
pub mod node;
pub mod question;
pub mod validation;

pub use config::{Complexity, FlowConfiguration, FlowMetadata, FlowVariable};
pub use document::{Flow, FlowDraft};
pub use edge::FlowEdge;
pub use node::{AnswerType, FlowNode, NodeData, NodeKind, Position};
pub use question::GeneratedQuestion;
pub use validation::{check_limits, validate_graph, FlowViolation, ValidationReport};
