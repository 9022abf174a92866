//! Universe Core - document model for the Chatbot Universe Builder
//!
//! This crate provides the types shared by every other crate:
//! - Flow documents (nodes, edges, questions, configuration) and validation
//! - Projects, their lifecycle status and generated file bundles
//! - Error types

pub mod error;
pub mod flow;
pub mod project;

// Re-export commonly used types
pub use error::CoreError;
pub use flow::{
    AnswerType, Complexity, Flow, FlowConfiguration, FlowDraft, FlowEdge, FlowMetadata,
    FlowNode, FlowVariable, FlowViolation, GeneratedQuestion, NodeData, NodeKind, Position,
    ValidationReport,
};
pub use project::{BotFiles, Project, ProjectCategory, ProjectStatus};
