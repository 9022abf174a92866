//! Flow node definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node type tag.
///
/// The set is closed: every consumer matches on it exhaustively, so adding a
/// variant is a compile error everywhere it is not handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    Question,
    Condition,
    Action,
    End,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Question => "question",
            NodeKind::Condition => "condition",
            NodeKind::Action => "action",
            NodeKind::End => "end",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected answer type of a question node (also used for flow variables)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    #[default]
    Text,
    Email,
    Phone,
    Number,
    Boolean,
    Choice,
}

impl AnswerType {
    /// Default value a flow variable of this type starts with
    pub fn default_value(&self) -> serde_json::Value {
        match self {
            AnswerType::Text | AnswerType::Email | AnswerType::Phone => {
                serde_json::Value::String(String::new())
            }
            AnswerType::Number => serde_json::Value::from(0),
            AnswerType::Boolean => serde_json::Value::Bool(false),
            AnswerType::Choice => serde_json::Value::Null,
        }
    }
}

/// 2D canvas position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Presentation and behavior payload carried by a node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Display label
    #[serde(default)]
    pub label: String,

    /// Question text (question nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// Free text shown to the user (greeting on start nodes, replies on actions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Expected answer type (question nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_type: Option<AnswerType>,

    /// Choice list for `choice` questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    /// Condition expressions (condition nodes); shape is owned by the client
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<serde_json::Value>,

    /// Actions to perform (action nodes); shape is owned by the client
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<serde_json::Value>,
}

impl NodeData {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_question(mut self, question: impl Into<String>, answer_type: AnswerType) -> Self {
        self.question = Some(question.into());
        self.answer_type = Some(answer_type);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }
}

/// A vertex of the conversational flow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    /// Unique id within the flow
    pub id: String,

    /// Node type
    #[serde(rename = "type")]
    pub kind: NodeKind,

    #[serde(default)]
    pub data: NodeData,

    #[serde(default)]
    pub position: Position,
}

impl FlowNode {
    /// Create a new node
    pub fn new(id: impl Into<String>, kind: NodeKind, data: NodeData, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            data,
            position,
        }
    }

    pub fn is_start(&self) -> bool {
        self.kind == NodeKind::Start
    }

    pub fn is_end(&self) -> bool {
        self.kind == NodeKind::End
    }
}
