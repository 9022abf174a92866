//! Project: the parent entity owning a flow's versions and generated files

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status: `draft` → `in_progress` → `completed` → `deployed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Deployed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Deployed => "deployed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProjectStatus::Draft),
            "in_progress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            "deployed" => Ok(ProjectStatus::Deployed),
            other => Err(CoreError::InvalidValue(format!(
                "unknown project status '{}'",
                other
            ))),
        }
    }
}

/// Domain category assigned to a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectCategory {
    Education,
    Ecommerce,
    Healthcare,
    Support,
    #[default]
    Generic,
}

impl ProjectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectCategory::Education => "education",
            ProjectCategory::Ecommerce => "ecommerce",
            ProjectCategory::Healthcare => "healthcare",
            ProjectCategory::Support => "support",
            ProjectCategory::Generic => "generic",
        }
    }
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "education" => Ok(ProjectCategory::Education),
            "ecommerce" => Ok(ProjectCategory::Ecommerce),
            "healthcare" => Ok(ProjectCategory::Healthcare),
            "support" => Ok(ProjectCategory::Support),
            "generic" => Ok(ProjectCategory::Generic),
            other => Err(CoreError::InvalidValue(format!(
                "unknown project category '{}'",
                other
            ))),
        }
    }
}

/// Generated source files, keyed by relative path, per target
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BotFiles {
    #[serde(default)]
    pub frontend: BTreeMap<String, String>,
    #[serde(default)]
    pub backend: BTreeMap<String, String>,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl BotFiles {
    pub fn file_count(&self) -> usize {
        self.frontend.len() + self.backend.len() + self.config.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    /// Every file as `target/path`
    pub fn paths(&self) -> Vec<String> {
        let prefixed = |target: &str, files: &BTreeMap<String, String>| {
            files
                .keys()
                .map(|p| format!("{}/{}", target, p))
                .collect::<Vec<_>>()
        };
        let mut paths = prefixed("frontend", &self.frontend);
        paths.extend(prefixed("backend", &self.backend));
        paths.extend(prefixed("config", &self.config));
        paths
    }
}

/// A user's chatbot project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    /// Owning user id
    pub owner: String,
    pub name: String,
    pub initial_prompt: String,
    #[serde(default)]
    pub category: ProjectCategory,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_files: Option<BotFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Longest name derived from a prompt
const DERIVED_NAME_LEN: usize = 50;

impl Project {
    /// New draft project with a fresh id
    pub fn new(owner: impl Into<String>, initial_prompt: impl Into<String>) -> Self {
        let initial_prompt = initial_prompt.into();
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.into(),
            name: derive_name(&initial_prompt),
            initial_prompt,
            category: ProjectCategory::Generic,
            status: ProjectStatus::Draft,
            bot_files: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: ProjectCategory) -> Self {
        self.category = category;
        self
    }

    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.owner == actor_id
    }

    /// Change status and bump `updatedAt`
    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

fn derive_name(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.chars().count() <= DERIVED_NAME_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(DERIVED_NAME_LEN).collect();
    format!("{}...", cut.trim_end())
}
