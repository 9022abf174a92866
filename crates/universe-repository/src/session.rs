//! Bot generation sessions
//!
//! A session records how far a `generate-bot` request has progressed so
//! clients can poll it. Sessions are short-lived: entries expire after a TTL
//! and are evicted lazily on read or explicitly through
//! [`SessionStore::evict_expired`].
//!
//! The trait is synchronous because it is updated from pipeline stage
//! callbacks, which are plain functions.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::models::Expiring;

/// Default session lifetime
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSession {
    pub id: String,
    pub owner: String,
    pub status: SessionStatus,
    /// Pipeline stage last reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationSession {
    /// A pending session
    pub fn new(id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            status: SessionStatus::Pending,
            stage: None,
            project_id: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn enter_stage(&mut self, stage: impl Into<String>) {
        self.status = SessionStatus::Running;
        self.stage = Some(stage.into());
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, project_id: impl Into<String>) {
        self.status = SessionStatus::Completed;
        self.project_id = Some(project_id.into());
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }
}

/// Keyed storage for generation sessions
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session, restarting its TTL
    fn put(&self, session: GenerationSession);

    /// The session, unless missing or expired
    fn get(&self, id: &str) -> Option<GenerationSession>;

    /// Apply `apply` to a live session and return the result; `None` if the
    /// session is missing or expired.
    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut GenerationSession),
    ) -> Option<GenerationSession>;

    fn remove(&self, id: &str) -> Option<GenerationSession>;

    /// Drop every expired session and return how many were removed
    fn evict_expired(&self) -> usize;

    /// Number of stored sessions, expired ones included
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`SessionStore`] over a concurrent map
pub struct InMemorySessionStore {
    sessions: DashMap<String, Expiring<GenerationSession>>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, session: GenerationSession) {
        self.sessions
            .insert(session.id.clone(), Expiring::new(session, self.ttl));
    }

    fn get(&self, id: &str) -> Option<GenerationSession> {
        // The read guard must be released before removing
        let expired = match self.sessions.get(id) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(id);
            debug!(session_id = id, "expired session evicted");
        }
        None
    }

    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut GenerationSession),
    ) -> Option<GenerationSession> {
        let mut entry = self.sessions.get_mut(id)?;
        if entry.is_expired() {
            drop(entry);
            self.sessions.remove(id);
            return None;
        }
        apply(&mut entry.value);
        entry.touch();
        Some(entry.value.clone())
    }

    fn remove(&self, id: &str) -> Option<GenerationSession> {
        self.sessions.remove(id).map(|(_, entry)| entry.value)
    }

    fn evict_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_expired());
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, "expired sessions evicted");
        }
        evicted
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
