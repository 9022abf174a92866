//! Data models for the repository layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use universe_core::Flow;

/// One row of a project's flow history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVersionSummary {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
}

impl From<&Flow> for FlowVersionSummary {
    fn from(flow: &Flow) -> Self {
        Self {
            version: flow.version,
            updated_at: flow.updated_at,
            node_count: flow.nodes.len(),
            edge_count: flow.edges.len(),
        }
    }
}

/// A stored value with TTL support
#[derive(Debug, Clone)]
pub(crate) struct Expiring<T> {
    /// The stored value
    pub value: T,
    /// When this entry was last written
    pub stored_at: Instant,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl<T> Expiring<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired
    pub fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }

    /// Restart the TTL clock
    pub fn touch(&mut self) {
        self.stored_at = Instant::now();
    }
}
