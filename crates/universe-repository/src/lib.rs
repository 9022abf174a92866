//! Persistence layer for the Chatbot Universe Builder
//!
//! This crate stores projects and their versioned flows, and tracks bot
//! generation sessions.
//!
//! # Features
//!
//! - **SQLite store**: JSON documents, one row per flow version, saves in a
//!   single transaction
//! - **Memory store**: for tests and local development
//! - **Project service**: ownership checks and flow validation in front of a store
//! - **Sessions**: TTL-bounded generation progress records
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use universe_repository::{NewProject, ProjectService, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> universe_repository::RepositoryResult<()> {
//!     let store = SqliteStore::connect("sqlite://universe.db").await?;
//!     let service = ProjectService::new(Arc::new(store));
//!
//!     let project = service
//!         .create_project("user-1", NewProject::new("A booking bot for a hair salon"))
//!         .await?;
//!     let flow = service.get_latest_flow(&project.id, "user-1").await?;
//!     assert_eq!(flow.version, 1);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod service;
pub mod session;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{StoreBackend, StoreConfig};
pub use error::{RepositoryError, RepositoryResult};
pub use memory::MemoryStore;
pub use models::FlowVersionSummary;
pub use service::{Classifier, NewProject, ProjectService};
pub use session::{
    GenerationSession, InMemorySessionStore, SessionStatus, SessionStore, DEFAULT_SESSION_TTL,
};
pub use traits::ProjectStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
