//! Store configuration
//!
//! Selects which [`ProjectStore`] backs the service.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{MemoryStore, ProjectStore, RepositoryError, RepositoryResult};

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database at `database_url`
    #[default]
    Sqlite,
    /// Process memory; data is lost on restart
    Memory,
}

/// Store configuration
///
/// # Examples
///
/// ```rust
/// use universe_repository::StoreConfig;
///
/// let config = StoreConfig::sqlite("sqlite://data/universe.db");
/// assert!(config.validate().is_ok());
///
/// let config = StoreConfig::memory();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Required for the SQLite backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

impl StoreConfig {
    pub fn sqlite(url: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: Some(url.into()),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
        }
    }

    /// Returns an error if the selected backend is missing its settings
    pub fn validate(&self) -> RepositoryResult<()> {
        match self.backend {
            StoreBackend::Sqlite if self.database_url.is_none() => Err(RepositoryError::Other(
                "database_url is required for the sqlite backend".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Open the configured store
    pub async fn open(&self) -> RepositoryResult<Arc<dyn ProjectStore>> {
        self.validate()?;
        match self.backend {
            StoreBackend::Memory => {
                info!("using in-memory project store");
                Ok(Arc::new(MemoryStore::new()))
            }
            #[cfg(feature = "sqlite")]
            StoreBackend::Sqlite => {
                let url = self.database_url.as_deref().unwrap_or_default();
                Ok(Arc::new(crate::SqliteStore::connect(url).await?))
            }
            #[cfg(not(feature = "sqlite"))]
            StoreBackend::Sqlite => Err(RepositoryError::Other(
                "sqlite support is not compiled in".to_string(),
            )),
        }
    }
}
