//! SQLite project store
//!
//! Projects and flow versions are stored as JSON documents next to the few
//! columns needed for lookups. Each flow version is its own row keyed by
//! `(project_id, version)`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use universe_core::{Flow, FlowDraft, Project, ProjectStatus};

use crate::{FlowVersionSummary, ProjectStore, RepositoryError, RepositoryResult};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY NOT NULL,
        owner TEXT NOT NULL,
        status TEXT NOT NULL,
        document TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects (owner)"#,
    r#"CREATE TABLE IF NOT EXISTS flows (
        project_id TEXT NOT NULL REFERENCES projects (id) ON DELETE CASCADE,
        version INTEGER NOT NULL,
        document TEXT NOT NULL,
        node_count INTEGER NOT NULL,
        edge_count INTEGER NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (project_id, version)
    )"#,
];

/// SQLite-backed [`ProjectStore`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url` and apply the
    /// schema.
    ///
    /// # Example
    /// ```no_run
    /// use universe_repository::SqliteStore;
    ///
    /// #[tokio::main]
    /// async fn main() -> universe_repository::RepositoryResult<()> {
    ///     let store = SqliteStore::connect("sqlite://universe.db").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is a separate database,
        // so keep exactly one alive for the lifetime of the pool.
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self::with_pool(pool);
        store.migrate().await?;
        info!(database_url, "sqlite store ready");
        Ok(store)
    }

    /// Wrap an existing pool. The schema is not applied; call [`migrate`](Self::migrate).
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes that do not exist yet
    pub async fn migrate(&self) -> RepositoryResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn write_project(
        tx: &mut Transaction<'_, Sqlite>,
        project: &Project,
    ) -> RepositoryResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET owner = ?, status = ?, document = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.owner)
        .bind(project.status.as_str())
        .bind(serde_json::to_string(project)?)
        .bind(timestamp(&project.updated_at))
        .bind(&project.id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_flow(tx: &mut Transaction<'_, Sqlite>, flow: &Flow) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO flows (project_id, version, document, node_count, edge_count, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&flow.project_id)
        .bind(flow.version as i64)
        .bind(serde_json::to_string(flow)?)
        .bind(flow.nodes.len() as i64)
        .bind(flow.edges.len() as i64)
        .bind(timestamp(&flow.updated_at))
        .execute(&mut **tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepositoryError::Conflict {
                    project_id: flow.project_id.clone(),
                    version: flow.version,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn insert_project(
        &self,
        project: &Project,
        seed_flow: Option<&Flow>,
    ) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, owner, status, document, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.owner)
        .bind(project.status.as_str())
        .bind(serde_json::to_string(project)?)
        .bind(timestamp(&project.created_at))
        .bind(timestamp(&project.updated_at))
        .execute(&mut *tx)
        .await?;

        if let Some(flow) = seed_flow {
            Self::insert_flow(&mut tx, flow).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_project(&self, id: &str) -> RepositoryResult<Option<Project>> {
        let row = sqlx::query(r#"SELECT document FROM projects WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document")?;
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn list_projects(&self, owner: &str) -> RepositoryResult<Vec<Project>> {
        let rows = sqlx::query(
            r#"SELECT document FROM projects WHERE owner = ? ORDER BY created_at DESC"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let document: String = row.try_get("document")?;
                Ok(serde_json::from_str(&document)?)
            })
            .collect()
    }

    async fn update_project(&self, project: &Project) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;
        if Self::write_project(&mut tx, project).await? == 0 {
            return Err(RepositoryError::project_not_found(&project.id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_flow(&self, project_id: &str, draft: FlowDraft) -> RepositoryResult<Flow> {
        let mut tx = self.pool.begin().await?;

        let project_row = sqlx::query(r#"SELECT document FROM projects WHERE id = ?"#)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::project_not_found(project_id))?;
        let document: String = project_row.try_get("document")?;
        let mut project: Project = serde_json::from_str(&document)?;

        let latest_row = sqlx::query(
            r#"SELECT document FROM flows WHERE project_id = ? ORDER BY version DESC LIMIT 1"#,
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;

        let flow = match latest_row {
            Some(row) => {
                let document: String = row.try_get("document")?;
                let latest: Flow = serde_json::from_str(&document)?;
                latest.next_version(draft)
            }
            None => Flow::first_version(project_id, draft),
        };

        Self::insert_flow(&mut tx, &flow).await?;

        project.set_status(ProjectStatus::InProgress);
        Self::write_project(&mut tx, &project).await?;

        // Dropping the transaction on any early return above rolls it back
        tx.commit().await?;

        debug!(project_id, version = flow.version, "flow saved");
        Ok(flow)
    }

    async fn latest_flow(&self, project_id: &str) -> RepositoryResult<Option<Flow>> {
        let row = sqlx::query(
            r#"SELECT document FROM flows WHERE project_id = ? ORDER BY version DESC LIMIT 1"#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document")?;
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn flow_versions(&self, project_id: &str) -> RepositoryResult<Vec<FlowVersionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT version, node_count, edge_count, updated_at
            FROM flows
            WHERE project_id = ?
            ORDER BY version ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let updated_at: String = row.try_get("updated_at")?;
                Ok(FlowVersionSummary {
                    version: row.try_get::<i64, _>("version")? as u32,
                    updated_at: parse_timestamp(&updated_at)?,
                    node_count: row.try_get::<i64, _>("node_count")? as usize,
                    edge_count: row.try_get::<i64, _>("edge_count")? as usize,
                })
            })
            .collect()
    }

    async fn delete_project(&self, id: &str) -> RepositoryResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(r#"DELETE FROM flows WHERE project_id = ?"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(r#"DELETE FROM projects WHERE id = ?"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Other(format!("Invalid timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:test?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://data/universe.db"));
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&timestamp(&now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }
}
