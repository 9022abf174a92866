//! Integration tests for SqliteStore
//!
//! Each test uses its own database file in a temporary directory.

#![cfg(feature = "sqlite")]

use std::sync::Arc;
use tempfile::TempDir;
use universe_core::{
    BotFiles, Flow, FlowDraft, FlowEdge, FlowNode, NodeData, NodeKind, Position, Project,
    ProjectStatus,
};
use universe_repository::{
    NewProject, ProjectService, ProjectStore, RepositoryError, SqliteStore,
};

async fn create_test_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", temp_dir.path().join("universe.db").display());
    let store = SqliteStore::connect(&url).await.unwrap();
    (temp_dir, store)
}

fn draft() -> FlowDraft {
    let node = |id: &str, kind| FlowNode::new(id, kind, NodeData::labeled(id), Position::default());
    FlowDraft::new(
        vec![node("start-1", NodeKind::Start), node("end-1", NodeKind::End)],
        vec![FlowEdge::new("e1", "start-1", "end-1").with_label("done")],
    )
}

#[tokio::test]
async fn test_project_round_trip() {
    let (_dir, store) = create_test_store().await;
    let project = Project::new("u1", "A support bot for a bike shop");
    let seed = Flow::seed(&project.id, &project.initial_prompt);

    store.insert_project(&project, Some(&seed)).await.unwrap();

    let loaded = store.get_project(&project.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, project.id);
    assert_eq!(loaded.initial_prompt, project.initial_prompt);

    let latest = store.latest_flow(&project.id).await.unwrap().unwrap();
    assert_eq!(latest, seed);
}

#[tokio::test]
async fn test_save_flow_appends_versions() {
    let (_dir, store) = create_test_store().await;
    let project = Project::new("u1", "Workshop signup");
    store
        .insert_project(&project, Some(&Flow::seed(&project.id, "Workshop signup")))
        .await
        .unwrap();

    let v2 = store.save_flow(&project.id, draft()).await.unwrap();
    let v3 = store.save_flow(&project.id, draft()).await.unwrap();
    assert_eq!((v2.version, v3.version), (2, 3));

    let versions = store.flow_versions(&project.id).await.unwrap();
    assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(versions[2].node_count, 2);
    assert_eq!(versions[2].edge_count, 1);

    let latest = store.latest_flow(&project.id).await.unwrap().unwrap();
    assert_eq!(latest.version, 3);
    assert_eq!(latest.edges[0].label.as_deref(), Some("done"));

    let stored = store.get_project(&project.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ProjectStatus::InProgress);
}

#[tokio::test]
async fn test_first_save_without_seed_is_version_one() {
    let (_dir, store) = create_test_store().await;
    let project = Project::new("u1", "Empty project");
    store.insert_project(&project, None).await.unwrap();

    let flow = store.save_flow(&project.id, draft()).await.unwrap();
    assert_eq!(flow.version, 1);
    assert_eq!(flow.flow_configuration.start_node_id.as_deref(), Some("start-1"));
}

#[tokio::test]
async fn test_save_flow_for_missing_project_writes_nothing() {
    let (_dir, store) = create_test_store().await;

    let err = store.save_flow("missing", draft()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert!(store.flow_versions("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_version_is_conflict() {
    let (_dir, store) = create_test_store().await;
    let project = Project::new("u1", "Race");
    let seed = Flow::seed(&project.id, "Race");
    store.insert_project(&project, Some(&seed)).await.unwrap();

    // A second project insert carrying the same version-1 flow collides
    let other = Project::new("u1", "Race again");
    let mut clash = seed.clone();
    clash.project_id = project.id.clone();
    let err = store.insert_project(&other, Some(&clash)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { version: 1, .. }));

    // The failed transaction left no project behind
    assert!(store.get_project(&other.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_and_list_projects() {
    let (_dir, store) = create_test_store().await;
    let mut project = Project::new("u1", "Newsletter bot");
    store.insert_project(&project, None).await.unwrap();
    store
        .insert_project(&Project::new("u2", "Not mine"), None)
        .await
        .unwrap();

    let mut files = BotFiles::default();
    files.config.insert("README.md".into(), "# Bot".into());
    project.bot_files = Some(files);
    project.set_status(ProjectStatus::Completed);
    store.update_project(&project).await.unwrap();

    let projects = store.list_projects("u1").await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].status, ProjectStatus::Completed);
    assert!(projects[0].bot_files.is_some());

    let missing = Project::new("u1", "never inserted");
    assert!(matches!(
        store.update_project(&missing).await,
        Err(RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_project_cascades() {
    let (_dir, store) = create_test_store().await;
    let project = Project::new("u1", "Short lived");
    store
        .insert_project(&project, Some(&Flow::seed(&project.id, "Short lived")))
        .await
        .unwrap();
    store.save_flow(&project.id, draft()).await.unwrap();

    assert!(store.delete_project(&project.id).await.unwrap());
    assert!(store.get_project(&project.id).await.unwrap().is_none());
    assert!(store.latest_flow(&project.id).await.unwrap().is_none());
    assert!(!store.delete_project(&project.id).await.unwrap());
}

#[tokio::test]
async fn test_in_memory_database_keeps_state_across_calls() {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    let service = ProjectService::new(Arc::new(store));

    let project = service
        .create_project("u1", NewProject::new("In-memory check"))
        .await
        .unwrap();
    let flow = service.save_flow(&project.id, "u1", draft()).await.unwrap();

    assert_eq!(flow.version, 2);
    assert_eq!(service.list_projects("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_data_survives_reconnect() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", temp_dir.path().join("universe.db").display());
    let project = Project::new("u1", "Persistent");

    {
        let store = SqliteStore::connect(&url).await.unwrap();
        store.insert_project(&project, None).await.unwrap();
        store.save_flow(&project.id, draft()).await.unwrap();
    }

    let store = SqliteStore::connect(&url).await.unwrap();
    let latest = store.latest_flow(&project.id).await.unwrap().unwrap();
    assert_eq!(latest.version, 1);
}
