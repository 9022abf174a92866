//! Session store expiry tests on a paused clock

use std::time::Duration;
use universe_repository::{
    GenerationSession, InMemorySessionStore, SessionStatus, SessionStore, DEFAULT_SESSION_TTL,
};

#[tokio::test(start_paused = true)]
async fn test_sessions_expire_after_ttl() {
    let store = InMemorySessionStore::new(Duration::from_secs(60));
    store.put(GenerationSession::new("s1", "u1"));

    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(store.get("s1").is_some());

    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(store.get("s1").is_none());
    // The expired entry was dropped on read
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_update_restarts_ttl() {
    let store = InMemorySessionStore::new(Duration::from_secs(60));
    store.put(GenerationSession::new("s1", "u1"));

    tokio::time::advance(Duration::from_secs(50)).await;
    let updated = store
        .update("s1", &mut |session| session.enter_stage("frontend"))
        .unwrap();
    assert_eq!(updated.status, SessionStatus::Running);

    tokio::time::advance(Duration::from_secs(50)).await;
    let session = store.get("s1").unwrap();
    assert_eq!(session.stage.as_deref(), Some("frontend"));
}

#[tokio::test(start_paused = true)]
async fn test_evict_expired_only_drops_stale_sessions() {
    let store = InMemorySessionStore::new(Duration::from_secs(60));
    store.put(GenerationSession::new("old", "u1"));

    tokio::time::advance(Duration::from_secs(45)).await;
    store.put(GenerationSession::new("fresh", "u1"));

    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(store.len(), 2);
    assert_eq!(store.evict_expired(), 1);
    assert!(store.get("fresh").is_some());
    assert!(store.get("old").is_none());
}

#[tokio::test]
async fn test_update_missing_session_is_none() {
    let store = InMemorySessionStore::default();
    assert_eq!(store.ttl(), DEFAULT_SESSION_TTL);
    assert!(store
        .update("nope", &mut |session| session.fail("x"))
        .is_none());
}

#[tokio::test]
async fn test_remove_returns_session() {
    let store = InMemorySessionStore::default();
    let mut session = GenerationSession::new("s1", "u1");
    session.complete("p1");
    store.put(session);

    let removed = store.remove("s1").unwrap();
    assert_eq!(removed.project_id.as_deref(), Some("p1"));
    assert!(store.get("s1").is_none());
}
