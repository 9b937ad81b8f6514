// Integration tests for the session registry
//
// These drive the registry against the in-memory engine and check create /
// get / restart / end semantics across handles.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use stt_relay::{EngineEvent, MockEngine, RecognitionConfig, SessionRegistry, SessionState};

fn registry_with(engine: &MockEngine) -> SessionRegistry {
    SessionRegistry::new(Arc::new(engine.clone()), RecognitionConfig::default())
}

#[tokio::test]
async fn test_get_after_create_and_end() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    registry.create("call-1").await?;
    assert!(registry.get("call-1").await.is_some());
    assert!(registry.slots().contains("call-1").await);

    assert!(registry.end("call-1").await);
    assert!(registry.get("call-1").await.is_none());
    assert!(!registry.slots().contains("call-1").await);

    // Upstream connection was closed
    assert!(engine.connection(0).await.unwrap().is_closed());

    Ok(())
}

#[tokio::test]
async fn test_create_replaces_existing_session() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    let first = registry.create("call-1").await?;
    let second = registry.create("call-1").await?;

    let current = registry.get("call-1").await.unwrap();
    assert!(Arc::ptr_eq(&current, &second));
    assert!(!Arc::ptr_eq(&current, &first));

    // The replaced session is closed rather than leaked
    assert_eq!(first.state(), SessionState::Closed);
    assert!(engine.connection(0).await.unwrap().is_closed());
    assert!(!engine.connection(1).await.unwrap().is_closed());
    assert_eq!(registry.len().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_create_resets_slot() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    registry.create("call-1").await?;
    registry
        .slots()
        .set_final("call-1", "stale".to_string())
        .await?;

    registry.create("call-1").await?;
    assert_eq!(registry.slots().drain_if_final("call-1").await?, None);

    Ok(())
}

#[tokio::test]
async fn test_create_fails_when_engine_unavailable() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);
    engine.fail_next_opens(1).await;

    assert!(registry.create("call-1").await.is_err());
    assert!(registry.get("call-1").await.is_none());
    assert!(!registry.slots().contains("call-1").await);

    Ok(())
}

#[tokio::test]
async fn test_failed_duplicate_create_keeps_existing_session() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    let existing = registry.create("call-1").await?;
    registry
        .slots()
        .set_final("call-1", "pending".to_string())
        .await?;

    engine.fail_next_opens(1).await;
    assert!(registry.create("call-1").await.is_err());

    let current = registry.get("call-1").await.unwrap();
    assert!(Arc::ptr_eq(&current, &existing));
    assert_eq!(existing.state(), SessionState::Streaming);
    assert_eq!(
        registry.slots().drain_if_final("call-1").await?,
        Some("pending".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn test_end_during_slow_create_leaves_usable_session() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);
    engine.set_open_delay(Duration::from_millis(100)).await;

    let creating = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.create("call-1").await })
    };

    // Lands while the upstream connection is still opening
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!registry.end("call-1").await);

    creating.await??;

    // The end is ordered before the create: session and slot both exist
    assert!(registry.get("call-1").await.is_some());
    assert!(registry.slots().contains("call-1").await);

    engine
        .connection(0)
        .await
        .unwrap()
        .emit(EngineEvent::final_result("after the race"))
        .await;
    assert!(engine.wait_for_connections(2, Duration::from_secs(2)).await);

    assert_eq!(
        registry.slots().drain_if_final("call-1").await?,
        Some("after the race".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn test_end_unknown_call_is_noop() {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    assert!(!registry.end("unknown-call").await);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_restart_swaps_session_and_keeps_slot() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    let old = registry.create("call-1").await?;
    registry
        .slots()
        .set_final("call-1", "undelivered".to_string())
        .await?;

    assert!(registry.restart("call-1").await?);

    let new = registry.get("call-1").await.unwrap();
    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(old.state(), SessionState::Closed);
    assert_eq!(new.state(), SessionState::Streaming);
    assert_eq!(engine.connection_count().await, 2);
    assert!(engine.connection(0).await.unwrap().is_closed());

    assert_eq!(
        registry.slots().drain_if_final("call-1").await?,
        Some("undelivered".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn test_restart_unknown_call_is_noop() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    assert!(!registry.restart("unknown-call").await?);
    assert_eq!(engine.connection_count().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_clones_share_state() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);
    let other = registry.clone();

    registry.create("call-1").await?;
    assert!(other.get("call-1").await.is_some());

    other.end("call-1").await;
    assert!(registry.get("call-1").await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_sessions_are_independent() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    let one = registry.create("call-1").await?;
    let two = registry.create("call-2").await?;

    // A final result on call-1 restarts only call-1's connection
    engine
        .connection(0)
        .await
        .unwrap()
        .emit(EngineEvent::final_result("only one"))
        .await;
    assert!(engine.wait_for_connections(3, Duration::from_secs(2)).await);

    one.forward(&[&[1]]).await?;
    two.forward(&[&[2]]).await?;

    assert_eq!(one.stats().restarts, 1);
    assert_eq!(two.stats().restarts, 0);
    assert_eq!(registry.slots().drain_if_final("call-2").await?, None);
    assert_eq!(
        registry.slots().drain_if_final("call-1").await?,
        Some("only one".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn test_shutdown_closes_everything() -> Result<()> {
    let engine = MockEngine::new();
    let registry = registry_with(&engine);

    registry.create("call-1").await?;
    registry.create("call-2").await?;
    assert_eq!(registry.call_ids().await, vec!["call-1", "call-2"]);

    registry.shutdown().await;

    assert!(registry.is_empty().await);
    assert!(engine.connection(0).await.unwrap().is_closed());
    assert!(engine.connection(1).await.unwrap().is_closed());

    Ok(())
}
