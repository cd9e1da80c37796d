
use std::time::Duration;

use anyhow::Result;
use autoquery_core::{key, Client, ClientConfig, CompletionReason, QueryError, StoreError};
use futures::StreamExt;

use crate::common::*;

#[tokio::test]
async fn test_failed_page_is_retried() -> Result<()> {
    let (store, client) = movies_client(2).await?;
    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD));

    store.throttle_next_pages(1);
    assert!(matches!(cursor.next().await, Err(QueryError::Store(StoreError::Throttled(_)))));
    assert_eq!(cursor.pages_fetched(), 0);
    assert!(cursor.request().is_none());

    assert_eq!(cursor.next().await?.title, "Gran Torino");
    assert_eq!(cursor.next().await?.title, "Million Dollar Baby");
    let before = cursor.continuation_key().cloned();

    // failing mid-query leaves the continuation key where it was
    store.throttle_next_pages(2);
    assert!(cursor.next().await.is_err());
    assert!(cursor.next().await.is_err());
    assert_eq!(cursor.continuation_key().cloned(), before);
    assert_eq!(cursor.pages_fetched(), 1);

    let (rest, reason) = drain(&mut cursor).await?;
    assert_eq!(titles(&rest), vec!["Mystic River", "Pale Rider", "The Outlaw Josey Wales", "Unforgiven"]);
    assert_eq!(reason, CompletionReason::AllItemsParsed);
    Ok(())
}

#[tokio::test]
async fn test_fetch_timeout() -> Result<()> {
    let store = movies_store(2).await?;
    let client = Client::new(store.clone(), ClientConfig::default().with_fetch_timeout(Duration::from_millis(50)));
    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD));

    assert_eq!(cursor.next().await?.title, "Gran Torino");
    assert_eq!(cursor.next().await?.title, "Million Dollar Baby");

    store.set_latency(Some(Duration::from_millis(500)));
    assert!(matches!(cursor.next().await, Err(QueryError::Timeout)));
    assert_eq!(cursor.pages_fetched(), 1);

    store.set_latency(None);
    assert_eq!(cursor.next().await?.title, "Mystic River");
    Ok(())
}

#[tokio::test]
async fn test_next_within_deadline() -> Result<()> {
    let (store, client) = movies_client(2).await?;
    let mut cursor = client.query::<Movie>("Movies", key("director").equal(LEONE));

    store.set_latency(Some(Duration::from_millis(500)));
    assert!(matches!(cursor.next_within(Duration::from_millis(20)).await, Err(QueryError::Timeout)));
    assert_eq!(cursor.pages_fetched(), 0);

    store.set_latency(None);
    assert_eq!(cursor.next_within(Duration::from_secs(5)).await?.title, "Duck, You Sucker");
    Ok(())
}

#[tokio::test]
async fn test_stream_stops_after_error() -> Result<()> {
    let (store, client) = movies_client(2).await?;

    store.throttle_next_pages(1);
    let results: Vec<_> = client.query::<Movie>("Movies", key("director").equal(LEONE)).into_stream().collect().await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(QueryError::Store(StoreError::Throttled(_)))));
    Ok(())
}

#[tokio::test]
async fn test_unknown_table() -> Result<()> {
    let (store, client) = movies_client(2).await?;

    let mut cursor = client.query::<Movie>("Shows", key("network").equal("HBO"));
    assert!(matches!(cursor.next().await, Err(QueryError::Store(StoreError::TableNotFound(name))) if name == "Shows"));
    assert_eq!(client.cached_tables(), 0);
    assert_eq!(store.execute_calls(), 0);
    Ok(())
}
