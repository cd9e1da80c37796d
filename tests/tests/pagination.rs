//! Cursor pagination over the memory store: page caps, per-page limits, continuation keys and filtered pages.


use anyhow::Result;
use autoquery_core::{key, AttributeValue, CompletionReason, CursorState, QueryError};
use futures::StreamExt;

use crate::common::*;

const EASTWOOD_BY_TITLE: [&str; 6] = ["Gran Torino", "Million Dollar Baby", "Mystic River", "Pale Rider", "The Outlaw Josey Wales", "Unforgiven"];

#[tokio::test]
async fn test_pages_until_exhausted() -> Result<()> {
    let (store, client) = movies_client(2).await?;

    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD));
    assert_eq!(cursor.state(), CursorState::Fresh);

    let (movies, reason) = drain(&mut cursor).await?;
    assert_eq!(titles(&movies), EASTWOOD_BY_TITLE);
    assert_eq!(reason, CompletionReason::AllItemsParsed);
    assert_eq!(cursor.pages_fetched(), 3);
    assert_eq!(store.execute_calls(), 3);
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(cursor.continuation_key().is_none());

    // completion is sticky and fetches nothing further
    assert!(matches!(cursor.next().await, Err(QueryError::ParsingComplete(CompletionReason::AllItemsParsed))));
    assert_eq!(store.execute_calls(), 3);
    Ok(())
}

#[tokio::test]
async fn test_max_pagination_caps_fetches() -> Result<()> {
    let (store, client) = movies_client(2).await?;

    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD));
    cursor.set_max_pagination(2);

    let (movies, reason) = drain(&mut cursor).await?;
    assert_eq!(titles(&movies), &EASTWOOD_BY_TITLE[..4]);
    assert_eq!(reason, CompletionReason::MaxPaginationReached);
    assert_eq!(cursor.state(), CursorState::Capped);
    assert_eq!(store.execute_calls(), 2);

    // lifting the cap lets the same cursor carry on from where it stopped
    cursor.unset_max_pagination();
    let (rest, reason) = drain(&mut cursor).await?;
    assert_eq!(titles(&rest), &EASTWOOD_BY_TITLE[4..]);
    assert_eq!(reason, CompletionReason::AllItemsParsed);
    Ok(())
}

#[tokio::test]
async fn test_zero_cap_fetches_nothing() -> Result<()> {
    let (store, client) = movies_client(2).await?;

    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD));
    cursor.set_max_pagination(0);
    assert!(matches!(cursor.next().await, Err(QueryError::ParsingComplete(CompletionReason::MaxPaginationReached))));
    assert_eq!(store.execute_calls(), 0);
    assert_eq!(store.describe_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_limit_per_page() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD));
    cursor.set_limit_per_page(4).set_max_pagination(1);
    let (movies, _) = drain(&mut cursor).await?;
    assert_eq!(movies.len(), 4);
    assert_eq!(cursor.request().and_then(|r| r.limit), Some(4));

    // the store's page size still bounds a larger limit
    let (_store, client) = movies_client(2).await?;
    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD));
    cursor.set_limit_per_page(50).set_max_pagination(1);
    let (movies, _) = drain(&mut cursor).await?;
    assert_eq!(movies.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_filter_applies_after_limit() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    // the first page only evaluates Gran Torino and Million Dollar Baby, neither of them a western
    let mut cursor = client.query::<Movie>("Movies", key("director").equal(EASTWOOD).and("genre").equal("Western"));
    cursor.set_limit_per_page(2);

    let (movies, _) = drain(&mut cursor).await?;
    assert_eq!(titles(&movies), vec!["Pale Rider", "The Outlaw Josey Wales", "Unforgiven"]);
    assert_eq!(cursor.pages_fetched(), 3);

    let mut capped = client.query::<Movie>("Movies", key("director").equal(EASTWOOD).and("genre").equal("Western"));
    capped.set_limit_per_page(2).set_max_pagination(1);
    let (movies, reason) = drain(&mut capped).await?;
    assert!(movies.is_empty());
    assert_eq!(reason, CompletionReason::MaxPaginationReached);
    assert!(capped.continuation_key().is_some());
    Ok(())
}

#[tokio::test]
async fn test_resume_from_continuation_key() -> Result<()> {
    let (_store, client) = movies_client(100).await?;
    let expr = key("director").equal(EASTWOOD).order_by("year", true);

    let mut first = client.query::<Movie>("Movies", expr.clone());
    first.set_limit_per_page(3).set_max_pagination(1);
    let (movies, _) = drain(&mut first).await?;
    assert_eq!(movies.iter().map(|m| m.year).collect::<Vec<_>>(), vec![1976, 1985, 1992]);

    let resume_at = first.continuation_key().cloned().expect("continuation key after a partial page");
    assert_eq!(resume_at["year"], AttributeValue::Integer(1992));

    let mut second = client.query::<Movie>("Movies", expr);
    second.set_exclusive_start_key(resume_at);
    let (movies, reason) = drain(&mut second).await?;
    assert_eq!(movies.iter().map(|m| m.year).collect::<Vec<_>>(), vec![2003, 2004, 2008]);
    assert_eq!(reason, CompletionReason::AllItemsParsed);
    Ok(())
}

#[tokio::test]
async fn test_stream_adapter() -> Result<()> {
    let (_store, client) = movies_client(2).await?;

    let movies: Vec<Movie> = client
        .table("Movies")
        .query::<Movie>(key("director").equal(LEONE))
        .into_stream()
        .map(|result| result.map_err(anyhow::Error::from))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<_>>()?;
    assert_eq!(titles(&movies), vec!["Duck, You Sucker", "Once Upon a Time in the West", "The Good, the Bad and the Ugly"]);
    Ok(())
}
