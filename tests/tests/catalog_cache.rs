
use anyhow::Result;
use autoquery_core::key;

use crate::common::*;

#[tokio::test]
async fn test_catalog_fetched_once_per_table() -> Result<()> {
    let (store, client) = movies_client(100).await?;

    for _ in 0..3 {
        let (movies, _) = drain(&mut client.query("Movies", key("director").equal(LEONE))).await?;
        assert_eq!(movies.len(), 3);
    }
    assert_eq!(store.describe_calls(), 1);
    assert_eq!(client.cached_tables(), 1);

    // clones share the cache
    let clone = client.clone();
    clone.plan("Movies", &key("director").equal(EASTWOOD)).await?;
    assert_eq!(store.describe_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_stale_catalog_until_forgotten() -> Result<()> {
    let (store, client) = movies_client(100).await?;
    let expr = key("director").equal(EASTWOOD).and("awards").greater_than(0);

    assert_eq!(client.plan("Movies", &expr).await?.index.name, "awardIndex");

    // the index gains items but the cached catalog still reports it empty
    let mut item = autoquery_core::codec::to_item(&movie(EASTWOOD, "Unforgiven", 1992, Some("Western"), Some(8.2)))?;
    item.insert("awards".into(), 4.into());
    store.load("Movies", [item])?;
    assert_eq!(client.catalog("Movies").await?.get("awardIndex").unwrap().size, 0);

    assert!(client.forget_table("Movies"));
    assert!(!client.forget_table("Movies"));
    let catalog = client.catalog("Movies").await?;
    assert_eq!(catalog.get("awardIndex").unwrap().size, 1);
    assert_eq!(store.describe_calls(), 2);

    // now scored on its real size rather than short-circuiting
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, "awardIndex");
    assert_eq!(plan.score, 9.0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_first_queries() -> Result<()> {
    let (store, client) = movies_client(100).await?;

    let expr = key("director").equal(EASTWOOD);
    let (a, b) = tokio::join!(client.plan("Movies", &expr), client.plan("Movies", &expr));
    assert_eq!(a?.index.name, b?.index.name);
    assert_eq!(client.cached_tables(), 1);
    assert!(store.describe_calls() <= 2);
    Ok(())
}
