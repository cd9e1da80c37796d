
use anyhow::Result;
use autoquery_core::{key, QueryError, StoreError};

use crate::common::*;

#[tokio::test]
async fn test_get_by_primary_key() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let unforgiven: Movie = client.get("Movies", &MovieKey { director: EASTWOOD, title: "Unforgiven" }).await?;
    assert_eq!(unforgiven, movie(EASTWOOD, "Unforgiven", 1992, Some("Western"), Some(8.2)));

    let missing = client.get::<_, Movie>("Movies", &MovieKey { director: EASTWOOD, title: "Dirty Harry" }).await;
    assert!(matches!(missing, Err(QueryError::ItemNotFound)));
    Ok(())
}

#[tokio::test]
async fn test_put_replaces_and_is_queryable() -> Result<()> {
    let (store, client) = movies_client(100).await?;
    let movies = client.table("Movies");

    movies.put(&movie(EASTWOOD, "Pale Rider", 1985, Some("Western"), Some(7.4))).await?;
    movies.put(&movie(EASTWOOD, "Cry Macho", 2021, Some("Drama"), None)).await?;

    let pale_rider: Movie = movies.get(&MovieKey { director: EASTWOOD, title: "Pale Rider" }).await?;
    assert_eq!(pale_rider.rating, Some(7.4));

    let (found, _) = drain(&mut movies.query(key("director").equal(EASTWOOD).and("year").greater_than(2005))).await?;
    assert_eq!(titles(&found), vec!["Gran Torino", "Cry Macho"]);

    // a movie without a rating stays out of the rating-sorted index
    let catalog = client.catalog("Movies").await?;
    assert_eq!(catalog.primary().size, 10);
    assert_eq!(catalog.get("genreIndex").unwrap().size, 8);
    assert_eq!(store.describe_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_put_requires_key_attributes() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let err = client.put("Movies", &serde_json::json!({ "director": EASTWOOD, "year": 1971 })).await.unwrap_err();
    assert!(matches!(err, QueryError::Store(StoreError::Validation(_))));

    let err = client.put("Movies", &vec![1, 2, 3]).await.unwrap_err();
    assert!(matches!(err, QueryError::Codec(_)));
    Ok(())
}
