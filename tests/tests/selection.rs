
use anyhow::Result;
use autoquery_core::{catalog::PRIMARY_INDEX_NAME, key, selector, AttributeValue, Client, ClientConfig, CompletionReason, QueryError, RawCodec};

use crate::common::*;

#[tokio::test]
async fn test_sort_key_range_prefers_local_index() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let expr = key("director").equal(EASTWOOD).and("year").between(1990, 2005);
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, "yearIndex");
    assert_eq!(plan.score, 1.8);

    let rendered = plan.rendered();
    assert_eq!(rendered.key_condition_expression, "#n0 = :v0 AND #n1 BETWEEN :v1 AND :v2");
    assert_eq!(rendered.expression_attribute_names["#n1"], "year");
    assert_eq!(rendered.filter_expression, None);

    let (movies, reason) = drain(&mut client.query("Movies", expr)).await?;
    assert_eq!(titles(&movies), vec!["Unforgiven", "Mystic River", "Million Dollar Baby"]);
    assert_eq!(reason, CompletionReason::AllItemsParsed);
    Ok(())
}

#[tokio::test]
async fn test_partition_only_uses_primary() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let expr = key("director").equal(EASTWOOD);
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, PRIMARY_INDEX_NAME);
    assert_eq!(plan.request.index_name, None);

    let (movies, _) = drain(&mut client.query("Movies", expr)).await?;
    assert_eq!(
        titles(&movies),
        vec!["Gran Torino", "Million Dollar Baby", "Mystic River", "Pale Rider", "The Outlaw Josey Wales", "Unforgiven"]
    );
    Ok(())
}

#[tokio::test]
async fn test_order_by_routes_to_matching_sort_key() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let expr = key("director").equal(EASTWOOD).order_by("year", false);
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, "yearIndex");
    assert!(!plan.request.scan_forward);

    let (movies, _) = drain(&mut client.query("Movies", expr)).await?;
    assert_eq!(movies.iter().map(|m| m.year).collect::<Vec<_>>(), vec![2008, 2004, 2003, 1992, 1985, 1976]);
    Ok(())
}

#[tokio::test]
async fn test_non_key_conditions_become_filters() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let expr = key("director").equal(EASTWOOD).and("genre").equal("Western");
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, PRIMARY_INDEX_NAME);
    assert_eq!(plan.rendered().filter_expression.as_deref(), Some("#n1 = :v1"));

    let (movies, _) = drain(&mut client.query("Movies", expr)).await?;
    assert_eq!(titles(&movies), vec!["Pale Rider", "The Outlaw Josey Wales", "Unforgiven"]);
    Ok(())
}

#[tokio::test]
async fn test_no_viable_index_reports_every_infraction() -> Result<()> {
    let (store, client) = movies_client(100).await?;

    let mut cursor = client.query::<Movie>("Movies", key("genre").equal("Western"));
    match cursor.next().await {
        Err(QueryError::NoViableIndex(err)) => {
            assert_eq!(err.indexes.len(), 4);
            let message = err.to_string();
            assert!(message.starts_with("no viable indexes found for expression: "));
            assert!(message.contains("missing Equal condition on attribute: director"));
            assert!(message.contains("expression does not filter on sparse secondary index's sort key: rating"));
            assert!(message.contains("\"notViableReasons\""));
        }
        other => panic!("expected no viable index, got {:?}", other.map(|m| m.title)),
    }
    assert_eq!(store.execute_calls(), 0);
    assert_eq!(cursor.pages_fetched(), 0);
    Ok(())
}

#[tokio::test]
async fn test_keys_only_global_index() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let expr = key("genre").equal("Western").and("rating").greater_than(8.0).select(["director", "title", "rating"]);
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, "genreIndex");
    assert_eq!(plan.score, 9.0 / 8.0);

    let mut cursor = client.query_with_codec("Movies", expr.clone(), RawCodec);
    let mut found = Vec::new();
    while let Ok(item) = cursor.next().await {
        assert_eq!(item.len(), 3);
        found.push(item["title"].clone());
    }
    assert_eq!(
        found,
        vec![
            AttributeValue::from("Unforgiven"),
            AttributeValue::from("Once Upon a Time in the West"),
            AttributeValue::from("The Good, the Bad and the Ugly")
        ]
    );

    // the index projects keys only
    let wider = expr.clone().select(["year"]);
    let err = client.plan("Movies", &wider).await.unwrap_err();
    assert!(err.to_string().contains("index does not include attributes: year"));

    // and, being global, cannot serve consistent reads
    let err = client.plan("Movies", &expr.consistent_read(true)).await.unwrap_err();
    assert!(err.to_string().contains("global secondary index does not support consistent read"));
    Ok(())
}

#[tokio::test]
async fn test_empty_index_wins_outright() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let expr = key("director").equal(EASTWOOD).and("awards").greater_than(0);
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, "awardIndex");
    assert_eq!(plan.score, f64::MAX);

    let (movies, reason) = drain(&mut client.query("Movies", expr)).await?;
    assert!(movies.is_empty());
    assert_eq!(reason, CompletionReason::AllItemsParsed);
    Ok(())
}

#[tokio::test]
async fn test_sparsity_threshold_controls_viability() -> Result<()> {
    let store = movies_store(100).await?;
    let expr = key("director").equal(EASTWOOD);

    let strict = Client::new(store.clone(), ClientConfig::default());
    let catalog = strict.catalog("Movies").await?;
    assert!(catalog.get("yearIndex").unwrap().is_sparse);
    assert!(selector::evaluate(catalog.get("yearIndex").unwrap(), &expr).is_err());

    let relaxed = Client::new(store, ClientConfig::default().with_sparsity_threshold(0.5));
    let catalog = relaxed.catalog("Movies").await?;
    let year_index = catalog.get("yearIndex").unwrap();
    assert!(!year_index.is_sparse);
    assert_eq!(selector::evaluate(year_index, &expr).ok(), Some(0.2));
    assert!(catalog.get("awardIndex").unwrap().is_sparse);

    // the primary index ties with yearIndex and comes first
    assert_eq!(relaxed.plan("Movies", &expr).await?.index.name, PRIMARY_INDEX_NAME);
    Ok(())
}

#[tokio::test]
async fn test_empty_selection_returns_whole_items() -> Result<()> {
    let (_store, client) = movies_client(100).await?;

    let expr = key("director").equal(LEONE).select(Vec::<String>::new());
    let plan = client.plan("Movies", &expr).await?;
    assert_eq!(plan.index.name, PRIMARY_INDEX_NAME);
    assert_eq!(plan.request.projection, None);
    assert_eq!(plan.rendered().projection_expression, None);

    let (movies, _) = drain(&mut client.query("Movies", expr.clone())).await?;
    assert_eq!(movies.len(), 3);
    assert_eq!(movies[0], movie(LEONE, "Duck, You Sucker", 1971, None, None));

    let mut raw = client.query_with_codec("Movies", expr, RawCodec);
    assert_eq!(raw.next().await?.len(), 3);
    Ok(())
}
