//! Integration tests for the Neo4j store adapter
//!
//! These tests require a running Neo4j instance. Connection details come
//! from `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD` and `NEO4J_DATABASE`.
//! Each test writes its own facts under a unique prefix and removes them
//! afterwards.

use interlang_kg::{
    CacheConfig, CachedLanguageTargetLinks, DataItem, InterlanguageLink, InterlanguageLinksLookup,
    MemoryCache, Neo4jSettings, Neo4jStore, Property, PropertyRegistry, SemanticStore, Title,
    WikiPage,
};
use neo4rs::query;
use std::sync::Arc;

async fn connect() -> Neo4jStore {
    Neo4jStore::connect(&Neo4jSettings::from_env())
        .await
        .expect("Failed to connect to Neo4j")
}

fn prefix() -> String {
    format!("sil_test_{}", rand::random::<u32>())
}

/// Write one fact the way the ingestion pipeline does
async fn assert_fact(
    store: &Neo4jStore,
    subject: &WikiPage,
    property: &Property,
    value: &DataItem,
    seq: i64,
) {
    store
        .graph()
        .run(
            query(
                "MERGE (s:DataItem {key: $subject})
                 MERGE (o:DataItem {key: $object})
                 CREATE (s)-[:PROPERTY {key: $property, seq: $seq}]->(o)",
            )
            .param("subject", DataItem::WikiPage(subject.clone()).serialization())
            .param("object", value.serialization())
            .param("property", property.key().to_string())
            .param("seq", seq),
        )
        .await
        .expect("Failed to write fact");
}

async fn record_link(store: &Neo4jStore, link: &InterlanguageLink, target: &Title, seq: i64) {
    let container = WikiPage::with_subobject(target.clone(), link.container_id());
    assert_fact(
        store,
        &container,
        &PropertyRegistry::reference(),
        link.link_reference_data_value().data_item(),
        seq,
    )
    .await;
    assert_fact(
        store,
        &container,
        &PropertyRegistry::language(),
        link.language_data_value().data_item(),
        seq + 1,
    )
    .await;
    assert_fact(
        store,
        &WikiPage::from_title(target),
        &PropertyRegistry::container(),
        &DataItem::WikiPage(container),
        seq + 2,
    )
    .await;
}

async fn cleanup(store: &Neo4jStore, prefix: &str) {
    store
        .graph()
        .run(
            query("MATCH (n:DataItem) WHERE n.key CONTAINS $prefix DETACH DELETE n")
                .param("prefix", prefix.to_string()),
        )
        .await
        .expect("Failed to clean up test data");
}

#[tokio::test]
#[ignore] // Run with: cargo test --ignored
async fn test_health_check() {
    let store = connect().await;
    assert!(store.health_check().await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_property_values_in_assertion_order() {
    let store = connect().await;
    let prefix = prefix();
    let subject = WikiPage::new(Title::new(format!("{}_Foo", prefix)));
    let property = Property::new(format!("{}_p", prefix));

    assert_fact(&store, &subject, &property, &DataItem::Blob(format!("{}_b", prefix)), 2).await;
    assert_fact(&store, &subject, &property, &DataItem::Blob(format!("{}_a", prefix)), 1).await;

    let values = store.get_property_values(&subject, &property).await.unwrap();
    assert_eq!(
        values,
        vec![
            DataItem::Blob(format!("{}_a", prefix)),
            DataItem::Blob(format!("{}_b", prefix)),
        ]
    );

    cleanup(&store, &prefix).await;
}

#[tokio::test]
#[ignore]
async fn test_lookup_against_neo4j() {
    let store = Arc::new(connect().await);
    let prefix = prefix();
    let reference = Title::new(format!("{}_Topic", prefix));
    let foo = Title::new(format!("{}_Foo", prefix));
    let foo_de = Title::new(format!("{}_Foo_de", prefix));

    record_link(&store, &InterlanguageLink::new(foo.clone(), "en", reference.clone()), &foo, 1).await;
    record_link(&store, &InterlanguageLink::new(foo_de.clone(), "de", reference.clone()), &foo_de, 4).await;

    let cache = Arc::new(CachedLanguageTargetLinks::new(Arc::new(MemoryCache::new(
        CacheConfig::default(),
    ))));
    let lookup = InterlanguageLinksLookup::new(cache, store.clone());

    let topic_link = InterlanguageLink::new(foo.clone(), "en", reference.clone());
    let links = lookup.query_language_target_links(&topic_link).await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links.get("en"), Some(&foo));
    assert_eq!(links.get("de"), Some(&foo_de));

    assert_eq!(lookup.find_last_page_language_for_target(&foo_de).await.unwrap(), "de");

    let event = lookup
        .do_invalidate_cached_language_target_links(&foo)
        .await
        .unwrap();
    assert_eq!(event.removed, 1);
    assert!(lookup.try_cached_language_target_links(&topic_link).await.unwrap().is_none());

    cleanup(&store, &prefix).await;
}
