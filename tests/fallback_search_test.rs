//! Tests for the in-memory fallback search backend

use chrono::{TimeZone, Utc};
use extension_registry::models::{ExtensionSnapshot, MembershipRole};
use extension_registry::registry::InMemoryRegistry;
use extension_registry::search::{
    PageRequest, QueryOptions, SearchBackendKind, SearchConfigBuilder, SearchService, SortBy,
    SortOrder,
};
use std::sync::Arc;

fn create_service(registry: Arc<InMemoryRegistry>) -> SearchService {
    let config = SearchConfigBuilder::new()
        .backend(SearchBackendKind::Fallback)
        .build();
    SearchService::new(config, registry).unwrap()
}

/// Publish a verified extension with the given rating and download count
fn publish_extension(
    registry: &InMemoryRegistry,
    id: i64,
    name: &str,
    namespace: &str,
    average_rating: f64,
    review_count: i64,
    download_count: i64,
    categories: &[&str],
) {
    let mut ext = ExtensionSnapshot::new(id, namespace, name);
    ext.average_rating = Some(average_rating);
    ext.download_count = download_count;
    ext.categories = categories.iter().map(|c| c.to_string()).collect();
    ext.timestamp = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
    ext.published_by = Some("publisher".to_string());
    registry.publish(ext);
    registry.set_rating(id, Some(average_rating), review_count).unwrap();
    registry.add_membership(namespace, "owner", MembershipRole::Owner);
    registry.add_membership(namespace, "publisher", MembershipRole::Contributor);
}

fn options(sort_by: SortBy, sort_order: SortOrder) -> QueryOptions {
    QueryOptions::new(None, None, 50, 0, sort_order, sort_by, false)
}

fn query_options(query: &str) -> QueryOptions {
    QueryOptions::new(
        Some(query.to_string()),
        None,
        50,
        0,
        SortOrder::Asc,
        SortBy::Relevance,
        false,
    )
}

fn page(number: usize, size: usize) -> PageRequest {
    PageRequest::of(number, size).unwrap()
}

#[tokio::test]
async fn test_category_filter() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 3.0, 100, 0, &["Snippets", "Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 4.0, 100, 0, &["Snippets", "Programming Languages"]);
    publish_extension(&registry, 3, "openshift", "redhat", 4.0, 100, 0, &["Snippets", "Other"]);
    let service = create_service(registry);

    let mut opts = options(SortBy::Relevance, SortOrder::Asc);
    opts.category = Some("Programming Languages".to_string());
    let result = service.search(&opts, &page(0, 50)).await.unwrap();

    // The extension categorized only as "Other" must not appear
    assert_eq!(result.total_hits, 2);
    assert!(!result.extension_ids.contains(&3));
}

#[tokio::test]
async fn test_relevance_order() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 1.0, 100, 100, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 4.0, 100, 10000, &["Programming Languages"]);
    publish_extension(&registry, 3, "openshift", "redhat", 1.0, 100, 10, &["Other"]);
    let service = create_service(registry);

    let result = service
        .search(&options(SortBy::Relevance, SortOrder::Asc), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 3);
    // java carries the best rating and by far the most downloads
    assert_eq!(result.extension_ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn test_relevance_order_reversed() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 3.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 4.0, 100, 0, &["Programming Languages"]);
    let service = create_service(registry);

    let mut opts = options(SortBy::Relevance, SortOrder::Desc);
    opts.category = Some("Programming Languages".to_string());
    let result = service.search(&opts, &page(0, 50)).await.unwrap();

    assert_eq!(result.total_hits, 2);
    assert_eq!(result.extension_ids, vec![2, 1]);
}

#[tokio::test]
async fn test_page_size_limits_results() {
    let registry = Arc::new(InMemoryRegistry::new());
    for id in 1..=7 {
        publish_extension(
            &registry,
            id,
            &format!("ext{}", id),
            "redhat",
            3.0,
            100,
            0,
            &["Programming Languages"],
        );
    }
    let service = create_service(registry);

    let result = service
        .search(&options(SortBy::Relevance, SortOrder::Asc), &page(0, 5))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 7);
    assert_eq!(result.extension_ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_pages_are_stable() {
    let registry = Arc::new(InMemoryRegistry::new());
    for id in 1..=7 {
        publish_extension(
            &registry,
            id,
            &format!("ext{}", id),
            "redhat",
            3.0,
            100,
            0,
            &["Programming Languages"],
        );
    }
    let service = create_service(registry);
    let opts = options(SortBy::Relevance, SortOrder::Asc);

    let result = service.search(&opts, &page(2, 2)).await.unwrap();
    assert_eq!(result.total_hits, 7);
    assert_eq!(result.extension_ids, vec![5, 6]);

    // Scores are recomputed per call, yet pagination must not wobble
    for _ in 0..5 {
        let again = service.search(&opts, &page(2, 2)).await.unwrap();
        assert_eq!(again, result);
    }
}

#[tokio::test]
async fn test_query_matches_namespace() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 3.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 4.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 3, "openshift", "redhat", 4.0, 100, 0, &["Other"]);
    publish_extension(&registry, 4, "foo", "bar", 4.0, 100, 0, &["Other"]);
    let service = create_service(registry);

    let result = service
        .search(&query_options("redhat"), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 3);
    assert_eq!(result.extension_ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_query_matches_extension_name() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 3.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 4.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 3, "openshift", "redhat", 4.0, 100, 0, &["Other"]);
    publish_extension(&registry, 4, "foo", "bar", 4.0, 100, 0, &["Other"]);
    let service = create_service(registry);

    let result = service
        .search(&query_options("openshift"), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 1);
    assert_eq!(result.extension_ids, vec![3]);
}

#[tokio::test]
async fn test_query_matches_description() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 3.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 4.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 3, "openshift", "redhat", 4.0, 100, 0, &["Other"]);

    let mut ext = ExtensionSnapshot::new(4, "bar", "foo");
    ext.description = Some("my custom desc".to_string());
    registry.publish(ext);
    let service = create_service(registry);

    let result = service
        .search(&query_options("my custom desc"), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 1);
    assert_eq!(result.extension_ids, vec![4]);
}

#[tokio::test]
async fn test_query_matches_display_name() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "ns1", 3.0, 100, 0, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "ns1", 4.0, 100, 0, &["Programming Languages"]);

    let mut ext = ExtensionSnapshot::new(3, "ns2", "tooling");
    ext.display_name = Some("Red Hat".to_string());
    registry.publish(ext);
    let service = create_service(registry);

    let result = service
        .search(&query_options("Red Hat"), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 1);
    assert_eq!(result.extension_ids, vec![3]);
}

#[tokio::test]
async fn test_sort_by_timestamp() {
    let registry = Arc::new(InMemoryRegistry::new());
    let timestamps = [
        (1, "yaml", "2021-10-10"),
        (2, "java", "2021-10-07"),
        (3, "openshift", "2021-10-11"),
        (4, "foo", "2021-10-06"),
    ];
    for (id, name, date) in timestamps {
        publish_extension(&registry, id, name, "redhat", 4.0, 100, 0, &["Other"]);
        let mut ext = ExtensionSnapshot::new(id, "redhat", name);
        ext.average_rating = Some(4.0);
        ext.timestamp = format!("{}T00:00:00Z", date).parse().unwrap();
        ext.categories = vec!["Other".to_string()];
        registry.publish(ext);
    }
    let service = create_service(registry);

    let result = service
        .search(&options(SortBy::Timestamp, SortOrder::Asc), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 4);
    assert_eq!(result.extension_ids, vec![4, 2, 1, 3]);
}

#[tokio::test]
async fn test_sort_by_download_count() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 3.0, 100, 100, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 4.0, 100, 1000, &["Programming Languages"]);
    publish_extension(&registry, 3, "openshift", "redhat", 4.0, 100, 300, &["Other"]);
    publish_extension(&registry, 4, "foo", "bar", 4.0, 100, 500, &["Other"]);
    let service = create_service(registry);

    let result = service
        .search(&options(SortBy::DownloadCount, SortOrder::Desc), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 4);
    // java, foo, openshift, yaml
    assert_eq!(result.extension_ids, vec![2, 4, 3, 1]);
}

#[tokio::test]
async fn test_sort_by_average_rating() {
    let registry = Arc::new(InMemoryRegistry::new());
    publish_extension(&registry, 1, "yaml", "redhat", 4.0, 0, 0, &["Programming Languages"]);
    publish_extension(&registry, 2, "java", "redhat", 5.0, 0, 0, &["Programming Languages"]);
    publish_extension(&registry, 3, "openshift", "redhat", 2.0, 0, 0, &["Other"]);
    publish_extension(&registry, 4, "foo", "bar", 1.0, 0, 0, &["Other"]);
    let service = create_service(registry);

    let result = service
        .search(&options(SortBy::AverageRating, SortOrder::Asc), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total_hits, 4);
    assert_eq!(result.extension_ids, vec![4, 3, 1, 2]);
}

#[tokio::test]
async fn test_unverified_ranks_below_verified() {
    let registry = Arc::new(InMemoryRegistry::new());
    // Identical metadata; only the namespace verification differs
    publish_extension(&registry, 1, "alpha", "verified-ns", 4.0, 50, 1000, &["Other"]);
    let mut unverified = ExtensionSnapshot::new(2, "rogue-ns", "alpha");
    unverified.average_rating = Some(4.0);
    unverified.download_count = 1000;
    unverified.categories = vec!["Other".to_string()];
    unverified.timestamp = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
    unverified.published_by = Some("publisher".to_string());
    registry.publish(unverified);
    registry.set_rating(2, Some(4.0), 50).unwrap();
    let service = create_service(registry);

    let result = service
        .search(&options(SortBy::Relevance, SortOrder::Desc), &page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.extension_ids, vec![1, 2]);
}

#[tokio::test]
async fn test_invalid_page_size_rejected() {
    let registry = Arc::new(InMemoryRegistry::new());
    let service = create_service(registry);

    let mut opts = options(SortBy::Relevance, SortOrder::Asc);
    opts.requested_size = 0;
    let result = service.search(&opts, &page(0, 50)).await;
    assert!(result.is_err());
}
