//! HTTP client integration tests
//!
//! `ZenodoClient` and `HttpImageProbe` against a local mock server standing
//! in for the records API and the IIIF image service.

mod helpers;

use helpers::photo;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zgal_common::config::ApiConfig;
use zgal_gallery::api::{CollectionId, PageCursor, PageSource, ZenodoClient};
use zgal_gallery::fetcher::{fetch_approximate_total, CursorState, RecordFetcher};
use zgal_gallery::render::{HttpImageProbe, ImageLoad, ImageProbe};
use zgal_gallery::GalleryError;

fn client_for(server: &MockServer) -> Arc<ZenodoClient> {
    let config = ApiConfig {
        records_url: format!("{}/api/records", server.uri()),
        page_size: 2,
        ..ApiConfig::default()
    };
    Arc::new(ZenodoClient::new(&config).unwrap())
}

fn list_body(hits: Vec<Value>, total: Option<u64>, next: Option<String>) -> Value {
    json!({
        "hits": {"hits": hits, "total": total},
        "links": {"next": next}
    })
}

/// First page of `community`, as requested by the client
fn first_page(community: &str) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .and(query_param("community", community))
        .and(query_param("type", "image"))
        .and(query_param("size", "2"))
        .and(query_param("sort", "newest"))
}

fn count_request(community: &str) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .and(query_param("community", community))
        .and(query_param("size", "1"))
}

fn record_ids(fetcher: &RecordFetcher) -> Vec<String> {
    fetcher
        .state()
        .records()
        .iter()
        .map(|r| r.id.to_string())
        .collect()
}

#[tokio::test]
async fn test_next_link_is_followed_verbatim() {
    let server = MockServer::start().await;
    let next = format!("{}/api/records?page=2&size=2&token=c2VhcmNo", server.uri());

    first_page("euraf-media")
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            vec![photo(1, None, &[]), photo(2, None, &[])],
            Some(3),
            Some(next),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .and(query_param("page", "2"))
        .and(query_param("token", "c2VhcmNo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            vec![photo(3, None, &[])],
            Some(3),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = RecordFetcher::new(client_for(&server), vec![CollectionId::from("euraf-media")]);
    while fetcher.next_batch().await.is_some() {}

    assert_eq!(record_ids(&fetcher), vec!["1", "2", "3"]);
    assert!(!fetcher.state().is_partial());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].url.query(),
        Some("community=euraf-media&type=image&size=2&sort=newest")
    );
    assert_eq!(requests[1].url.query(), Some("page=2&size=2&token=c2VhcmNo"));
}

#[tokio::test]
async fn test_server_error_on_second_page_keeps_first_page() {
    let server = MockServer::start().await;
    let next = format!("{}/api/records?page=2", server.uri());

    first_page("euraf-media")
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            vec![photo(1, None, &[]), photo(2, None, &[])],
            Some(6),
            Some(next.clone()),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let collection = CollectionId::from("euraf-media");

    let mut fetcher = RecordFetcher::new(client.clone(), vec![collection.clone()]);
    while fetcher.next_batch().await.is_some() {}

    let state = fetcher.state();
    assert_eq!(state.loaded(), 2);
    assert!(state.is_partial());
    assert_eq!(state.cursor(&collection), Some(&CursorState::Failed));
    assert_eq!(state.failures().len(), 1);
    assert!(state.failures()[0].error.contains("HTTP 500"));

    let err = client
        .fetch_page(&collection, Some(&PageCursor::new(next)))
        .await
        .unwrap_err();
    assert!(matches!(err, GalleryError::HttpStatus { status: 500, .. }));
    assert!(err.ends_collection());
}

#[tokio::test]
async fn test_unreadable_body_is_invalid_response() {
    let server = MockServer::start().await;

    first_page("euraf-media")
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;
    first_page("agroforestry")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    for community in ["euraf-media", "agroforestry"] {
        let err = client
            .fetch_page(&CollectionId::from(community), None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, GalleryError::InvalidResponse { .. }),
            "{}: {:?}",
            community,
            err
        );
    }
}

#[tokio::test]
async fn test_count_request_reads_reported_total() {
    let server = MockServer::start().await;

    count_request("euraf-media")
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            vec![photo(1, None, &[])],
            Some(6),
            None,
        )))
        .mount(&server)
        .await;
    count_request("agroforestry")
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            vec![photo(2, None, &[])],
            Some(4),
            None,
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.fetch_total(&CollectionId::from("euraf-media")).await.unwrap(), 6);

    let sources = [CollectionId::from("euraf-media"), CollectionId::from("agroforestry")];
    assert_eq!(fetch_approximate_total(client.as_ref(), &sources).await, Some(10));

    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| r.url.query_pairs().any(|(k, v)| k == "size" && v == "1")));
}

#[tokio::test]
async fn test_count_without_total_is_unavailable() {
    let server = MockServer::start().await;

    count_request("euraf-media")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": {"hits": []}})))
        .mount(&server)
        .await;
    count_request("agroforestry")
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    for community in ["euraf-media", "agroforestry"] {
        let err = client
            .fetch_total(&CollectionId::from(community))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::CountUnavailable(_)), "{}: {:?}", community, err);
    }
}

#[tokio::test]
async fn test_image_probe_status_handling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/iiif/present.jpg/full/500,/0/default.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/iiif/missing.jpg/full/500,/0/default.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = HttpImageProbe::new(reqwest::Client::new());

    let loaded = probe
        .load(&format!("{}/iiif/present.jpg/full/500,/0/default.png", server.uri()))
        .await;
    assert_eq!(loaded, ImageLoad::Loaded);

    let missing = probe
        .load(&format!("{}/iiif/missing.jpg/full/500,/0/default.png", server.uri()))
        .await;
    assert_eq!(missing, ImageLoad::Failed("HTTP 404".to_string()));
}
