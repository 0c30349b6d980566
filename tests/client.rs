//! HTTP behaviour of the CiNii client against a mock server.

use rustcinii::client::CiniiClient;
use rustcinii::opensearch::{ItemsPerPage, OpenSearchQuery, SearchType};
use rustcinii::paginate::fetch_pages;
use rustcinii::CiniiError;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CiniiClient {
    CiniiClient::with_base_url(&server.uri(), Some("test-app".to_string()))
        .expect("client")
        .with_interval(Duration::ZERO)
}

fn page(total: u64, start: u64, items: usize) -> Value {
    let items: Vec<Value> = (0..items)
        .map(|i| {
            json!({
                "@id": format!("https://cir.nii.ac.jp/crid/{}", start + i as u64),
                "title": format!("タイトル {}", start + i as u64)
            })
        })
        .collect();
    json!({
        "@id": "https://cir.nii.ac.jp/opensearch/articles",
        "title": "CiNii Research",
        "opensearch:totalResults": total,
        "opensearch:startIndex": start,
        "opensearch:itemsPerPage": items.len(),
        "items": items
    })
}

#[tokio::test]
async fn test_opensearch_sends_query_pairs() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opensearch/articles"))
        .and(query_param("format", "json"))
        .and(query_param("appid", "test-app"))
        .and(query_param("q", "がん"))
        .and(query_param("dataSourceType", "JALC,CROSSREF"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(2, 1, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let query = OpenSearchQuery {
        q: Some("がん".to_string()),
        data_source_type: vec!["JALC".to_string(), "CROSSREF".to_string()],
        ..Default::default()
    };
    let response = client(&server)
        .opensearch(SearchType::Articles, &query)
        .await
        .expect("opensearch");

    assert_eq!(response.total_results, 2);
    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[0].id, "https://cir.nii.ac.jp/crid/1");
}

#[tokio::test]
async fn test_invalid_period_is_rejected_before_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 0, 0)))
        .expect(0)
        .mount(&server)
        .await;

    let query = OpenSearchQuery {
        from: Some("1850".to_string()),
        ..Default::default()
    };
    let result = client(&server).opensearch(SearchType::All, &query).await;
    assert!(matches!(result, Err(CiniiError::Config(_))));
}

#[tokio::test]
async fn test_record_by_crid_and_full_uri() {
    let server = MockServer::start().await;
    let record = json!({"@id": "https://cir.nii.ac.jp/crid/1390001", "@type": "Article"});

    Mock::given(method("GET"))
        .and(path("/crid/1390001.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record.clone()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let by_crid = client.record("1390001").await.expect("by crid");
    assert_eq!(by_crid, record);

    let uri = format!("{}/crid/1390001", server.uri());
    let by_uri = client.record(&uri).await.expect("by uri");
    assert_eq!(by_uri["@type"], "Article");
}

#[tokio::test]
async fn test_rate_limited_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/crid/1.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).record("1").await;
    assert!(matches!(result, Err(CiniiError::RateLimited(7))));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/crid/2.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    match client(&server).record("2").await {
        Err(CiniiError::Api { code, message }) => {
            assert_eq!(code, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_pages_stops_at_total_results() {
    let server = MockServer::start().await;

    for (start, items) in [(1u64, 20usize), (21, 20), (41, 5)] {
        Mock::given(method("GET"))
            .and(path("/opensearch/articles"))
            .and(query_param("start", start.to_string()))
            .and(query_param("count", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(45, start, items)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let batch = fetch_pages(
        &client(&server),
        SearchType::Articles,
        &OpenSearchQuery::default(),
        1,
        ItemsPerPage::Twenty,
        1000,
    )
    .await
    .expect("batch");

    assert_eq!(batch.responses.len(), 3);
    assert_eq!(batch.items().count(), 45);
    assert_eq!(batch.next_offset, None);
}

#[tokio::test]
async fn test_fetch_pages_stops_at_batch_limit() {
    let server = MockServer::start().await;

    for start in [1u64, 21] {
        Mock::given(method("GET"))
            .and(path("/opensearch/articles"))
            .and(query_param("start", start.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(1000, start, 20)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let batch = fetch_pages(
        &client(&server),
        SearchType::Articles,
        &OpenSearchQuery::default(),
        1,
        ItemsPerPage::Twenty,
        40,
    )
    .await
    .expect("batch");

    assert_eq!(batch.responses.len(), 2);
    assert_eq!(batch.next_offset, Some(41));
}
