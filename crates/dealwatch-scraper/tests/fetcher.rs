//! Integration tests for `DocumentFetcher` and the extractors it feeds.
//!
//! Each test stands up a local `wiremock` server, so no real network traffic
//! is made.

use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealwatch_core::{parse_targets, SignalOutcome, TargetConfig};
use dealwatch_scraper::{
    extractor_for, CatalogOptions, Document, DocumentFetcher, ScraperError, SignalExtractor,
};

/// 5-second timeout, a single attempt.
fn test_fetcher() -> DocumentFetcher {
    DocumentFetcher::new(5, "dealwatch-test/0.1", 1, 0).expect("failed to build test fetcher")
}

fn target(yaml: &str) -> TargetConfig {
    let file = parse_targets(yaml).expect("targets yaml should parse");
    file.targets[0].validate().expect("target should validate")
}

fn product_page(price: &str, original: &str) -> String {
    format!(
        r#"<html><head>
        <script type="application/ld+json">
          {{"@context":"https://schema.org","@type":"Product","name":"Aeroad",
            "offers":{{"@type":"Offer","price":"{price}","priceCurrency":"CHF"}}}}
        </script></head>
        <body><s class="productDescription__priceOriginal">CHF {original}</s></body></html>"#
    )
}

// ---------------------------------------------------------------------------
// HTML fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_html_returns_body_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bike"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("1999.00", "2499.00")))
        .mount(&server)
        .await;

    let body = test_fetcher()
        .fetch_html(&format!("{}/bike", server.uri()))
        .await
        .expect("fetch should succeed");
    assert!(body.contains("application/ld+json"));
}

#[tokio::test]
async fn captcha_page_is_blocked_even_with_valid_prices() {
    let server = MockServer::start().await;
    let body = format!(
        "{}<div>Please solve the CAPTCHA to continue</div>",
        product_page("1999.00", "2499.00")
    );
    Mock::given(method("GET"))
        .and(path("/bike"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let result = test_fetcher().fetch_html(&format!("{}/bike", server.uri())).await;
    assert!(
        matches!(result, Err(ScraperError::Blocked { marker: "captcha", .. })),
        "expected Blocked, got: {result:?}"
    );
}

#[tokio::test]
async fn non_200_status_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bike"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = DocumentFetcher::new(5, "dealwatch-test/0.1", 3, 0).unwrap();
    let result = fetcher.fetch_html(&format!("{}/bike", server.uri())).await;
    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 503, .. })),
        "expected UnexpectedStatus(503), got: {result:?}"
    );
}

#[tokio::test]
async fn connection_failure_is_retried_then_reported() {
    // Port 1 is never listening.
    let fetcher = DocumentFetcher::new(2, "dealwatch-test/0.1", 2, 0).unwrap();
    let result = fetcher.fetch_html("http://127.0.0.1:1/bike").await;
    match result {
        Err(err @ ScraperError::Http(_)) => assert!(err.is_transient()),
        other => panic!("expected Http error, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Catalog fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn catalog_served_as_html_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"products":[]}"#, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_catalog(&format!("{}/products.json", server.uri()), &CatalogOptions::default())
        .await;
    assert!(
        matches!(result, Err(ScraperError::InvalidContentType { .. })),
        "expected InvalidContentType, got: {result:?}"
    );
}

#[tokio::test]
async fn catalog_without_products_key_is_an_error_not_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": "Unavailable"})))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_catalog(&format!("{}/products.json", server.uri()), &CatalogOptions::default())
        .await;
    assert!(
        matches!(result, Err(ScraperError::Deserialize { .. })),
        "expected Deserialize, got: {result:?}"
    );
}

#[tokio::test]
async fn catalog_follows_link_header_pagination() {
    let server = MockServer::start().await;
    let base = server.uri();
    let next_link = format!("<{base}/products.json?limit=250&page_info=cursor2>; rel=\"next\"");

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param_is_missing("page_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"products": [{"id": 1, "title": "A", "handle": "a", "variants": []}]}))
                .insert_header("Link", next_link.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("page_info", "cursor2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"products": [{"id": 2, "title": "B", "handle": "b", "variants": []}]})),
        )
        .mount(&server)
        .await;

    let products = test_fetcher()
        .fetch_catalog(&format!("{base}/products.json"), &CatalogOptions::default())
        .await
        .expect("pagination should succeed");
    let ids: Vec<Option<i64>> = products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);
}

#[tokio::test]
async fn catalog_pagination_limit_is_enforced() {
    let server = MockServer::start().await;
    let base = server.uri();
    let next_link = format!("<{base}/products.json?limit=250&page_info=again>; rel=\"next\"");
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"products": []}))
                .insert_header("Link", next_link.as_str()),
        )
        .mount(&server)
        .await;

    let options = CatalogOptions {
        page_limit: 250,
        max_pages: 2,
    };
    let result = test_fetcher()
        .fetch_catalog(&format!("{base}/products.json"), &options)
        .await;
    assert!(
        matches!(result, Err(ScraperError::PaginationLimit { max_pages: 2, .. })),
        "expected PaginationLimit, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Fetch + extract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn structured_target_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bike"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("1999.00", "2’499.00")))
        .mount(&server)
        .await;

    let target = target(&format!(
        "targets:\n  - id: aeroad\n    url: {}/bike\n    currency: CHF\n",
        server.uri()
    ));
    let doc = test_fetcher()
        .fetch_document(&target, &CatalogOptions::default())
        .await
        .expect("fetch should succeed");
    assert!(matches!(doc, Document::Html { .. }));

    let outcome = extractor_for(&target).extract(&doc).unwrap();
    let SignalOutcome::Observed(obs) = outcome else {
        panic!("expected an observation");
    };
    assert!(obs.condition.favorable);
    assert_eq!(obs.condition.signature, "sale=1|current=1999.00|original=2499.00");
}

#[tokio::test]
async fn catalog_target_uses_store_origin_for_feed_and_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("limit", "250"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": 1, "title": "Hoodie", "handle": "hoodie", "variants": [
                {"id": 11, "price": "60.00", "compare_at_price": "100.00"}
            ]}]
        })))
        .mount(&server)
        .await;

    let target = target(&format!(
        "targets:\n  - id: merch\n    kind: catalog_json\n    url: {}/collections/sale/\n",
        server.uri()
    ));
    let doc = test_fetcher()
        .fetch_document(&target, &CatalogOptions::default())
        .await
        .expect("fetch should succeed");

    let SignalOutcome::Observed(obs) = extractor_for(&target).extract(&doc).unwrap() else {
        panic!("expected an observation");
    };
    assert_eq!(obs.deals.len(), 1);
    assert_eq!(obs.deals[0].url, format!("{}/products/hoodie", server.uri()));
}
