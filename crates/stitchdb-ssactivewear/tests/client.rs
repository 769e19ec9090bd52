//! Integration tests for `SsClient` using wiremock HTTP mocks.
//!
//! Each test stands up a local mock server so no network access is needed.

use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stitchdb_ssactivewear::{SsClient, SsCredentials, SsError};

fn client(base_url: &str, max_retries: u32) -> SsClient {
    SsClient::with_base_url(
        SsCredentials {
            account_number: "12345".to_string(),
            api_key: "secret".to_string(),
        },
        5,
        max_retries,
        0,
        base_url,
    )
    .unwrap()
}

fn styles_page() -> serde_json::Value {
    json!([
        {
            "styleID": 39,
            "styleName": "B00760",
            "brandName": "Gildan",
            "title": "Ultra Cotton T-Shirt",
            "baseCategory": "T-Shirts"
        },
        {
            "styleID": 41,
            "styleName": "B15000",
            "brandName": "Gildan",
            "title": "Heavy Blend Hooded Sweatshirt",
            "baseCategory": "Fleece"
        }
    ])
}

#[tokio::test]
async fn list_styles_sends_pagination_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/styles/"))
        .and(query_param("page", "2"))
        .and(query_param("pagesize", "100"))
        .and(query_param("brand", "Gildan"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(styles_page()))
        .expect(1)
        .mount(&server)
        .await;

    let styles = client(&server.uri(), 0)
        .list_styles(2, 100, Some("Gildan"), None)
        .await
        .unwrap();

    assert_eq!(styles.len(), 2);
    assert_eq!(styles[0].style_name, "B00760");
    assert_eq!(styles[0].brand_name.as_deref(), Some("Gildan"));
    assert_eq!(styles[1].style_id, 41);
}

#[tokio::test]
async fn products_for_style_parses_variants() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/"))
        .and(query_param("style", "B00760"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "sku": "B00760033",
                "colorCode": "BLK",
                "colorName": "Black",
                "colorSwatchImage": "https://cdn.example/blk.png",
                "colorFrontImage": "https://cdn.example/blk_front.png",
                "sizeCode": "M",
                "sizeName": "Medium",
                "customerPrice": "4.19",
                "warehouses": [
                    { "warehouseAbbr": "DS", "qty": 120 },
                    { "warehouseAbbr": "NV", "qty": 0 }
                ]
            }
        ])))
        .mount(&server)
        .await;

    let variants = client(&server.uri(), 0)
        .products_for_style("B00760")
        .await
        .unwrap();

    assert_eq!(variants.len(), 1);
    let v = &variants[0];
    assert_eq!(v.sku, "B00760033");
    assert_eq!(v.color_code, "BLK");
    assert_eq!(v.size_name, "Medium");
    assert_eq!(v.customer_price.unwrap().to_string(), "4.19");
    assert_eq!(v.warehouses.len(), 2);
    assert_eq!(v.warehouses[0].qty, 120);
}

#[tokio::test]
async fn missing_style_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/styles/NOPE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server.uri(), 3).get_style("NOPE").await.unwrap_err();
    assert!(matches!(err, SsError::NotFound { .. }));
    // 404 is not retried.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn rate_limit_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/styles/"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/styles/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(styles_page()))
        .mount(&server)
        .await;

    let styles = client(&server.uri(), 2)
        .list_styles(1, 100, None, None)
        .await
        .unwrap();
    assert_eq!(styles.len(), 2);
}

#[tokio::test]
async fn server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server.uri(), 1)
        .inventory_for_style("B00760")
        .await
        .unwrap_err();
    assert!(matches!(err, SsError::UnexpectedStatus { status: 503, .. }));
    // Initial attempt plus one retry.
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_body_maps_to_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server.uri(), 3)
        .products_for_style("B00760")
        .await
        .unwrap_err();
    assert!(matches!(err, SsError::Deserialize { .. }));
    // Parse failures are not retried.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
