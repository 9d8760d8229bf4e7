use portfolio_listings::listings::{DealSource, PostgrestDealSource};
use portfolio_listings::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn deal_row(uuid: &str, name: &str, created_at: &str) -> serde_json::Value {
    json!({
        "uuid": uuid,
        "deal_name": name,
        "city": "Denver",
        "state": "CO",
        "deal_type": "Industrial",
        "needs": "Bridge loan",
        "asking": "1250000",
        "public_status": true,
        "public_info": "Two warehouses",
        "created_at": created_at,
        "updated_at": created_at
    })
}

#[tokio::test]
async fn test_fetch_public_deals_query_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .and(query_param("select", "*"))
        .and(query_param("public_status", "eq.true"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            deal_row("b", "Newer", "2024-06-02T00:00:00+00:00"),
            deal_row("a", "Older", "2024-06-01T00:00:00+00:00"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let supabase = Supabase::new(&mock_server.uri(), "anon-key");
    let deals = PostgrestDealSource::new(&supabase)
        .fetch_public_deals()
        .await
        .unwrap();

    assert_eq!(deals.len(), 2);
    assert_eq!(deals[0].name, "Newer");
    assert_eq!(deals[1].id, "a");
    assert_eq!(deals[0].asking.as_deref(), Some("1250000"));
}

#[tokio::test]
async fn test_fetch_public_deals_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let supabase = Supabase::new(&mock_server.uri(), "anon-key");
    let deals = PostgrestDealSource::new(&supabase)
        .fetch_public_deals()
        .await
        .unwrap();
    assert!(deals.is_empty());
}

#[tokio::test]
async fn test_fetch_public_deals_service_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "42P01",
            "details": null,
            "hint": null,
            "message": "relation \"public.deals\" does not exist"
        })))
        .mount(&mock_server)
        .await;

    let supabase = Supabase::new(&mock_server.uri(), "anon-key");
    let err = PostgrestDealSource::new(&supabase)
        .fetch_public_deals()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(_)));
    assert_eq!(err.user_message(), "relation \"public.deals\" does not exist");
}

#[tokio::test]
async fn test_view_mounts_against_rest_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            deal_row("a", "Front Range Logistics", "2024-06-01T00:00:00+00:00"),
        ])))
        .mount(&mock_server)
        .await;

    let supabase = Supabase::new(&mock_server.uri(), "anon-key");
    let mut view = ListingsView::new(
        PostgrestDealSource::new(&supabase),
        RealtimeChangeFeed::new(&supabase),
    );
    view.mount().await;

    let snapshot = view.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.state_options(), vec!["All States", "CO"]);

    let html = render_page(&snapshot);
    assert!(html.contains("<h3>Denver, CO</h3>"));
    assert!(html.contains("$1,250,000"));

    view.unmount();
}

#[tokio::test]
async fn test_fetch_accepts_timestamps_without_offset() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/deals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            deal_row("a", "Front Range Logistics", "2024-06-01T00:00:00.123456"),
        ])))
        .mount(&mock_server)
        .await;

    let supabase = Supabase::new(&mock_server.uri(), "anon-key");
    let deals = PostgrestDealSource::new(&supabase)
        .fetch_public_deals()
        .await
        .unwrap();

    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].created_at.to_rfc3339(), "2024-06-01T00:00:00.123456+00:00");
}
