mod common;

use axum_test::TestServer;
use common::{MockConnectInfoLayer, TestContext};
use serde_json::json;
use snaplink::routes::router;

fn server(ctx: &TestContext) -> TestServer {
    let app = router(ctx.state.clone()).layer(MockConnectInfoLayer(
        "127.0.0.1:12345".parse().unwrap(),
    ));
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_stats_counts_redirects() {
    let mut ctx = TestContext::with_cache();
    let server = server(&ctx);

    let created = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/counted", "ttl_days": 30 }))
        .await
        .json::<serde_json::Value>();
    let code = created["short_code"].as_str().unwrap();

    for _ in 0..3 {
        server.get(&format!("/{code}")).await;
    }
    ctx.apply_clicks().await;

    let response = server.get(&format!("/stats/{code}")).await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["short_code"], code);
    assert_eq!(body["long_url"], "https://example.com/counted");
    assert_eq!(body["clicks"], 3);
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_stats_not_found() {
    let ctx = TestContext::with_cache();
    let server = server(&ctx);

    let response = server.get("/stats/nonexistent").await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_stats_does_not_count_as_click() {
    let mut ctx = TestContext::with_cache();
    let server = server(&ctx);

    let created = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/quiet" }))
        .await
        .json::<serde_json::Value>();
    let code = created["short_code"].as_str().unwrap();

    server.get(&format!("/stats/{code}")).await;

    assert_eq!(ctx.apply_clicks().await, 0);
}
