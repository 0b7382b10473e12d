//! Local web UI server end to end: page, palette and the analyze proxy.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{dead_endpoint, spawn_backend, WORKED_EXAMPLE};
use empathy_view::web::serve_on;
use empathy_view::*;

async fn spawn_ui(endpoint: String) -> String {
    let pipeline = Arc::new(Pipeline::new(
        AnalysisClient::new(ClientConfig::new(endpoint)),
        EmotionPalette::default(),
    ));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ui");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = serve_on(listener, pipeline).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_index_page_served() {
    let ui = spawn_ui(dead_endpoint().await).await;
    let resp = reqwest::get(format!("{ui}/")).await.expect("get");
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.expect("body");
    assert!(html.contains("Empathy Engine"));
}

#[tokio::test]
async fn test_palette_endpoint() {
    let ui = spawn_ui(dead_endpoint().await).await;
    let v: serde_json::Value = reqwest::get(format!("{ui}/api/palette"))
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    assert_eq!(v["fallback"], "#9e9e9e");
    assert!(v["colors"]["joy"].is_string());
}

#[tokio::test]
async fn test_analyze_returns_dashboard() {
    let stub = spawn_backend(200, WORKED_EXAMPLE, Duration::ZERO).await;
    let ui = spawn_ui(stub.endpoint()).await;

    let resp = reqwest::Client::new()
        .post(format!("{ui}/api/analyze"))
        .json(&serde_json::json!({"text": "I am happy\nI am sad"}))
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), 200);
    let d: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(d["trend"], "improving");
    assert_eq!(d["tags"][0]["label"], "joy (1)");
    assert_eq!(d["tags"][1]["label"], "sadness (1)");
    assert_eq!(d["breakdown"][1]["index"], 2);
    assert_eq!(d["line"]["series"], "Intensity");
    assert_eq!(d["line"]["values"], serde_json::json!([0.9, 0.3]));
    assert_eq!(d["bar"]["begin_at_zero"], true);
}

#[tokio::test]
async fn test_analyze_backend_down_is_502() {
    let ui = spawn_ui(dead_endpoint().await).await;
    let resp = reqwest::Client::new()
        .post(format!("{ui}/api/analyze"))
        .json(&serde_json::json!({"text": "hello"}))
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), 502);
    let v: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(v["error"], "transport");
    assert!(v["message"].as_str().unwrap_or_default().contains("connect"));
}

#[tokio::test]
async fn test_analyze_bad_json_is_400() {
    let ui = spawn_ui(dead_endpoint().await).await;
    let resp = reqwest::Client::new()
        .post(format!("{ui}/api/analyze"))
        .header("Content-Type", "application/json")
        .body("{\"messages\": []}")
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_concurrent_analyze_gets_409() {
    let stub = spawn_backend(200, WORKED_EXAMPLE, Duration::from_millis(400)).await;
    let ui = spawn_ui(stub.endpoint()).await;
    let client = reqwest::Client::new();

    let first = {
        let client = client.clone();
        let url = format!("{ui}/api/analyze");
        tokio::spawn(async move {
            client
                .post(url)
                .json(&serde_json::json!({"text": "I am happy\nI am sad"}))
                .send()
                .await
                .map(|r| r.status().as_u16())
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = client
        .post(format!("{ui}/api/analyze"))
        .json(&serde_json::json!({"text": "I am happy\nI am sad"}))
        .send()
        .await
        .expect("post");
    assert_eq!(second.status(), 409);
    assert_eq!(first.await.expect("join").expect("first"), 200);
}

#[tokio::test]
async fn test_unknown_route_404_and_wrong_method_405() {
    let ui = spawn_ui(dead_endpoint().await).await;
    let resp = reqwest::get(format!("{ui}/nope")).await.expect("get");
    assert_eq!(resp.status(), 404);
    let resp = reqwest::get(format!("{ui}/api/analyze")).await.expect("get");
    assert_eq!(resp.status(), 405);
}
