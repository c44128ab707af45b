//! Integration tests for the content calendar endpoints.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn caption_id(app: &TestApp) -> String {
    let created = body_json(
        app.generate("Photography", "Golden hour mini sessions this weekend")
            .await,
    )
    .await;
    created["caption_id"].as_str().unwrap().to_string()
}

async fn schedule(app: &TestApp, caption_id: &str, hours_ahead: i64, content_type: &str) -> Value {
    let response = app
        .send(
            Method::POST,
            "/api/schedule",
            Some(json!({
                "caption_id": caption_id,
                "scheduled_time": Utc::now() + Duration::hours(hours_ahead),
                "platform": "instagram",
                "content_type": content_type,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn scheduled_post_carries_its_caption() {
    let app = TestApp::new();
    let caption_id = caption_id(&app).await;

    let post = schedule(&app, &caption_id, 3, "promotional").await;
    assert_eq!(post["status"], "scheduled");
    assert_eq!(post["content_type"], "promotional");

    let json = body_json(app.send(Method::GET, "/api/schedule", None).await).await;
    let posts = json["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], post["id"]);
    assert!(posts[0]["caption"].is_string());
}

#[tokio::test]
async fn cannot_schedule_someone_elses_caption() {
    let app = TestApp::new();
    let response = app
        .send(
            Method::POST,
            "/api/schedule",
            Some(json!({
                "caption_id": Uuid::new_v4(),
                "scheduled_time": Utc::now() + Duration::hours(1),
                "platform": "instagram",
                "content_type": "educational",
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_platform_is_a_bad_request() {
    let app = TestApp::new();
    let caption_id = caption_id(&app).await;
    let response = app
        .send(
            Method::POST,
            "/api/schedule",
            Some(json!({
                "caption_id": caption_id,
                "scheduled_time": Utc::now() + Duration::hours(1),
                "platform": "   ",
                "content_type": "educational",
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn inverted_range_is_a_bad_request() {
    let app = TestApp::new();
    let from = (Utc::now() + Duration::days(2)).to_rfc3339();
    let to = Utc::now().to_rfc3339();
    let uri = format!(
        "/api/schedule?from={}&to={}",
        from.replace('+', "%2B"),
        to.replace('+', "%2B")
    );

    let response = app.send(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_then_delete_a_post() {
    let app = TestApp::new();
    let caption_id = caption_id(&app).await;
    let post = schedule(&app, &caption_id, 6, "engagement").await;
    let uri = format!("/api/schedule/{}", post["id"].as_str().unwrap());

    let response = app
        .send(Method::PUT, &uri, Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "cancelled");
    assert_eq!(updated["content_type"], "engagement");
    assert_eq!(updated["platform"], "instagram");

    assert_eq!(
        app.send(Method::DELETE, &uri, None).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.send(Method::PUT, &uri, Some(json!({ "platform": "tiktok" })))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn content_mix_reports_shares() {
    let app = TestApp::new();
    let caption_id = caption_id(&app).await;
    for content_type in ["promotional", "promotional", "educational", "entertaining"] {
        schedule(&app, &caption_id, 1, content_type).await;
    }

    let json = body_json(
        app.send(Method::GET, "/api/schedule/content-mix", None)
            .await,
    )
    .await;
    assert_eq!(json["total"], 4);
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["content_type"], "promotional");
    assert_eq!(entries[0]["count"], 2);
    assert_eq!(entries[0]["percentage"], 50.0);
    assert_eq!(entries[3]["content_type"], "engagement");
    assert_eq!(entries[3]["count"], 0);
}
