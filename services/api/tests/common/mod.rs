#![allow(dead_code)]

use std::sync::Arc;

use api_lib::web::{self, state::AppState};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use caption_genius_core::memory::{InMemoryDatabase, ScriptedCaptionGenerator};
use caption_genius_core::{Profile, UsagePolicy};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const SESSION: &str = "test-session";
pub const CAPTION: &str = "Fresh drops every Friday. Tag a friend who needs this! #shopsmall";

/// The router plus handles on its in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<InMemoryDatabase>,
    pub generator: Arc<ScriptedCaptionGenerator>,
    pub user_id: Uuid,
}

impl TestApp {
    /// A signed-in caller with no profile, and a generator that always succeeds.
    pub fn new() -> Self {
        Self::with_generator(ScriptedCaptionGenerator::replying(CAPTION), UsagePolicy::default())
    }

    pub fn with_generator(generator: ScriptedCaptionGenerator, policy: UsagePolicy) -> Self {
        let db = Arc::new(InMemoryDatabase::with_default_niches());
        let generator = Arc::new(generator);
        let user_id = Uuid::new_v4();
        db.add_auth_session(SESSION, user_id, Utc::now() + Duration::hours(1));

        let state = Arc::new(AppState::new(db.clone(), generator.clone(), policy));
        Self {
            router: web::router(state),
            db,
            generator,
            user_id,
        }
    }

    pub fn metered(self, credits_remaining: i32) -> Self {
        self.db.put_profile(Profile {
            id: self.user_id,
            subscription_plan_id: Some("starter".to_string()),
            credits_remaining,
        });
        self
    }

    /// Sends an authenticated request. `body` is sent as JSON when present.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, format!("session={}", SESSION));
        self.dispatch(builder, body).await
    }

    pub async fn send_with_bearer(&self, method: Method, uri: &str, token: &str) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", token));
        self.dispatch(builder, None).await
    }

    pub async fn send_anonymous(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        self.dispatch(builder, body).await
    }

    pub async fn generate(&self, niche: &str, input: &str) -> Response {
        self.send(
            Method::POST,
            "/api/captions/generate",
            Some(serde_json::json!({ "niche": niche, "input": input })),
        )
        .await
    }

    async fn dispatch(&self, builder: axum::http::request::Builder, body: Option<Value>) -> Response {
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
