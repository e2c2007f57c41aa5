// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Shared test harness: a full router wired to the in-memory store and the
//! capturing mock mailer, plus helpers for driving it with `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use vitatrack::cache::TtlCache;
use vitatrack::config::Config;
use vitatrack::db::UserStore;
use vitatrack::services::email::MockOutbox;
use vitatrack::services::{AuthService, Mailer, TokenIssuer};
use vitatrack::AppState;

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub outbox: Arc<MockOutbox>,
}

/// Full application with offline collaborators.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

/// Same app with `APP_ENV=production` semantics (Secure cookies).
#[allow(dead_code)]
pub fn create_production_test_app() -> TestApp {
    let config = Config {
        production: true,
        ..Config::test_default()
    };
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let store = UserStore::in_memory();
    let cache = TtlCache::new();
    let issuer = TokenIssuer::new(&config.jwt_signing_key);
    let (mailer, outbox) = Mailer::mock(&config.frontend_url);

    let auth = AuthService::new(store.clone(), cache.clone(), issuer.clone(), mailer);
    let state = Arc::new(AppState {
        config,
        store,
        cache,
        issuer,
        auth,
    });

    TestApp {
        router: vitatrack::routes::create_router(state.clone()),
        state,
        outbox,
    }
}

/// POST a JSON body through the router.
#[allow(dead_code)]
pub async fn post_json(router: &Router, uri: &str, body: Value) -> Response<Body> {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// GET with an optional bearer token.
#[allow(dead_code)]
pub async fn get_with_bearer(router: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Decode the response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Error code from a failure envelope.
#[allow(dead_code)]
pub fn error_code(envelope: &Value) -> &str {
    envelope["error"]["code"].as_str().unwrap_or("")
}

/// Pull the one-time code out of the most recent email's link.
#[allow(dead_code)]
pub fn last_emailed_code(outbox: &MockOutbox) -> String {
    let sent = outbox.sent();
    let email = sent.last().expect("no email was sent");
    let start = email
        .body
        .find("token=")
        .expect("email carries no token link")
        + "token=".len();
    let rest = &email.body[start..];
    let end = rest.find('&').unwrap_or(rest.len());
    rest[..end].to_string()
}

/// Register a user through the API and return the emailed verification code.
#[allow(dead_code)]
pub async fn register_user(app: &TestApp, name: &str, email: &str, password: &str) -> String {
    let response = post_json(
        &app.router,
        "/user/auth/register",
        serde_json::json!({ "name": name, "email": email, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    last_emailed_code(&app.outbox)
}

/// Register and verify, leaving the account ready to log in.
#[allow(dead_code)]
pub async fn register_verified_user(app: &TestApp, name: &str, email: &str, password: &str) {
    let code = register_user(app, name, email, password).await;
    let response = post_json(
        &app.router,
        "/user/auth/verify-email",
        serde_json::json!({ "token": code, "email": email }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
