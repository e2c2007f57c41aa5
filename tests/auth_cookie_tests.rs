// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Session cookie attribute tests.
//!
//! These verify the exact attributes existing clients depend on: name,
//! HttpOnly, SameSite=Strict, Path=/, Max-Age 30 days, Secure only in
//! production, and a matching Max-Age=0 removal cookie on logout.

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use vitatrack::cache::keys;

mod common;

use common::{
    body_json, create_production_test_app, create_test_app, error_code, post_json,
    register_verified_user, TestApp,
};

fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn session_cookie(headers: &[String]) -> String {
    headers
        .iter()
        .find(|value| value.starts_with("session_token="))
        .cloned()
        .unwrap_or_else(|| panic!("missing session_token Set-Cookie header: {headers:?}"))
}

async fn login(app: &TestApp) -> Response<Body> {
    register_verified_user(app, "Ann", "ann@x.com", "secret1").await;
    post_json(
        &app.router,
        "/user/auth/login",
        json!({ "email": "ann@x.com", "password": "secret1" }),
    )
    .await
}

#[tokio::test]
async fn test_login_cookie_attributes_development() {
    let app = create_test_app();
    let response = login(&app).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = session_cookie(&set_cookie_headers(&response));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Domain="));
}

#[tokio::test]
async fn test_login_cookie_is_secure_in_production() {
    let app = create_production_test_app();
    let response = login(&app).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = session_cookie(&set_cookie_headers(&response));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
}

#[tokio::test]
async fn test_logout_emits_matching_removal_cookie_and_drops_marker() {
    let app = create_test_app();
    let response = login(&app).await;
    let cookie = session_cookie(&set_cookie_headers(&response));
    let token = cookie
        .strip_prefix("session_token=")
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let user = app
        .state
        .store
        .find_by_email("ann@x.com")
        .await
        .unwrap()
        .unwrap();
    assert!(app.state.cache.get(&keys::session(&user.id)).is_some());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user/auth/logout")
                .header(header::COOKIE, format!("session_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let removal = session_cookie(&set_cookie_headers(&response));
    assert!(removal.contains("Max-Age=0"));
    assert!(removal.contains("HttpOnly"));
    assert!(removal.contains("SameSite=Strict"));
    assert!(removal.contains("Path=/"));

    assert!(app.state.cache.get(&keys::session(&user.id)).is_none());

    // The old cookie credential is now dead.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/user/me")
                .header(header::COOKIE, format!("session_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body_json(response).await), "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_logout_without_a_session_still_succeeds() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let removal = session_cookie(&set_cookie_headers(&response));
    assert!(removal.contains("Max-Age=0"));
}
