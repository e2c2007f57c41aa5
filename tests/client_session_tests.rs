// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Client session manager tests over a real listener.
//!
//! The property under test is the single-flight refresh: N concurrent
//! requests that all hit `TOKEN_EXPIRED` must produce exactly one call to
//! the refresh endpoint, and every request must complete with the refreshed
//! token. The refresh endpoint is counted with a middleware wrapped around
//! the real router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use futures_util::future::join_all;
use serde_json::json;
use vitatrack::cache::keys;
use vitatrack::client::{ApiClient, ClientError};
use vitatrack::services::tokens::TokenKind;
use vitatrack::AppState;

mod common;

use common::create_test_app;

struct LiveServer {
    base_url: String,
    state: Arc<AppState>,
    refresh_calls: Arc<AtomicUsize>,
}

/// Serve the app on an ephemeral port with a refresh-endpoint counter.
async fn spawn_counting_server() -> LiveServer {
    let app = create_test_app();
    let refresh_calls = Arc::new(AtomicUsize::new(0));

    let counter = refresh_calls.clone();
    let router = app
        .router
        .layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            let counter = counter.clone();
            async move {
                if req.uri().path() == "/user/auth/refresh-token" {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                next.run(req).await
            }
        }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let state = app.state.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });

    LiveServer {
        base_url: format!("http://{addr}"),
        state,
        refresh_calls,
    }
}

/// Register, verify, and log in `ann@x.com`, returning her user id.
async fn signed_in_client(server: &LiveServer) -> (ApiClient, String) {
    let client = ApiClient::new(server.base_url.clone()).unwrap();

    client
        .post(
            "/user/auth/register",
            &json!({ "name": "Ann", "email": "ann@x.com", "password": "secret1" }),
        )
        .await
        .unwrap();
    let code = server
        .state
        .cache
        .get(&keys::verification("ann@x.com"))
        .expect("verification code cached");
    client
        .post(
            "/user/auth/verify-email",
            &json!({ "token": code, "email": "ann@x.com" }),
        )
        .await
        .unwrap();

    let envelope = client.login("ann@x.com", "secret1").await.unwrap();
    let user_id = envelope["data"]["user"]["id"].as_str().unwrap().to_string();
    assert!(client.session().access_token().await.is_some());
    (client, user_id)
}

#[tokio::test]
async fn test_concurrent_expired_requests_trigger_exactly_one_refresh() {
    let server = spawn_counting_server().await;
    let (client, user_id) = signed_in_client(&server).await;

    // Swap the in-memory token for one that is already expired.
    let expired = server
        .state
        .issuer
        .issue(TokenKind::Access, &user_id, -60)
        .unwrap();
    client.session().set_access_token(Some(expired.clone())).await;

    let requests: Vec<_> = (0..8).map(|_| client.get("/user/me")).collect();
    let outcomes = join_all(requests).await;

    for outcome in &outcomes {
        let envelope = outcome.as_ref().expect("request should succeed after refresh");
        assert_eq!(envelope["data"]["email"], "ann@x.com");
    }
    assert_eq!(server.refresh_calls.load(Ordering::SeqCst), 1);

    // The refreshed token replaced the expired one and keeps working
    // without another refresh.
    let token = client.session().access_token().await.unwrap();
    assert_ne!(token, expired);
    client.get("/user/me").await.unwrap();
    assert_eq!(server.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_expiry_unauthorized_does_not_trigger_refresh() {
    let server = spawn_counting_server().await;
    let (client, _) = signed_in_client(&server).await;

    // A malformed bearer token is INVALID_TOKEN, which must propagate
    // untouched rather than start a refresh loop.
    client
        .session()
        .set_access_token(Some("garbage-token".to_string()))
        .await;
    let err = client.get("/user/me").await.unwrap_err();
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status, 401);
            assert_eq!(code, "INVALID_TOKEN");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.refresh_calls.load(Ordering::SeqCst), 0);

    // Same for bad login credentials.
    let err = client.login("ann@x.com", "wrong").await.unwrap_err();
    match err {
        ClientError::Api { code, .. } => assert_eq!(code, "INVALID_CREDENTIALS"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_refresh_rejects_all_waiters_without_retry_loop() {
    let server = spawn_counting_server().await;
    let (client, user_id) = signed_in_client(&server).await;

    // Expired access token AND a dead session: the refresh itself will be
    // rejected with SESSION_EXPIRED.
    let expired = server
        .state
        .issuer
        .issue(TokenKind::Access, &user_id, -60)
        .unwrap();
    client.session().set_access_token(Some(expired)).await;
    server.state.cache.remove(&keys::session(&user_id));

    let requests: Vec<_> = (0..4).map(|_| client.get("/user/me")).collect();
    let outcomes = join_all(requests).await;

    for outcome in outcomes {
        assert!(outcome.is_err(), "request must fail when refresh fails");
    }
    // One shared refresh attempt, not one per request and not a loop.
    assert_eq!(server.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_resets_the_session() {
    let server = spawn_counting_server().await;
    let (client, _) = signed_in_client(&server).await;

    client.logout().await.unwrap();
    assert!(client.session().access_token().await.is_none());

    // The cookie credential is dead too: a refresh attempt now fails.
    let err = client.get("/user/me").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { .. }));
}
