// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Client-side session manager.
//!
//! The Rust counterpart of the SPA's HTTP layer, used by integration tests
//! and CLI tooling. The access token lives only in process memory; the
//! session token travels in the reqwest cookie store. On a 401 whose code
//! is `TOKEN_EXPIRED` or `SESSION_EXPIRED`, exactly one refresh call is in
//! flight at a time: the first caller refreshes, everyone else queues on a
//! oneshot and resumes with the shared outcome. Each request is replayed at
//! most once.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a failure envelope.
    #[error("api error {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The silent refresh did not produce a token; queued requests get
    /// this instead of the refresher's transport error.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
}

#[derive(Default)]
struct CoordinatorState {
    access_token: Option<String>,
    refreshing: bool,
    waiters: Vec<oneshot::Sender<Result<String, ClientError>>>,
}

/// Holds the in-memory access token and serializes refresh attempts.
#[derive(Clone, Default)]
pub struct SessionCoordinator {
    inner: Arc<Mutex<CoordinatorState>>,
}

impl SessionCoordinator {
    pub async fn access_token(&self) -> Option<String> {
        self.inner.lock().await.access_token.clone()
    }

    pub async fn set_access_token(&self, token: Option<String>) {
        self.inner.lock().await.access_token = token;
    }

    /// Drop the token and reject anything still waiting on a refresh.
    /// Called on logout.
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.access_token = None;
        state.refreshing = false;
        for waiter in state.waiters.drain(..) {
            let _ = waiter.send(Err(ClientError::RefreshFailed(
                "session was reset".to_string(),
            )));
        }
    }
}

enum RefreshRole {
    /// This caller performs the refresh call.
    Refresher,
    /// A refresh is already in flight; resume with its outcome.
    Waiter(oneshot::Receiver<Result<String, ClientError>>),
}

/// HTTP client for the Vitatrack API with silent token refresh.
///
/// One instance per client process; [`ApiClient::reset`] returns it to the
/// logged-out state.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionCoordinator,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            session: SessionCoordinator::default(),
        })
    }

    pub fn session(&self) -> &SessionCoordinator {
        &self.session
    }

    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.execute(Method::POST, path, Some(body.clone())).await
    }

    /// Log in and store the returned access token in memory. The session
    /// cookie lands in the cookie store automatically.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let envelope = self
            .execute(Method::POST, "/user/auth/login", Some(body))
            .await?;
        let token = envelope["data"]["token"].as_str().map(|t| t.to_string());
        self.session.set_access_token(token).await;
        Ok(envelope)
    }

    /// Server-side logout plus local reset. Always resets locally, even if
    /// the logout call fails.
    pub async fn logout(&self) -> Result<Value, ClientError> {
        let result = self
            .execute(Method::POST, "/user/auth/logout", None)
            .await;
        self.session.reset().await;
        result
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let mut token = self.session.access_token().await;
        let mut retried = false;

        loop {
            let mut request = self
                .http
                .request(method.clone(), format!("{}{}", self.base_url, path));
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();
            let envelope: Value = response.json().await.unwrap_or(Value::Null);

            if status.is_success() {
                return Ok(envelope);
            }

            let code = error_code(&envelope).unwrap_or_default().to_string();
            let expired = status == StatusCode::UNAUTHORIZED
                && (code == "TOKEN_EXPIRED" || code == "SESSION_EXPIRED");
            if !expired || retried {
                // Bad credentials and friends propagate untouched; a second
                // 401 after a replay means refreshing cannot help.
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    code,
                    message: envelope["message"].as_str().unwrap_or_default().to_string(),
                });
            }

            retried = true;
            token = Some(self.refresh().await?);
        }
    }

    /// Obtain a fresh access token, coordinating with concurrent callers so
    /// only one refresh request is ever in flight.
    async fn refresh(&self) -> Result<String, ClientError> {
        let role = {
            let mut state = self.session.inner.lock().await;
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                RefreshRole::Waiter(rx)
            } else {
                state.refreshing = true;
                RefreshRole::Refresher
            }
        };

        match role {
            RefreshRole::Waiter(rx) => rx.await.map_err(|_| {
                ClientError::RefreshFailed("refresh was abandoned".to_string())
            })?,
            RefreshRole::Refresher => {
                let outcome = self.call_refresh_endpoint().await;

                let mut state = self.session.inner.lock().await;
                state.refreshing = false;
                match outcome {
                    Ok(new_token) => {
                        state.access_token = Some(new_token.clone());
                        for waiter in state.waiters.drain(..) {
                            let _ = waiter.send(Ok(new_token.clone()));
                        }
                        Ok(new_token)
                    }
                    Err(error) => {
                        let message = error.to_string();
                        for waiter in state.waiters.drain(..) {
                            let _ = waiter
                                .send(Err(ClientError::RefreshFailed(message.clone())));
                        }
                        Err(error)
                    }
                }
            }
        }
    }

    /// Plain POST to the refresh endpoint. No bearer header: the session
    /// cookie is the credential, and an expired access token must not ride
    /// along and poison the refresh.
    async fn call_refresh_endpoint(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}/user/auth/refresh-token", self.base_url))
            .send()
            .await?;
        let status = response.status();
        let envelope: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                code: error_code(&envelope).unwrap_or_default().to_string(),
                message: envelope["message"].as_str().unwrap_or_default().to_string(),
            });
        }

        envelope["data"]["token"]
            .as_str()
            .map(|t| t.to_string())
            .ok_or_else(|| {
                ClientError::RefreshFailed("refresh response carried no token".to_string())
            })
    }
}

fn error_code(envelope: &Value) -> Option<&str> {
    envelope["error"]["code"].as_str()
}
