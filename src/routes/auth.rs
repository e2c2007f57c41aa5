// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! `/user/auth/*` routes.
//!
//! Handlers stay thin: decode and validate the request, call one
//! [`AuthService`] method, wrap the outcome in the response envelope. The
//! session cookie is built here and nowhere else so its attributes cannot
//! drift between login, verify-with-login, and logout.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{AppError, Result};
use crate::middleware::{AuthContext, CredentialKind, SESSION_COOKIE};
use crate::models::PublicUser;
use crate::response::ApiResponse;
use crate::services::auth::IssuedTokens;
use crate::services::tokens::SESSION_TOKEN_TTL_SECS;
use crate::AppState;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Routes that take no credential at all. Logout lives here on purpose:
/// logging out of an already-dead session must still succeed.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/auth/register", post(register))
        .route("/user/auth/verify-email", post(verify_email))
        .route("/user/auth/resend-verify", post(resend_verify))
        .route("/user/auth/login", post(login))
        .route("/user/auth/forgot-password", post(forgot_password))
        .route("/user/auth/reset-password", post(reset_password))
        .route("/user/auth/logout", post(logout))
}

/// Routes behind the relaxed gate (a not-yet-verified account may refresh).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/user/auth/refresh-token", post(refresh_token))
}

// ─── Request/Response Types ──────────────────────────────────

type Body<T> = std::result::Result<Json<T>, JsonRejection>;

/// Unwrap a JSON body, folding axum's rejection into the envelope.
fn body<T>(body: Body<T>) -> Result<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::Validation(rejection.body_text())),
    }
}

/// Run validator-derive checks, folding failures into the envelope.
fn validate(request: &impl Validate) -> Result<()> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// `local@domain.tld`: exactly one `@`, a non-empty local part, and a
/// domain with a dot. Deliberately looser than full RFC 5322.
fn email_format(email: &str) -> std::result::Result<(), ValidationError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    let domain_ok = domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty());
    if local.is_empty() || domain.contains('@') || !domain_ok {
        return Err(ValidationError::new("email"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = email_format))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Verification parameters, accepted as query params or JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    pub token: Option<String>,
    pub email: Option<String>,
    pub login: Option<bool>,
}

impl VerifyParams {
    /// Body fields win over query fields when both are present.
    fn merged_with(self, query: VerifyParams) -> VerifyParams {
        VerifyParams {
            token: self.token.or(query.token),
            email: self.email.or(query.email),
            login: self.login.or(query.login),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyResponse {
    pub user: PublicUser,
    /// Access token, present when verification also logged the user in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub user: PublicUser,
    /// Access token; the session token travels only in the cookie
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default, rename = "newPassword")]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RefreshResponse {
    pub token: String,
}

// ─── Session Cookie ──────────────────────────────────────────

/// Session cookie with the exact attributes existing clients depend on.
fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(SESSION_TOKEN_TTL_SECS));
    cookie.set_secure(state.config.production);
    cookie
}

/// Removal cookie with the same attributes and Max-Age=0.
fn removal_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = session_cookie(state, String::new());
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

fn with_session(
    state: &AppState,
    jar: CookieJar,
    tokens: &IssuedTokens,
) -> CookieJar {
    jar.add(session_cookie(state, tokens.session_token.clone()))
}

// ─── Handlers ────────────────────────────────────────────────

async fn register(
    State(state): State<Arc<AppState>>,
    request: Body<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let request = body(request)?;
    validate(&request)?;

    let user_id = state
        .auth
        .register(request.name, request.email, request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            "Registration successful. Check your email for a verification link.",
            RegisterResponse { user_id },
        ),
    ))
}

async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyParams>,
    jar: CookieJar,
    request: Body<Option<VerifyParams>>,
) -> Result<impl IntoResponse> {
    // A query-only call carries no JSON body at all; that is not an error.
    let from_body = match request {
        Ok(Json(params)) => params.unwrap_or_default(),
        Err(JsonRejection::MissingJsonContentType(_)) => VerifyParams::default(),
        Err(rejection) => return Err(AppError::Validation(rejection.body_text())),
    };
    let params = from_body.merged_with(query);

    let (Some(token), Some(email)) = (params.token, params.email) else {
        return Err(AppError::Validation(
            "token and email are required".to_string(),
        ));
    };
    let login = params.login.unwrap_or(false);

    let outcome = state.auth.verify_email(&email, &token, login).await?;

    let jar = match &outcome.tokens {
        Some(tokens) => with_session(&state, jar, tokens),
        None => jar,
    };
    Ok((
        jar,
        ApiResponse::ok(
            "Email verified",
            VerifyResponse {
                user: outcome.user,
                token: outcome.tokens.map(|t| t.access_token),
            },
        ),
    ))
}

async fn resend_verify(
    State(state): State<Arc<AppState>>,
    request: Body<EmailRequest>,
) -> Result<impl IntoResponse> {
    let request = body(request)?;
    state.auth.resend_verification(&request.email).await?;
    Ok(ApiResponse::message("Verification email sent"))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Body<LoginRequest>,
) -> Result<impl IntoResponse> {
    let request = body(request)?;
    let outcome = state.auth.login(&request.email, &request.password).await?;

    let jar = with_session(&state, jar, &outcome.tokens);
    Ok((
        jar,
        ApiResponse::ok(
            "Login successful",
            LoginResponse {
                user: outcome.user,
                token: outcome.tokens.access_token,
            },
        ),
    ))
}

/// The response is byte-identical whether or not the account exists.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    request: Body<EmailRequest>,
) -> Result<impl IntoResponse> {
    let request = body(request)?;
    state.auth.forgot_password(&request.email).await?;
    Ok(ApiResponse::message(
        "If an account exists for this address, a password reset email has been sent",
    ))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    request: Body<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    let request = body(request)?;
    validate(&request)?;

    state
        .auth
        .reset_password(&request.email, &request.token, request.new_password)
        .await?;
    Ok(ApiResponse::message("Password updated. You can now log in."))
}

/// Silent-refresh target. Only a session cookie may mint access tokens; a
/// bearer credential here would let a stolen access token renew itself.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    if context.credential != CredentialKind::SessionCookie {
        return Err(AppError::Unauthorized);
    }

    let token = state.auth.refresh_access_token(&context.user_id)?;
    Ok(ApiResponse::ok(
        "Token refreshed",
        RefreshResponse { token },
    ))
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let session_token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    state.auth.logout(session_token.as_deref());

    let jar = jar.add(removal_cookie(&state));
    (jar, ApiResponse::message("Logged out"))
}
