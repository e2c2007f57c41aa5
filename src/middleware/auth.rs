// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Request gate: token authentication middleware.
//!
//! One gate implementation behind two entry points. `require_user` lets
//! unverified accounts through (profile reads, refresh);
//! `require_verified_user` is for everything else. The client's silent
//! refresh keys off the exact 401 codes produced here, so the rejection
//! order is part of the API.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::cache::keys;
use crate::error::AppError;
use crate::models::PublicUser;
use crate::services::tokens::{TokenError, TokenKind};
use crate::AppState;

/// Name of the session token cookie. Fixed for client interop.
pub const SESSION_COOKIE: &str = "session_token";

/// How the credential reached us. Session-kind credentials get the extra
/// liveness check against the session marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Bearer,
    SessionCookie,
}

/// Authenticated identity attached to the request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub user: PublicUser,
    pub credential: CredentialKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verification {
    Required,
    NotRequired,
}

/// Gate for endpoints reachable by not-yet-verified accounts.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate(state, jar, request, next, Verification::NotRequired).await
}

/// Gate for endpoints that need a verified email.
pub async fn require_verified_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate(state, jar, request, next, Verification::Required).await
}

async fn gate(
    state: Arc<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
    policy: Verification,
) -> Result<Response, AppError> {
    // Bearer header preferred; the session cookie is the fallback.
    let (token, credential) = match bearer_token(request.headers()) {
        Some(token) => (token, CredentialKind::Bearer),
        None => match jar.get(SESSION_COOKIE) {
            Some(cookie) => (cookie.value().to_string(), CredentialKind::SessionCookie),
            None => return Err(AppError::Unauthorized),
        },
    };

    let claims = match state.issuer.verify(&token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => return Err(AppError::TokenExpired),
        Err(TokenError::Invalid) => return Err(AppError::InvalidAuthToken),
    };

    // A token is only valid on its own transport: access tokens as bearer,
    // session tokens in the cookie.
    let expected = match credential {
        CredentialKind::Bearer => TokenKind::Access,
        CredentialKind::SessionCookie => TokenKind::Session,
    };
    if claims.kind != expected {
        return Err(AppError::InvalidAuthToken);
    }

    // A session token outlives logout; the marker does not.
    if credential == CredentialKind::SessionCookie
        && state.cache.get(&keys::session(&claims.sub)).is_none()
    {
        return Err(AppError::SessionExpired);
    }

    let user = match state.store.get_user(&claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::Unauthorized),
        Err(AppError::Database(cause)) => return Err(AppError::Auth(cause)),
        Err(e) => return Err(AppError::Auth(e.to_string())),
    };

    if policy == Verification::Required && !user.email_verified {
        return Err(AppError::EmailNotVerified);
    }

    let context = AuthContext {
        user_id: user.id.clone(),
        user: user.into(),
        credential,
    };
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|token| token.to_string())
}
