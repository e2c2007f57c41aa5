// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Middleware modules (authentication, security, etc.).

pub mod auth;
pub mod security;

pub use auth::{
    require_user, require_verified_user, AuthContext, CredentialKind, SESSION_COOKIE,
};
