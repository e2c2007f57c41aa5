// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Vitatrack: consumer health & fitness tracking backend
//!
//! This crate provides the API for the Vitatrack web app. The core is the
//! auth & session subsystem: registration with email verification, a
//! dual-token scheme (short-lived access token, long-lived session cookie),
//! and the client-side silent-refresh coordinator in [`client`].

pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use cache::TtlCache;
use config::Config;
use db::UserStore;
use services::{AuthService, TokenIssuer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: UserStore,
    pub cache: TtlCache,
    pub issuer: TokenIssuer,
    pub auth: AuthService,
}
