// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Services module - business logic layer.

pub mod auth;
pub mod email;
pub mod tokens;

pub use auth::AuthService;
pub use email::Mailer;
pub use tokens::{TokenIssuer, TokenKind};
