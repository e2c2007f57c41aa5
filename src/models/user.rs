// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! User model for storage and API.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::HealthProfile;

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// ULID, also used as document ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address (unique across accounts)
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Whether the email has been verified
    pub email_verified: bool,
    /// Whether onboarding has been completed
    pub onboarding_complete: bool,
    /// Health profile, present once onboarding is done
    pub profile: Option<HealthProfile>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Last modification timestamp (RFC 3339)
    pub updated_at: String,
}

impl User {
    /// New unverified account with a fresh ULID.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: ulid::Ulid::new().to_string(),
            name,
            email,
            password_hash,
            email_verified: false,
            onboarding_complete: false,
            profile: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().to_rfc3339();
    }
}

/// API-facing view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub onboarding_complete: bool,
    pub profile: Option<HealthProfile>,
    pub created_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            email_verified: user.email_verified,
            onboarding_complete: user.onboarding_complete,
            profile: user.profile,
            created_at: user.created_at,
        }
    }
}
