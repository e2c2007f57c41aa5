// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Database layer (Firestore, with an in-memory backend for tests).

pub mod store;

pub use store::UserStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Uniqueness lock for emails (document ID is the email itself)
    pub const EMAIL_INDEX: &str = "email_index";
}
