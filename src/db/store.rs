// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! User store with typed operations.
//!
//! Production uses Firestore. Tests and local development without GCP
//! credentials use the in-memory backend, which implements the same
//! semantics (including the unique-email constraint).

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::db::collections;
use crate::error::AppError;
use crate::models::User;

/// Claim document in `email_index`. The document ID is the email, so a
/// create-only insert doubles as a uniqueness check.
#[derive(Debug, Serialize, Deserialize)]
struct EmailClaim {
    user_id: String,
}

#[derive(Debug, Default)]
struct MemoryStore {
    users: DashMap<String, User>,
    email_index: DashMap<String, String>,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Database client for user accounts.
#[derive(Clone)]
pub struct UserStore {
    backend: Backend,
}

impl UserStore {
    /// Connect to Firestore.
    ///
    /// For local development with the emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn connect(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::connect_emulator(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Connect to the Firestore emulator with unauthenticated access.
    async fn connect_emulator(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // ExternalJwtFunctionSource provides a dummy token without needing
        // a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// In-memory store for tests and credential-less local runs.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.users.get(user_id).map(|u| u.clone())),
        }
    }

    /// Look up a user by email. Emails are compared exactly as stored;
    /// nothing in the stack normalizes case.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let email = email.to_string();
                let mut found: Vec<User> = client
                    .fluent()
                    .select()
                    .from(collections::USERS)
                    .filter(move |q| q.field("email").eq(email.clone()))
                    .limit(1)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(found.pop())
            }
            Backend::Memory(store) => {
                let user_id = match store.email_index.get(email) {
                    Some(id) => id.clone(),
                    None => return Ok(None),
                };
                Ok(store.users.get(&user_id).map(|u| u.clone()))
            }
        }
    }

    /// Create a user. Fails with [`AppError::UserExists`] if the email is
    /// already claimed.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                // Claim the email first. Insert is create-only, so a second
                // claim for the same address conflicts.
                let claim = EmailClaim {
                    user_id: user.id.clone(),
                };
                let result: Result<EmailClaim, _> = client
                    .fluent()
                    .insert()
                    .into(collections::EMAIL_INDEX)
                    .document_id(&user.email)
                    .object(&claim)
                    .execute()
                    .await;
                match result {
                    Ok(_) => {}
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                        return Err(AppError::UserExists);
                    }
                    Err(e) => return Err(AppError::Database(e.to_string())),
                }

                let result: Result<User, _> = client
                    .fluent()
                    .insert()
                    .into(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await;
                if let Err(e) = result {
                    // Release the claim so the email is not locked by a
                    // half-created account.
                    let _ = client
                        .fluent()
                        .delete()
                        .from(collections::EMAIL_INDEX)
                        .document_id(&user.email)
                        .execute()
                        .await;
                    return Err(AppError::Database(e.to_string()));
                }
                Ok(())
            }
            Backend::Memory(store) => {
                use dashmap::mapref::entry::Entry;
                match store.email_index.entry(user.email.clone()) {
                    Entry::Occupied(_) => Err(AppError::UserExists),
                    Entry::Vacant(slot) => {
                        slot.insert(user.id.clone());
                        store.users.insert(user.id.clone(), user.clone());
                        Ok(())
                    }
                }
            }
        }
    }

    /// Overwrite an existing user document.
    pub async fn update_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: User = client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(email: &str) -> User {
        User::new("Ann".to_string(), email.to_string(), "$2b$10$h".to_string())
    }

    #[tokio::test]
    async fn test_create_then_find_by_email() {
        let store = UserStore::in_memory();
        let user = sample_user("ann@example.com");
        store.create_user(&user).await.unwrap();

        let found = store.find_by_email("ann@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = UserStore::in_memory();
        store
            .create_user(&sample_user("ann@example.com"))
            .await
            .unwrap();
        let err = store
            .create_user(&sample_user("ann@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserExists));
    }

    #[tokio::test]
    async fn test_update_round_trips() {
        let store = UserStore::in_memory();
        let mut user = sample_user("ann@example.com");
        store.create_user(&user).await.unwrap();

        user.email_verified = true;
        store.update_user(&user).await.unwrap();

        let stored = store.get_user(&user.id).await.unwrap().unwrap();
        assert!(stored.email_verified);
    }
}
