// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; secrets (the JWT signing key, the
//! mail relay key) are injected as environment variables by the deployment
//! environment and cached in memory.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and for links embedded in emails
    pub frontend_url: String,
    /// GCP project ID for the Firestore user store.
    /// `None` selects the in-memory store (local development, tests).
    pub gcp_project_id: Option<String>,
    /// Server port
    pub port: u16,
    /// True when running in production (`APP_ENV=production`).
    /// Controls the `Secure` attribute on the session cookie.
    pub production: bool,

    // --- Secrets (injected as env vars) ---
    /// JWT signing key for access and session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HTTP mail relay endpoint. `None` selects the log-only mailer.
    pub mail_api_url: Option<String>,
    /// API key for the mail relay
    pub mail_api_key: Option<String>,
    /// From address for outbound mail
    pub mail_from: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SIGNING_KEY` is the only hard requirement; everything else has
    /// a local-development default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").ok().filter(|v| !v.is_empty()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").ok().filter(|v| !v.is_empty()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Vitatrack <no-reply@vitatrack.app>".to_string()),
        })
    }

    /// Default config for tests: in-memory store, log mailer, fixed key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: None,
            port: 8080,
            production: false,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            mail_api_url: None,
            mail_api_key: None,
            mail_from: "Vitatrack <no-reply@vitatrack.test>".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!!");
        env::set_var("APP_ENV", "development");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert!(!config.production);
        assert_eq!(
            config.jwt_signing_key,
            b"test_jwt_key_32_bytes_minimum!!!".to_vec()
        );
    }

    #[test]
    fn test_default_is_offline() {
        let config = Config::test_default();
        assert!(config.gcp_project_id.is_none());
        assert!(config.mail_api_url.is_none());
        assert!(!config.production);
    }
}
