// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Auth service - registration, verification, login, and password reset.
//!
//! Owns the flows that tie the user store, the TTL cache, the token
//! issuer, and the mailer together. Handlers stay thin: parse, call one
//! method here, wrap the outcome in the response envelope.

use std::time::Duration;

use ring::rand::{SecureRandom, SystemRandom};

use crate::cache::{keys, TtlCache};
use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{PublicUser, User};
use crate::services::email::Mailer;
use crate::services::tokens::{
    TokenIssuer, TokenKind, ACCESS_TOKEN_TTL_SECS, SESSION_TOKEN_TTL_SECS,
};

/// Verification codes live 10 minutes.
pub const VERIFICATION_CODE_TTL: Duration = Duration::from_secs(600);
/// Password reset codes live 1 hour.
pub const RESET_CODE_TTL: Duration = Duration::from_secs(3600);
/// Session markers live exactly as long as the session token.
pub const SESSION_MARKER_TTL: Duration = Duration::from_secs(SESSION_TOKEN_TTL_SECS as u64);

const BCRYPT_COST: u32 = 10;

/// Tokens handed out at login (and at verify-with-login). The access token
/// goes in the response body, the session token in the cookie.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub session_token: String,
}

#[derive(Debug)]
pub struct VerifyOutcome {
    pub user: PublicUser,
    /// Present when the caller asked to be logged in on verification.
    pub tokens: Option<IssuedTokens>,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: IssuedTokens,
}

/// Business logic for the auth subsystem.
#[derive(Clone)]
pub struct AuthService {
    store: UserStore,
    cache: TtlCache,
    issuer: TokenIssuer,
    mailer: Mailer,
    rng: SystemRandom,
}

impl AuthService {
    pub fn new(store: UserStore, cache: TtlCache, issuer: TokenIssuer, mailer: Mailer) -> Self {
        Self {
            store,
            cache,
            issuer,
            mailer,
            rng: SystemRandom::new(),
        }
    }

    // ─── Registration & Verification ─────────────────────────────

    /// Create an unverified account and dispatch the verification email.
    /// The email send is best-effort: the account exists either way and
    /// the code is already in the cache for a later resend.
    ///
    /// Returns the new user's ID.
    pub async fn register(&self, name: String, email: String, password: String) -> Result<String> {
        let password_hash = self.hash_password(password).await?;
        let user = User::new(name, email, password_hash);

        match self.store.create_user(&user).await {
            Ok(()) => {}
            Err(AppError::UserExists) => return Err(AppError::UserExists),
            Err(AppError::Database(cause)) => return Err(AppError::Registration(cause)),
            Err(e) => return Err(e),
        }

        let code = self.generate_code()?;
        self.cache
            .put(&keys::verification(&user.email), &code, VERIFICATION_CODE_TTL);

        if let Err(e) = self
            .mailer
            .send_verification_email(&user.email, &user.name, &code)
            .await
        {
            tracing::warn!(
                user_id = %user.id,
                error = %e,
                "Failed to send verification email; account created anyway"
            );
        }

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.id)
    }

    /// Consume a verification code and mark the account verified. With
    /// `login` set, also open a session so the frontend can skip the
    /// login form right after verification.
    pub async fn verify_email(&self, email: &str, token: &str, login: bool) -> Result<VerifyOutcome> {
        let key = keys::verification(email);
        if !self.cache.matches(&key, token) {
            return Err(AppError::InvalidToken);
        }

        let mut user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        user.email_verified = true;
        user.touch();
        self.store.update_user(&user).await?;

        // Single-use: only after the flag is persisted, so a failed update
        // leaves the code alive for a retry.
        self.cache.remove(&key);

        if let Err(e) = self.mailer.send_welcome_email(&user.email, &user.name).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send welcome email");
        }

        let tokens = if login {
            Some(self.start_session(&user)?)
        } else {
            None
        };

        tracing::info!(user_id = %user.id, login, "Email verified");
        Ok(VerifyOutcome {
            user: user.into(),
            tokens,
        })
    }

    /// Mint a fresh verification code, replacing any live one.
    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;
        if user.email_verified {
            return Err(AppError::AlreadyVerified);
        }

        let code = self.generate_code()?;
        self.cache
            .put(&keys::verification(email), &code, VERIFICATION_CODE_TTL);

        // Unlike registration, the user explicitly asked for this email,
        // so a delivery failure is their answer.
        self.mailer
            .send_verification_email(&user.email, &user.name, &code)
            .await
            .map_err(|e| AppError::Resend(e.to_string()))?;

        Ok(())
    }

    // ─── Login & Sessions ────────────────────────────────────────

    /// Password login. Unknown email and wrong password produce the same
    /// error; the verified-email check runs only after the password
    /// matched, so the error never reveals whether an address is signed up.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_ok = self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?;
        if !password_ok {
            return Err(AppError::InvalidCredentials);
        }

        if !user.email_verified {
            return Err(AppError::EmailNotVerified);
        }

        let tokens = self.start_session(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            user: user.into(),
            tokens,
        })
    }

    /// Fresh access token for an already-authenticated session credential.
    /// The gate has verified cookie and marker before this runs.
    pub fn refresh_access_token(&self, user_id: &str) -> Result<String> {
        let token = self
            .issuer
            .issue(TokenKind::Access, user_id, ACCESS_TOKEN_TTL_SECS)?;
        tracing::debug!(user_id = %user_id, "Access token refreshed");
        Ok(token)
    }

    /// Drop the session marker if the cookie carries a valid session
    /// token. Logout never fails: a dead or garbled session is already
    /// logged out.
    pub fn logout(&self, session_token: Option<&str>) {
        let Some(token) = session_token else { return };
        let Ok(claims) = self.issuer.verify(token) else {
            return;
        };
        if claims.kind == TokenKind::Session {
            self.cache.remove(&keys::session(&claims.sub));
            tracing::info!(user_id = %claims.sub, "User logged out");
        }
    }

    // ─── Password Reset ──────────────────────────────────────────

    /// Start a password reset. The caller's response is identical whether
    /// or not the account exists; only an email delivery failure for an
    /// existing account surfaces as an error.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let Some(user) = self.store.find_by_email(email).await? else {
            tracing::debug!(email = %email, "Password reset requested for unknown email");
            return Ok(());
        };

        let code = self.generate_code()?;
        self.cache
            .put(&keys::password_reset(email), &code, RESET_CODE_TTL);

        self.mailer
            .send_reset_email(&user.email, &user.name, &code)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        Ok(())
    }

    /// Consume a reset code and store the new password hash.
    pub async fn reset_password(&self, email: &str, token: &str, new_password: String) -> Result<()> {
        let key = keys::password_reset(email);
        if !self.cache.matches(&key, token) {
            return Err(AppError::InvalidToken);
        }

        let mut user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        user.password_hash = self.hash_password(new_password).await?;
        user.touch();
        self.store.update_user(&user).await?;

        self.cache.remove(&key);
        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────

    /// Issue the access/session token pair and write the session marker
    /// the gate checks for cookie credentials.
    fn start_session(&self, user: &User) -> Result<IssuedTokens> {
        let access_token = self
            .issuer
            .issue(TokenKind::Access, &user.id, ACCESS_TOKEN_TTL_SECS)?;
        let session_token = self
            .issuer
            .issue(TokenKind::Session, &user.id, SESSION_TOKEN_TTL_SECS)?;
        self.cache.put(
            &keys::session(&user.id),
            &chrono::Utc::now().to_rfc3339(),
            SESSION_MARKER_TTL,
        );
        Ok(IssuedTokens {
            access_token,
            session_token,
        })
    }

    /// 32 random bytes, hex-encoded, from the system CSPRNG.
    fn generate_code(&self) -> Result<String> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("system rng failure"))?;
        Ok(hex::encode(bytes))
    }

    /// Bcrypt runs ~100 ms at this cost; keep it off the async workers.
    async fn hash_password(&self, password: String) -> Result<String> {
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
            .await
            .map_err(anyhow::Error::from)?
            .map_err(anyhow::Error::from)?;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool> {
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(anyhow::Error::from)?
            .map_err(anyhow::Error::from)?;
        Ok(matched)
    }
}
