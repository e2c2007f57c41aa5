// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Outbound email delivery.
//!
//! Three transports: an HTTP mail API for production, a log-only transport
//! for credential-less local runs, and a capturing mock for tests. Callers
//! decide how a delivery failure maps onto the API (registration shrugs it
//! off, resend and forgot-password surface it).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Config;

/// A rendered email as handed to the transport.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Capturing sink used by the mock transport.
#[derive(Debug, Default)]
pub struct MockOutbox {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: AtomicBool,
}

impl MockOutbox {
    /// Make subsequent sends fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[derive(Clone)]
enum Transport {
    Http {
        client: reqwest::Client,
        api_url: String,
        api_key: String,
    },
    Log,
    Mock(Arc<MockOutbox>),
}

/// Email service.
#[derive(Clone)]
pub struct Mailer {
    transport: Transport,
    from: String,
    frontend_url: String,
}

#[derive(serde::Serialize)]
struct MailApiRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl Mailer {
    /// Pick a transport from config: the HTTP mail API when configured,
    /// otherwise log-only.
    pub fn from_config(config: &Config) -> Self {
        let transport = match (&config.mail_api_url, &config.mail_api_key) {
            (Some(api_url), Some(api_key)) => Transport::Http {
                client: reqwest::Client::new(),
                api_url: api_url.clone(),
                api_key: api_key.clone(),
            },
            _ => {
                tracing::warn!("MAIL_API_URL/MAIL_API_KEY not set; emails will only be logged");
                Transport::Log
            }
        };
        Self {
            transport,
            from: config.mail_from.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    /// Capturing mailer for tests. The returned outbox observes every send.
    pub fn mock(frontend_url: &str) -> (Self, Arc<MockOutbox>) {
        let outbox = Arc::new(MockOutbox::default());
        let mailer = Self {
            transport: Transport::Mock(outbox.clone()),
            from: "noreply@vitatrack.test".to_string(),
            frontend_url: frontend_url.to_string(),
        };
        (mailer, outbox)
    }

    pub async fn send_verification_email(
        &self,
        to: &str,
        name: &str,
        code: &str,
    ) -> anyhow::Result<()> {
        let link = format!(
            "{}/verify-email?token={}&email={}",
            self.frontend_url,
            code,
            urlencoding::encode(to)
        );
        let body = format!(
            "Hi {name},\n\n\
             Confirm your email address to activate your account:\n\n\
             {link}\n\n\
             The link expires in 10 minutes.\n"
        );
        self.send(to, "Verify your email", &body).await
    }

    pub async fn send_reset_email(&self, to: &str, name: &str, code: &str) -> anyhow::Result<()> {
        let link = format!(
            "{}/reset-password?token={}&email={}",
            self.frontend_url,
            code,
            urlencoding::encode(to)
        );
        let body = format!(
            "Hi {name},\n\n\
             A password reset was requested for your account. If this was\n\
             you, set a new password here:\n\n\
             {link}\n\n\
             The link expires in 1 hour. Otherwise you can ignore this email.\n"
        );
        self.send(to, "Reset your password", &body).await
    }

    /// Sent once after a successful verification. Best-effort everywhere.
    pub async fn send_welcome_email(&self, to: &str, name: &str) -> anyhow::Result<()> {
        let body = format!(
            "Hi {name},\n\n\
             Your email is verified and your account is active. Head to\n\
             {}/onboarding to set up your health profile.\n",
            self.frontend_url
        );
        self.send(to, "Welcome to Vitatrack", &body).await
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        match &self.transport {
            Transport::Http {
                client,
                api_url,
                api_key,
            } => {
                let request = MailApiRequest {
                    from: &self.from,
                    to,
                    subject,
                    text: body,
                };
                client
                    .post(api_url)
                    .bearer_auth(api_key)
                    .json(&request)
                    .send()
                    .await?
                    .error_for_status()?;
                tracing::info!(to = %to, subject = %subject, "Email sent");
                Ok(())
            }
            Transport::Log => {
                tracing::info!(to = %to, subject = %subject, "Email (log transport)");
                tracing::debug!(body = %body, "Email body");
                Ok(())
            }
            Transport::Mock(outbox) => {
                if outbox.fail.load(Ordering::SeqCst) {
                    anyhow::bail!("mock transport failure");
                }
                if let Ok(mut sent) = outbox.sent.lock() {
                    sent.push(OutboundEmail {
                        to: to.to_string(),
                        subject: subject.to_string(),
                        body: body.to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}
