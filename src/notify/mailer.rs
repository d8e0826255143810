// src/notify/mailer.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::core::config_manager::MailSettings;
use crate::core::ServiceClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Resend-compatible `/emails` API
pub struct ResendMailer {
    service: ServiceClient,
    from: String,
}

impl ResendMailer {
    pub fn new(settings: &MailSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            service: ServiceClient::new(&settings.base_url, &settings.api_key, timeout)?,
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };

        let response: serde_json::Value = self
            .service
            .post_json("/emails", &request)
            .await
            .with_context(|| format!("Failed to send e-mail to {}", email.to))?;

        debug!("Mail accepted for {}: {}", email.to, response["id"]);
        Ok(())
    }
}
