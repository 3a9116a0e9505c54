// mail.rs - outbound transactional email

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email provider rejected message with status {0}")]
    Rejected(u16),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Posts messages as JSON to a transactional email provider.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut request = self
            .client
            .post(&self.api_url)
            .timeout(std::time::Duration::from_secs(10))
            .json(email);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status().as_u16()));
        }
        info!("Sent '{}' to {}", email.subject, email.to);
        Ok(())
    }
}

/// Used when no provider is configured: messages only reach the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!("Email (not sent) to {}: {}", email.to, email.subject);
        Ok(())
    }
}

pub fn from_config(config: &EmailConfig) -> Arc<dyn Mailer> {
    match &config.api_url {
        Some(url) => Arc::new(HttpMailer::new(url.clone(), config.api_key.clone())),
        None => Arc::new(LogMailer),
    }
}

/// Replace `{{name}}` style placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{}}}}}", key), value)
    })
}
