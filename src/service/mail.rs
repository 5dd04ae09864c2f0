use async_trait::async_trait;
use log::error;
use serde_json::json;

use crate::errors::ApiError;

/// Mail relay collaborator. Fire-and-forget from the caller's side:
/// a failure surfaces as `ServerError`, nothing is retried.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), ApiError>;
}

/// Brevo transactional-mail API client.
pub struct BrevoMailer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BrevoMailer {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, "https://api.brevo.com")
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), ApiError> {
        let body = json!({
            "sender": { "name": "TA Travel", "email": "info@ta-travel.ru" },
            "to": [{ "email": to }],
            "subject": subject,
            "htmlContent": html,
        });
        let res = self
            .http
            .post(format!("{}/v3/smtp/email", self.base_url))
            .header("accept", "application/json")
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("brevo request failed: {:?}", e);
                ApiError::ServerError
            })?;
        if !res.status().is_success() {
            error!("brevo rejected mail to {}: {}", to, res.status());
            return Err(ApiError::ServerError);
        }
        Ok(())
    }
}
