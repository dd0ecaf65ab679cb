use serde_json::json;

use crate::config::MailerConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("mail api rejected send: {0}")]
    Rejected(String),
}

/// Client for the transactional mail HTTP API.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: MailerConfig,
}

impl Mailer {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fires the verification code email. One attempt, no retries, the
    /// caller decides what a failure means.
    pub async fn send_verification(
        &self,
        email: &str,
        username: &str,
        code: &str,
        ttl_secs: u64,
    ) -> Result<(), MailerError> {
        let body = json!({
            "sender": {
                "email": self.config.sender_email,
                "name": self.config.sender_name,
            },
            "to": [{
                "email": email,
                "name": username,
            }],
            "subject": "Your Murmur verification code",
            "text_content": format!(
                "Hi {}, your Murmur verification code is {}. It expires in {} minutes.",
                username,
                code,
                ttl_secs / 60,
            ),
        });

        let res = self
            .client
            .post(self.config.endpoint.as_str())
            .header("api-key", self.config.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = res.status();

        if !status.is_success() {
            return Err(MailerError::Rejected(format!(
                "mail api returned {}",
                status
            )));
        }

        let verdict = res.json::<serde_json::Value>().await?;

        if verdict["success"].as_bool() != Some(true) {
            let message = verdict["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();

            return Err(MailerError::Rejected(message));
        }

        Ok(())
    }
}
