/// Outbound email collaborator.
///
/// Email delivery is a side effect of registration and password-reset
/// flows, never part of their contract: the session manager dispatches
/// messages fire-and-forget and logs failures instead of surfacing them.
///
/// The default transport posts to an HTTP mail API (Mailtrap-style); when
/// no mail endpoint is configured, [`LogMailer`] records the message to the
/// log and drops it, which keeps development setups working end to end.

use async_trait::async_trait;
use serde::Serialize;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Transport-level failure
    #[error("mail transport error: {0}")]
    Transport(String),

    /// Mail API answered with a non-success status
    #[error("mail API rejected message: {0}")]
    Rejected(String),
}

/// One outbound message
#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Builds the email-verification message for a freshly registered user.
///
/// `verify_url` embeds the raw one-time token; this message is the only
/// place the raw value ever appears.
pub fn verification_message(to: &str, username: &str, verify_url: &str) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Please verify your email".to_string(),
        body: format!(
            "Hi {username},\n\n\
             Welcome to taskcamp! To get started, please verify your email:\n\n\
             {verify_url}\n\n\
             The link is valid for 20 minutes. If you did not sign up, you can\n\
             ignore this message."
        ),
    }
}

/// Builds the password-reset message.
pub fn password_reset_message(to: &str, username: &str, reset_url: &str) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        body: format!(
            "Hi {username},\n\n\
             We got a request to reset your password. To choose a new one:\n\n\
             {reset_url}\n\n\
             The link is valid for 20 minutes. If you did not request a reset,\n\
             you can ignore this message."
        ),
    }
}

/// Fire-and-forget mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Mailer that posts messages to an HTTP mail API.
pub struct HttpApiMailer {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
    sender: String,
}

impl HttpApiMailer {
    pub fn new(endpoint: String, api_token: String, sender: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_token,
            sender,
        }
    }
}

#[derive(Serialize)]
struct ApiPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Mailer for HttpApiMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let payload = ApiPayload {
            from: &self.sender,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MailError::Rejected(format!(
                "status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Mailer that only logs, for environments without a mail endpoint.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "mail delivery disabled, dropping message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_message_carries_the_link() {
        let msg = verification_message("a@example.com", "alice", "https://app/verify/abc123");

        assert_eq!(msg.to, "a@example.com");
        assert!(msg.body.contains("https://app/verify/abc123"));
        assert!(msg.body.contains("alice"));
    }

    #[test]
    fn reset_message_carries_the_link() {
        let msg = password_reset_message("b@example.com", "bob", "https://app/reset/xyz");

        assert_eq!(msg.subject, "Reset your password");
        assert!(msg.body.contains("https://app/reset/xyz"));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let msg = verification_message("a@example.com", "alice", "https://app/verify/abc");
        assert!(LogMailer.send(msg).await.is_ok());
    }
}
