use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// Out-of-band message channel. The flow hands over a recipient and a
/// rendered message; delivery details stay behind this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
            .context("smtp transport")?
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .port(cfg.port)
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();
        let from = cfg.from.parse().context("invalid SMTP_FROM address")?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")?;
        self.transport.send(email).await.context("smtp send")?;
        tracing::info!(to = %to, "email dispatched");
        Ok(())
    }
}

/// A message captured by [`RecordingMailer`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer double that keeps every message in memory instead of talking
/// to an SMTP server. Tests inspect `sent` to see what went out.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<SentEmail>>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mail log poisoned"))?;
        sent.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Render the password-reset email as (subject, plain-text body).
pub fn reset_password_email(base_url: &str, token: &str, ttl_minutes: i64) -> (String, String) {
    let subject = "Password Reset Request".to_string();
    let body = format!(
        "To reset your password, visit the following link:\n\
        \n\
        {}/reset_password/{}\n\
        \n\
        This link will expire in {} minutes.\n\
        \n\
        If you did not make this request then simply ignore this email \
        and no changes will be made.\n",
        base_url.trim_end_matches('/'),
        token,
        ttl_minutes,
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_contains_link_and_token() {
        let (subject, body) = reset_password_email("https://blog.example.com", "tok-123", 30);
        assert_eq!(subject, "Password Reset Request");
        assert!(body.contains("https://blog.example.com/reset_password/tok-123"));
        assert!(body.contains("expire in 30 minutes"));
        assert!(body.contains("ignore this email"));
    }

    #[test]
    fn reset_email_normalizes_trailing_slash() {
        let (_, body) = reset_password_email("https://blog.example.com/", "abc", 30);
        assert!(body.contains("https://blog.example.com/reset_password/abc"));
        assert!(!body.contains(".com//reset_password"));
    }

    #[tokio::test]
    async fn recorded_mail_keeps_recipient_and_content() {
        let mailer = RecordingMailer::default();
        mailer
            .send("alice@example.com", "Password Reset Request", "the link")
            .await
            .expect("recording send");

        let sent = mailer.sent.lock().expect("mail log");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "Password Reset Request");
        assert_eq!(sent[0].body, "the link");
    }
}
