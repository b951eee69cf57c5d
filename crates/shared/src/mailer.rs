use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Credentials;
use crate::cycle::DigestSender;

pub const SMTP_HOST: &str = "smtp.gmail.com";

/// Sends the rendered digest over SMTPS (implicit TLS, port 465). Failures
/// propagate to the caller; there is no retry, and the caller must not mark
/// the window consumed until delivery is confirmed.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(SMTP_HOST)
            .context("Failed to configure SMTP transport")?
            .credentials(SmtpCredentials::new(
                credentials.email.clone(),
                credentials.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: credentials.email.clone(),
        })
    }

    pub async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        let message = build_message(&self.from, to, subject, html_body)?;
        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}

#[async_trait]
impl DigestSender for Mailer {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        Mailer::send(self, to, subject, html_body).await
    }
}

fn build_message(from: &str, to: &str, subject: &str, html_body: String) -> Result<Message> {
    Message::builder()
        .from(
            from.parse()
                .with_context(|| format!("Invalid sender address: {from}"))?,
        )
        .to(to
            .parse()
            .with_context(|| format!("Invalid recipient address: {to}"))?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html_body)
        .context("Failed to build email message")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_html_message() {
        let message = build_message(
            "scanner@example.com",
            "ada@example.com",
            "New Papers in Your Interest Area",
            "<html><body>digest</body></html>".to_string(),
        )
        .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: New Papers in Your Interest Area"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("From: scanner@example.com"));
    }

    #[test]
    fn rejects_malformed_recipient() {
        let result = build_message(
            "scanner@example.com",
            "not an address",
            "subject",
            String::new(),
        );
        assert!(result.is_err());
    }
}
