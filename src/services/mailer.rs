use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::SmtpConfig;

/// Outbound mail is an external collaborator; everything behind this
/// trait is replaceable and carries its own deadline.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, username: &str, link: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .context("Invalid SMTP host")?
            .port(cfg.port)
            .timeout(Some(Duration::from_secs(10)));

        if !cfg.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ));
        }

        let from = cfg.from.parse().context("Invalid SMTP from address")?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, to: &str, username: &str, link: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("Invalid recipient address")?)
            .subject("Password reset")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Hello {username},\n\n\
                 A password reset was requested for your account. Follow the \
                 link below within 24 hours to choose a new password:\n\n\
                 {link}\n\n\
                 If you did not expect this, you can ignore this message.\n"
            ))
            .context("Failed to build reset mail")?;

        self.transport
            .send(email)
            .await
            .context("SMTP delivery failed")?;

        tracing::info!("Password reset mail sent to {to}");
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured; the reset flow still works,
/// the link just never leaves the process.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_password_reset(&self, to: &str, _username: &str, _link: &str) -> Result<()> {
        tracing::warn!("SMTP not configured; dropping password reset mail for {to}");
        Ok(())
    }
}
