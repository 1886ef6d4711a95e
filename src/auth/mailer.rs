use async_trait::async_trait;

/// Outbound mail used by the password reset flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> anyhow::Result<()>;
}

/// Writes reset links to the log instead of sending mail.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> anyhow::Result<()> {
        tracing::info!(to, reset_link, "password reset requested");
        Ok(())
    }
}
