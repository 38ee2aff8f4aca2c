use async_trait::async_trait;
use tracing::info;

/// Outbound email seam. Only the password reset flow sends mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, link: &str) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of delivering it. The reset token
/// in the link is never logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, link: &str) -> anyhow::Result<()> {
        let link = redact_link(link);
        info!(to, link = %link, "password reset email");
        Ok(())
    }
}

/// Replaces the last path segment (the token) with a placeholder.
fn redact_link(link: &str) -> String {
    match link.rsplit_once('/') {
        Some((base, _token)) => format!("{base}/<redacted>"),
        None => "<redacted>".to_string(),
    }
}
