use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::{sleep, Duration};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

pub type MailResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Outbound email transport. The notification paths only see this trait, so
/// environments without an email provider run on the logging no-op instead.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> MailResult;
}

/// Resend when an API key is configured, otherwise log-only.
pub fn mailer_from_env() -> Arc<dyn Mailer> {
    match std::env::var("RESEND_API_KEY") {
        Ok(api_key) if !api_key.is_empty() => Arc::new(ResendMailer::new(api_key)),
        _ => {
            tracing::info!("RESEND_API_KEY not set, outbound email is disabled (log-only)");
            Arc::new(LogMailer)
        }
    }
}

/// Loads an HTML template and substitutes `{{placeholder}}` tokens.
pub fn render_template(
    template_path: &str,
    placeholders: &[(String, String)],
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut html_template = match fs::read_to_string(template_path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Failed to read email template {}: {}", template_path, e);
            return Err(format!("Template not found: {}", template_path).into());
        }
    };

    for (key, value) in placeholders {
        html_template = html_template.replace(key, value);
    }

    Ok(html_template)
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from_address: String,
}

impl ResendMailer {
    pub fn new(api_key: String) -> Self {
        let from_address = std::env::var("MAIL_FROM")
            .unwrap_or_else(|_| "CampusLance <noreply@campuslance.app>".to_string());
        Self {
            client: reqwest::Client::new(),
            api_key,
            from_address,
        }
    }

    async fn send_once(&self, to_email: &str, subject: &str, html_body: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from_address,
                "to": [to_email],
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Resend API returned {}: {}", status, body).into());
        }

        let body: serde_json::Value = response.json().await?;
        let email_id = body
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(email_id)
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> MailResult {
        if to_email.is_empty() || !to_email.contains('@') {
            return Err(format!("Invalid email address: {}", to_email).into());
        }

        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_once(to_email, subject, html_body).await {
                Ok(email_id) => {
                    tracing::info!("✓ Email sent to {} (id: {})", to_email, email_id);
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        let delay = RETRY_DELAY_MS * (2_u64.pow(attempt - 1)); // Exponential backoff
                        tracing::warn!(
                            "Email send attempt {} failed for {}. Retrying in {}ms...",
                            attempt,
                            to_email,
                            delay
                        );
                        sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        let error_msg = last_error
            .map(|e| format!("Failed after {} retries: {}", MAX_RETRIES, e))
            .unwrap_or_else(|| "Unknown email sending error".to_string());

        tracing::error!("✗ Email failed for {}: {}", to_email, error_msg);
        Err(error_msg.into())
    }
}

/// No-op transport for environments without an email provider.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to_email: &str, subject: &str, _html_body: &str) -> MailResult {
        tracing::info!("[mail disabled] to={} subject={}", to_email, subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogMailer;
        assert!(mailer
            .send("student@example.edu", "Hello", "<p>hi</p>")
            .await
            .is_ok());
    }

    #[test]
    fn render_substitutes_placeholders() {
        let path = "src/mail/templates/Proposal-accepted-email.html";
        let html = render_template(
            path,
            &[
                ("{{username}}".to_string(), "Dana".to_string()),
                ("{{job_title}}".to_string(), "Logo design".to_string()),
            ],
        )
        .unwrap();
        assert!(html.contains("Dana"));
        assert!(html.contains("Logo design"));
        assert!(!html.contains("{{username}}"));
    }

    #[test]
    fn missing_template_is_an_error() {
        assert!(render_template("src/mail/templates/Nope.html", &[]).is_err());
    }
}
