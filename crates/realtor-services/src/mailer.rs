//! Transactional mail
//!
//! Notifications never block or fail the request that triggers them: they
//! are handed to [`spawn_send`] and delivery errors are only logged.

use async_trait::async_trait;
use realtor_core::{
    config::MailConfig,
    models::{ServiceKind, ServiceStatus},
    traits::{MailMessage, Mailer},
    AppError, AppResult,
};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Mailer backed by the Resend HTTP API
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    api_base: String,
}

impl ResendMailer {
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": message.to,
                "subject": message.subject,
                "html": message.html,
            }))
            .send()
            .await
            .map_err(|e| AppError::Mail(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Mail(format!("HTTP {}: {}", status, body)));
        }

        debug!(subject = %message.subject, "Mail accepted by provider");
        Ok(())
    }
}

/// Mailer that only logs, used when delivery is disabled
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        info!(
            to = ?message.to,
            subject = %message.subject,
            "Mail delivery disabled, message dropped"
        );
        Ok(())
    }
}

/// Build the configured mailer
pub fn mailer_from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    if config.enabled {
        if config.api_key.is_empty() {
            return Err(AppError::Config(
                "mail.api_key is required when mail is enabled".to_string(),
            ));
        }
        Ok(Arc::new(ResendMailer::new(config)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

/// Send in the background; failures are logged and dropped
pub fn spawn_send(mailer: Arc<dyn Mailer>, message: MailMessage) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&message).await {
            warn!(subject = %message.subject, error = %e, "Failed to send notification");
        }
    });
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(heading: &str, body: &str, link: &str, link_label: &str) -> String {
    format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">{heading}</h2>
  <p>Hello,</p>
  {body}
  <div style="margin-top: 20px; padding: 15px; background-color: #f5f5f5; border-radius: 5px; text-align: center;">
    <a href="{link}" style="display: inline-block; padding: 10px 20px; background-color: #2196F3; color: white; text-decoration: none; border-radius: 5px;">{link_label}</a>
  </div>
  <p style="color: #666; font-size: 0.9em;">Thank you for using our service.</p>
</div>"##
    )
}

/// Confirmation sent to the realtor when a service request is submitted
pub fn project_submitted(to: &str, app_url: &str, kind: ServiceKind, request_id: Uuid) -> MailMessage {
    let name = format!("{} request", kind.label());
    MailMessage {
        to: vec![to.to_string()],
        subject: format!("Project Submitted: {}", name),
        html: layout(
            "Project Submission Confirmation",
            &format!(
                "<p>Your project <strong>{}</strong> has been successfully submitted for review.</p>\n  \
                 <p>Our team will review your submission and get back to you soon.</p>",
                escape(&name)
            ),
            &format!("{}/dashboard/{}/{}", app_url, kind, request_id),
            "View Project",
        ),
    }
}

/// Notice sent to the realtor when an admin moves a request
pub fn project_status_changed(
    to: &str,
    app_url: &str,
    kind: ServiceKind,
    request_id: Uuid,
    from: ServiceStatus,
    new_status: ServiceStatus,
) -> MailMessage {
    let name = format!("{} request", kind.label());
    MailMessage {
        to: vec![to.to_string()],
        subject: format!("Project Status Update: {}", name),
        html: layout(
            "Project Status Update",
            &format!(
                "<p>The status of your project <strong>{}</strong> has changed:</p>\n  \
                 <p>From: {}<br>To: <strong>{}</strong></p>",
                escape(&name),
                from,
                new_status
            ),
            &format!("{}/dashboard/{}/{}", app_url, kind, request_id),
            "View Project",
        ),
    }
}

/// Notice sent when an admin approves a realtor account
pub fn realtor_approved(to: &str, app_url: &str, full_name: &str) -> MailMessage {
    MailMessage {
        to: vec![to.to_string()],
        subject: "Your realtor account has been approved".to_string(),
        html: layout(
            "Account Approved",
            &format!(
                "<p>{}, your account is approved. You can now order services from your dashboard.</p>",
                escape(full_name)
            ),
            &format!("{}/dashboard", app_url),
            "View Dashboard",
        ),
    }
}
