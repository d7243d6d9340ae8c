//! Email delivery for staff alerts.
//!
//! Supports two providers:
//! - `console`: logs emails (development)
//! - `sendgrid`: sends through the SendGrid v3 API

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use domain::services::notification::{
    FollowupReminderAlert, NewLeadAlert, NotificationResult, NotificationService,
};

use crate::config::EmailConfig;

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

/// Email service for staff alerts.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message through the configured provider.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        match self.config.provider.as_str() {
            "console" => {
                self.send_console(&message);
                Ok(())
            }
            "sendgrid" => self.send_sendgrid(&message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    fn lead_url(&self, lead_id: uuid::Uuid) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            domain::models::notification::lead_link(lead_id)
        )
    }

    /// Composes the alert sent when a website form creates a lead.
    pub fn new_lead_message(&self, recipient: &str, alert: &NewLeadAlert) -> EmailMessage {
        let mut body = format!(
            "A new {form} enquiry has arrived.\n\nName: {name}\nEmail: {email}\n",
            form = alert.form_type,
            name = alert.full_name,
            email = alert.email,
        );
        if let Some(phone) = &alert.phone {
            body.push_str(&format!("Phone: {}\n", phone));
        }
        if let Some(at) = alert.preferred_at {
            body.push_str(&format!("Preferred time: {}\n", at.format("%Y-%m-%d %H:%M UTC")));
        }
        if let Some(message) = &alert.message {
            body.push_str(&format!("\nMessage:\n{}\n", message));
        }
        body.push_str(&format!("\nOpen the lead: {}\n", self.lead_url(alert.lead_id)));

        EmailMessage {
            to: recipient.to_string(),
            subject: format!("New {} lead: {}", alert.form_type, alert.full_name),
            body_text: body,
        }
    }

    /// Composes the reminder sent to the owner of an overdue lead.
    pub fn reminder_message(&self, recipient: &str, alert: &FollowupReminderAlert) -> EmailMessage {
        let prefix = if alert.is_urgent { "URGENT: " } else { "" };
        let days = match alert.days_overdue {
            1 => "1 day".to_string(),
            n => format!("{} days", n),
        };

        EmailMessage {
            to: recipient.to_string(),
            subject: format!("{}Follow-up overdue for {}", prefix, alert.lead_name),
            body_text: format!(
                "The follow-up for {name} is {days} overdue.\n\nOpen the lead: {url}\n",
                name = alert.lead_name,
                days = days,
                url = self.lead_url(alert.lead_id),
            ),
        }
    }

    async fn deliver(&self, message: EmailMessage) -> NotificationResult {
        if !self.config.enabled {
            debug!(to = %message.to, subject = %message.subject, "Email disabled, skipping send");
            return NotificationResult::Skipped;
        }
        if message.to.trim().is_empty() {
            return NotificationResult::NoRecipient;
        }
        match self.send(message).await {
            Ok(()) => NotificationResult::Sent,
            Err(e) => NotificationResult::Failed(e.to_string()),
        }
    }

    fn send_console(&self, message: &EmailMessage) {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body");
    }

    async fn send_sendgrid(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body_text
            }]
        });

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for EmailService {
    async fn send_new_lead_alert(&self, recipient: &str, alert: &NewLeadAlert) -> NotificationResult {
        self.deliver(self.new_lead_message(recipient, alert)).await
    }

    async fn send_followup_reminder(
        &self,
        recipient: &str,
        alert: &FollowupReminderAlert,
    ) -> NotificationResult {
        self.deliver(self.reminder_message(recipient, alert)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::form_submission::FormType;
    use uuid::Uuid;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sender_email: "leads@example.com".to_string(),
            sender_name: "Leads".to_string(),
            base_url: "https://crm.example.com/".to_string(),
        }
    }

    fn alert() -> NewLeadAlert {
        let mut alert = NewLeadAlert::new(
            Uuid::nil(),
            "Ada Lovelace",
            "ada@example.com",
            Some("07700 900123"),
            FormType::Callback,
        );
        alert.message = Some("Please call after 5pm".to_string());
        alert
    }

    #[test]
    fn test_new_lead_message() {
        let service = EmailService::new(test_config());
        let message = service.new_lead_message("ops@example.com", &alert());

        assert_eq!(message.subject, "New callback lead: Ada Lovelace");
        assert!(message.body_text.contains("Phone: 07700 900123"));
        assert!(message.body_text.contains("Please call after 5pm"));
        assert!(message
            .body_text
            .contains("https://crm.example.com/leads/00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_reminder_message_marks_urgent() {
        let service = EmailService::new(test_config());
        let reminder = FollowupReminderAlert {
            reminder_id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            lead_name: "Grace Hopper".to_string(),
            days_overdue: 4,
            is_urgent: true,
        };
        let message = service.reminder_message("owner@example.com", &reminder);
        assert!(message.subject.starts_with("URGENT: "));
        assert!(message.body_text.contains("4 days overdue"));
    }

    #[tokio::test]
    async fn test_console_delivery() {
        let service = EmailService::new(test_config());
        let result = service.send_new_lead_alert("ops@example.com", &alert()).await;
        assert_eq!(result, NotificationResult::Sent);
    }

    #[tokio::test]
    async fn test_disabled_is_skipped() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config);
        assert!(!service.is_enabled());

        let result = service.send_new_lead_alert("ops@example.com", &alert()).await;
        assert_eq!(result, NotificationResult::Skipped);
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_fails() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);

        let result = service.send_new_lead_alert("ops@example.com", &alert()).await;
        assert!(matches!(result, NotificationResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails() {
        let mut config = test_config();
        config.provider = "pigeon".to_string();
        let service = EmailService::new(config);
        let message = service.new_lead_message("ops@example.com", &alert());
        assert!(matches!(service.send(message).await, Err(EmailError::NotConfigured)));
    }
}
