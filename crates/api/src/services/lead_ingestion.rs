//! Website form ingestion.
//!
//! Normalizes a submission, persists the lead, then runs the follow-on
//! tasks concurrently. Only the lead insert can fail the request; the
//! follow-on tasks log and carry on.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use domain::models::calendar_event::NewCalendarEvent;
use domain::models::form_submission::{FormPayload, NormalizedLead};
use domain::models::lead_note::NewLeadNote;
use domain::models::notification::{NewNotification, NotificationType};
use domain::models::Lead;
use domain::services::notification::{NewLeadAlert, NotificationService};
use domain::services::{normalize_submission, IngestionError};
use persistence::repositories::{
    CalendarEventRepository, LeadNoteRepository, LeadRepository, NotificationRepository,
};

use crate::config::CrmConfig;
use crate::error::ApiError;
use crate::middleware::metrics::record_lead_ingested;
use crate::services::staff_alerts::{elevated_staff, fan_out};

/// Errors that can fail an ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Invalid(#[from] IngestionError),

    #[error("Failed to store lead: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Invalid(e) => e.into(),
            IngestError::Storage(e) => e.into(),
        }
    }
}

/// Runs a submission through normalization, storage and follow-on tasks.
pub struct LeadIngestionService {
    pool: PgPool,
    crm: CrmConfig,
    notifier: Arc<dyn NotificationService>,
}

impl LeadIngestionService {
    pub fn new(pool: PgPool, crm: CrmConfig, notifier: Arc<dyn NotificationService>) -> Self {
        Self {
            pool,
            crm,
            notifier,
        }
    }

    /// Ingests one submission and returns the stored lead.
    pub async fn ingest(&self, payload: &FormPayload) -> Result<Lead, IngestError> {
        let normalized = normalize_submission(payload, &self.crm.default_academic_year)?;

        let lead: Lead = LeadRepository::new(self.pool.clone())
            .create(&normalized.lead)
            .await?
            .into();

        record_lead_ingested(normalized.form_type.as_str());
        info!(
            lead_id = %lead.id,
            form_type = %normalized.form_type,
            status = %lead.lead_status,
            "Lead ingested from website form"
        );

        tokio::join!(
            self.record_note(&lead, &normalized),
            self.book_calendar_slot(&lead, &normalized),
            self.alert_staff(&lead, &normalized),
        );

        Ok(lead)
    }

    async fn record_note(&self, lead: &Lead, normalized: &NormalizedLead) {
        let note = NewLeadNote::system(lead.id, normalized.note_body());
        if let Err(e) = LeadNoteRepository::new(self.pool.clone()).create(&note).await {
            warn!(lead_id = %lead.id, error = %e, "Failed to record ingestion note");
        }
    }

    async fn book_calendar_slot(&self, lead: &Lead, normalized: &NormalizedLead) {
        let (Some(event_type), Some(starts_at)) =
            (normalized.form_type.calendar_event_type(), normalized.preferred_at)
        else {
            return;
        };

        let event =
            NewCalendarEvent::starting_at(lead.id, event_type, normalized.calendar_title(), starts_at);
        if let Err(e) = CalendarEventRepository::new(self.pool.clone())
            .create(&event)
            .await
        {
            warn!(lead_id = %lead.id, error = %e, "Failed to create calendar event");
        }
    }

    async fn alert_staff(&self, lead: &Lead, normalized: &NormalizedLead) {
        if !normalized.wants_new_lead_alert() {
            return;
        }

        let staff = match elevated_staff(&self.pool).await {
            Ok(staff) => staff,
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "Failed to load staff for new lead alert");
                Vec::new()
            }
        };

        let title = format!("New {} lead", normalized.form_type);
        let message = format!("{} ({}) submitted a website form", lead.full_name, lead.email);
        let notifications = fan_out(&staff, None, |user_id| {
            NewNotification::for_lead(user_id, NotificationType::NewLead, lead.id, &title, &message)
                .with_metadata(serde_json::json!({ "form_type": normalized.form_type.as_str() }))
        });
        if let Err(e) = NotificationRepository::new(self.pool.clone())
            .create_many(&notifications)
            .await
        {
            warn!(lead_id = %lead.id, error = %e, "Failed to create new lead notifications");
        }

        let mut alert = NewLeadAlert::new(
            lead.id,
            &lead.full_name,
            &lead.email,
            lead.phone.as_deref(),
            normalized.form_type,
        );
        alert.message = normalized.message.clone();
        alert.preferred_at = normalized.preferred_at;

        let staff_emails: Vec<String> = staff.into_iter().map(|user| user.email).collect();
        for recipient in alert_recipients(&self.crm.new_lead_alert_recipients, &staff_emails) {
            let result = self.notifier.send_new_lead_alert(&recipient, &alert).await;
            if !result.is_sent() {
                warn!(
                    lead_id = %lead.id,
                    recipient = %recipient,
                    result = ?result,
                    "New lead alert was not delivered"
                );
            }
        }
    }
}

/// Configured recipients win; otherwise the elevated staff are emailed.
pub fn alert_recipients(configured: &[String], staff_emails: &[String]) -> Vec<String> {
    let configured: Vec<String> = configured
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if !configured.is_empty() {
        return configured;
    }
    staff_emails.to_vec()
}
