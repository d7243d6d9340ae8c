//! Website form webhook handler.

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::FormSubmission;
use crate::services::LeadIngestionService;
use domain::models::form_submission::WebhookAcceptedResponse;

/// Receive a form submission from the website's form provider.
///
/// Accepts JSON, URL-encoded and multipart bodies.
///
/// POST /api/v1/webhooks/forms
pub async fn receive_form(
    State(state): State<AppState>,
    FormSubmission(payload): FormSubmission,
) -> Result<Json<WebhookAcceptedResponse>, ApiError> {
    tracing::debug!(fields = payload.len(), "Form submission received");

    let service = LeadIngestionService::new(
        state.pool.clone(),
        state.config.crm.clone(),
        state.notifier.clone(),
    );
    let lead = service.ingest(&payload).await?;

    Ok(Json(WebhookAcceptedResponse {
        success: true,
        lead_id: lead.id,
    }))
}
