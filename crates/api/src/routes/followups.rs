//! Follow-up endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use persistence::repositories::{FollowUpRepository, LeadRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use domain::models::followup::{
    check_deletion, CreateFollowUpRequest, FollowUpResponse, ListFollowUpsResponse,
};
use domain::models::FollowUp;

/// Log a follow-up against a lead.
///
/// The follow-up number and the lead's counters are assigned atomically.
///
/// POST /api/v1/leads/:lead_id/followups
pub async fn create_followup(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<CreateFollowUpRequest>,
) -> Result<(StatusCode, Json<FollowUpResponse>), ApiError> {
    request.validate()?;

    let new_followup = request.into_new_followup(lead_id, ctx.user_id, Utc::now());
    let followup: FollowUp = FollowUpRepository::new(state.pool.clone())
        .create_with_counters(&new_followup)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Lead not found".to_string()),
            other => other.into(),
        })?
        .into();

    info!(
        followup_id = %followup.id,
        lead_id = %lead_id,
        followup_number = followup.followup_number,
        followup_type = %followup.followup_type,
        outcome = %followup.outcome,
        "Follow-up logged"
    );

    Ok((StatusCode::CREATED, Json(followup.into())))
}

/// Follow-ups of a lead, ordered by number.
///
/// GET /api/v1/leads/:lead_id/followups
pub async fn list_followups(
    State(state): State<AppState>,
    _ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<ListFollowUpsResponse>, ApiError> {
    LeadRepository::new(state.pool.clone())
        .find_by_id(lead_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    let followups = FollowUpRepository::new(state.pool.clone())
        .list_for_lead(lead_id)
        .await?
        .into_iter()
        .map(|e| FollowUp::from(e).into())
        .collect();

    Ok(Json(ListFollowUpsResponse { followups }))
}

/// Delete a follow-up.
///
/// Admins and managers only, within the deletion window. The lead's
/// counters are left as they are.
///
/// DELETE /api/v1/followups/:followup_id
pub async fn delete_followup(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(followup_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = FollowUpRepository::new(state.pool.clone());
    let followup: FollowUp = repo
        .find_by_id(followup_id)
        .await?
        .map(FollowUp::from)
        .ok_or_else(|| ApiError::NotFound("Follow-up not found".to_string()))?;

    check_deletion(&ctx, &followup, Utc::now())?;

    if !repo.delete(followup_id).await? {
        return Err(ApiError::NotFound("Follow-up not found".to_string()));
    }

    info!(
        followup_id = %followup_id,
        lead_id = %followup.lead_id,
        deleted_by = %ctx.user_id,
        "Follow-up deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
