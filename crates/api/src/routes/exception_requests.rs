//! Exception request endpoint handlers.
//!
//! An approved exception lets a lead close before the follow-up minimum.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use persistence::repositories::{ExceptionRequestInput, ExceptionRequestRepository, LeadRepository};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::services::staff_alerts::{notify_elevated, notify_user};
use domain::models::exception_request::{
    check_review, CreateExceptionRequest, ExceptionRequestResponse, ExceptionStatus,
    ListExceptionRequestsQuery, ListExceptionRequestsResponse, ReviewExceptionRequest,
};
use domain::models::notification::{NewNotification, NotificationType};
use domain::models::{ExceptionRequest, Lead};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// File an exception request for a lead.
///
/// POST /api/v1/leads/:lead_id/exception-request
pub async fn create_exception_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<CreateExceptionRequest>,
) -> Result<(StatusCode, Json<ExceptionRequestResponse>), ApiError> {
    request.validate()?;
    request.check()?;

    let lead: Lead = LeadRepository::new(state.pool.clone())
        .find_by_id(lead_id)
        .await?
        .map(Lead::from)
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    if lead.lead_status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Lead is already {}",
            lead.lead_status
        )));
    }

    let justification = request
        .justification
        .map(|j| j.trim().to_string())
        .filter(|j| !j.is_empty());

    let exception: ExceptionRequest = ExceptionRequestRepository::new(state.pool.clone())
        .create(ExceptionRequestInput {
            lead_id,
            reason: request.reason.to_string(),
            justification,
            requested_by: ctx.user_id,
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("An exception request already exists for this lead".to_string())
            } else {
                e.into()
            }
        })?
        .into();

    info!(
        exception_request_id = %exception.id,
        lead_id = %lead_id,
        reason = %exception.reason,
        requested_by = %ctx.user_id,
        "Exception request filed"
    );

    let title = "Exception requested";
    let message = format!(
        "Closing {} early was requested ({})",
        lead.full_name, exception.reason
    );
    let metadata = serde_json::json!({ "exception_request_id": exception.id });
    if let Err(e) = notify_elevated(&state.pool, Some(ctx.user_id), |user_id| {
        NewNotification::for_lead(
            user_id,
            NotificationType::ExceptionRequested,
            lead_id,
            title,
            &message,
        )
        .with_metadata(metadata.clone())
    })
    .await
    {
        warn!(lead_id = %lead_id, error = %e, "Failed to notify reviewers");
    }

    Ok((StatusCode::CREATED, Json(exception.into())))
}

/// Approve or reject a pending exception request.
///
/// POST /api/v1/exception-requests/:request_id/review
pub async fn review_exception_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(request_id): Path<Uuid>,
    Json(request): Json<ReviewExceptionRequest>,
) -> Result<Json<ExceptionRequestResponse>, ApiError> {
    request.validate()?;

    let repo = ExceptionRequestRepository::new(state.pool.clone());
    let existing: ExceptionRequest = repo
        .find_by_id(request_id)
        .await?
        .map(ExceptionRequest::from)
        .ok_or_else(|| ApiError::NotFound("Exception request not found".to_string()))?;

    let status = check_review(&ctx, &existing, request.decision)?;

    let review_note = request
        .review_note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let reviewed: ExceptionRequest = repo
        .review(request_id, &status.to_string(), ctx.user_id, review_note)
        .await?
        .map(ExceptionRequest::from)
        .ok_or_else(|| {
            ApiError::Conflict("Exception request has already been reviewed".to_string())
        })?;

    info!(
        exception_request_id = %request_id,
        lead_id = %reviewed.lead_id,
        status = %reviewed.status,
        reviewed_by = %ctx.user_id,
        "Exception request reviewed"
    );

    if reviewed.requested_by != ctx.user_id {
        let outcome = match reviewed.status {
            ExceptionStatus::Approved => "approved. The lead can now be closed",
            _ => "rejected",
        };
        let notification = NewNotification::for_lead(
            reviewed.requested_by,
            NotificationType::ExceptionReviewed,
            reviewed.lead_id,
            "Exception request reviewed",
            format!("Your exception request was {}", outcome),
        )
        .with_metadata(serde_json::json!({
            "exception_request_id": reviewed.id,
            "status": reviewed.status.to_string(),
        }));
        notify_user(&state.pool, notification).await;
    }

    Ok(Json(reviewed.into()))
}

/// List exception requests, newest first.
///
/// GET /api/v1/exception-requests?status=
pub async fn list_exception_requests(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListExceptionRequestsQuery>,
) -> Result<Json<ListExceptionRequestsResponse>, ApiError> {
    if !ctx.is_elevated() {
        return Err(ApiError::Forbidden(
            "Only admins and managers can list exception requests".to_string(),
        ));
    }

    let exception_requests = ExceptionRequestRepository::new(state.pool.clone())
        .list(query.status.map(|s| s.to_string()))
        .await?
        .into_iter()
        .map(|e| ExceptionRequest::from(e).into())
        .collect();

    Ok(Json(ListExceptionRequestsResponse { exception_requests }))
}
