//! Lead endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use persistence::repositories::{
    ExceptionRequestRepository, FollowUpRepository, LeadQuery, LeadRepository,
};
use shared::pagination::{clamp_limit, decode_cursor, encode_cursor};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::services::staff_alerts::notify_user;
use domain::models::analytics::{
    FollowUpQueueQuery, OverdueLeadsResponse, UpcomingLeadsResponse,
};
use domain::models::exception_request::can_close;
use domain::models::lead::{
    revenue_for_status, AssignLeadRequest, CreateLeadRequest, LeadDetailResponse, LeadResponse,
    LeadStatus, LeadStatusError, ListLeadsQuery, ListLeadsResponse, SetHotRequest,
    UpdateLeadStatusRequest,
};
use domain::models::notification::{NewNotification, NotificationType};
use domain::models::{ExceptionRequest, FollowUp, Lead};
use domain::services::{detect_overdue, detect_upcoming};

async fn load_lead(state: &AppState, lead_id: Uuid) -> Result<Lead, ApiError> {
    LeadRepository::new(state.pool.clone())
        .find_by_id(lead_id)
        .await?
        .map(Lead::from)
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))
}

/// List leads, newest first.
///
/// GET /api/v1/leads?academic_year=&status=&assigned_to=&is_hot=&limit=&cursor=
pub async fn list_leads(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<ListLeadsResponse>, ApiError> {
    let (cursor_created_at, cursor_id) = match query.cursor.as_deref() {
        Some(cursor) => {
            let (created_at, id) = decode_cursor(cursor)?;
            (Some(created_at), Some(id))
        }
        None => (None, None),
    };
    let limit = clamp_limit(query.limit);

    let (entities, has_more) = LeadRepository::new(state.pool.clone())
        .list(LeadQuery {
            academic_year: query
                .academic_year
                .unwrap_or_else(|| ctx.academic_year.clone()),
            status_filter: query.status.map(|s| s.to_string()),
            assigned_to: query.assigned_to,
            is_hot: query.is_hot,
            cursor_created_at,
            cursor_id,
            limit,
        })
        .await?;

    let leads: Vec<Lead> = entities.into_iter().map(Lead::from).collect();
    let next_cursor = if has_more {
        leads.last().map(|l| encode_cursor(l.created_at, l.id))
    } else {
        None
    };

    Ok(Json(ListLeadsResponse {
        leads: leads.into_iter().map(LeadResponse::from).collect(),
        next_cursor,
    }))
}

/// Lead detail with its follow-ups and exception request.
///
/// GET /api/v1/leads/:lead_id
pub async fn get_lead(
    State(state): State<AppState>,
    _ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<LeadDetailResponse>, ApiError> {
    let lead = load_lead(&state, lead_id).await?;

    let followup_repo = FollowUpRepository::new(state.pool.clone());
    let exception_repo = ExceptionRequestRepository::new(state.pool.clone());
    let (followups, exception) = tokio::try_join!(
        followup_repo.list_for_lead(lead_id),
        exception_repo.find_by_lead(lead_id),
    )?;
    let followups: Vec<FollowUp> = followups.into_iter().map(FollowUp::from).collect();
    let exception: Option<ExceptionRequest> = exception.map(ExceptionRequest::from);

    let closable = can_close(lead.followup_count, exception.as_ref());

    Ok(Json(LeadDetailResponse {
        lead: lead.into(),
        followups: followups.into_iter().map(Into::into).collect(),
        exception_request: exception.map(Into::into),
        can_close: closable,
    }))
}

/// Create a lead manually.
///
/// POST /api/v1/leads
pub async fn create_lead(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(request): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<LeadResponse>), ApiError> {
    request.validate()?;

    let new_lead = request.into_new_lead(&ctx.academic_year);
    let lead: Lead = LeadRepository::new(state.pool.clone())
        .create(&new_lead)
        .await?
        .into();

    info!(
        lead_id = %lead.id,
        created_by = %ctx.user_id,
        academic_year = %lead.academic_year,
        "Lead created"
    );

    if let Some(owner) = lead.assigned_to.filter(|owner| *owner != ctx.user_id) {
        notify_user(&state.pool, assignment_notification(owner, &lead)).await;
    }

    Ok((StatusCode::CREATED, Json(lead.into())))
}

fn assignment_notification(owner: Uuid, lead: &Lead) -> NewNotification {
    NewNotification::for_lead(
        owner,
        NotificationType::LeadAssigned,
        lead.id,
        "Lead assigned to you",
        format!("{} has been assigned to you", lead.full_name),
    )
}

/// Assign or unassign a lead.
///
/// PATCH /api/v1/leads/:lead_id/assign
pub async fn assign_lead(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<AssignLeadRequest>,
) -> Result<Json<LeadResponse>, ApiError> {
    let lead: Lead = LeadRepository::new(state.pool.clone())
        .assign(lead_id, request.assigned_to)
        .await?
        .map(Lead::from)
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    info!(
        lead_id = %lead.id,
        assigned_to = ?lead.assigned_to,
        assigned_by = %ctx.user_id,
        "Lead assigned"
    );

    if let Some(owner) = lead.assigned_to.filter(|owner| *owner != ctx.user_id) {
        notify_user(&state.pool, assignment_notification(owner, &lead)).await;
    }

    Ok(Json(lead.into()))
}

/// Move a lead through the status state machine.
///
/// PATCH /api/v1/leads/:lead_id/status
pub async fn update_status(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<UpdateLeadStatusRequest>,
) -> Result<Json<LeadResponse>, ApiError> {
    let lead = load_lead(&state, lead_id).await?;
    let current = lead.lead_status;
    let next = current.transition(request.status)?;

    if next == current {
        return Ok(Json(lead.into()));
    }

    if next == LeadStatus::Closed {
        let exception: Option<ExceptionRequest> = ExceptionRequestRepository::new(state.pool.clone())
            .find_by_lead(lead_id)
            .await?
            .map(Into::into);
        if !can_close(lead.followup_count, exception.as_ref()) {
            return Err(LeadStatusError::CloseNotAllowed {
                followup_count: lead.followup_count,
            }
            .into());
        }
    }

    let revenue = revenue_for_status(next, lead.room_choice, lead.stay_duration);
    let updated: Lead = LeadRepository::new(state.pool.clone())
        .update_status(lead_id, &current.to_string(), &next.to_string(), revenue)
        .await?
        .map(Lead::from)
        .ok_or_else(|| {
            ApiError::Conflict("Lead status was changed by another request".to_string())
        })?;

    info!(
        lead_id = %lead_id,
        from = %current,
        to = %next,
        changed_by = %ctx.user_id,
        "Lead status changed"
    );

    if let Some(owner) = updated.assigned_to.filter(|owner| *owner != ctx.user_id) {
        let notification = NewNotification::for_lead(
            owner,
            NotificationType::StatusChanged,
            lead_id,
            "Lead status changed",
            format!("{} moved from {} to {}", updated.full_name, current, next),
        )
        .with_metadata(serde_json::json!({
            "from": current.to_string(),
            "to": next.to_string(),
        }));
        notify_user(&state.pool, notification).await;
    }

    Ok(Json(updated.into()))
}

/// Toggle the hot flag.
///
/// PATCH /api/v1/leads/:lead_id/hot
pub async fn set_hot(
    State(state): State<AppState>,
    _ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<SetHotRequest>,
) -> Result<Json<LeadResponse>, ApiError> {
    let lead: Lead = LeadRepository::new(state.pool.clone())
        .set_hot(lead_id, request.is_hot)
        .await?
        .map(Lead::from)
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    Ok(Json(lead.into()))
}

async fn open_leads(
    state: &AppState,
    ctx: &AuthContext,
    query: FollowUpQueueQuery,
) -> Result<Vec<Lead>, ApiError> {
    let academic_year = query
        .academic_year
        .unwrap_or_else(|| ctx.academic_year.clone());
    let entities = LeadRepository::new(state.pool.clone())
        .list_open(&academic_year, query.assigned_to)
        .await?;
    Ok(entities.into_iter().map(Lead::from).collect())
}

/// Leads whose follow-up is overdue, most overdue first.
///
/// GET /api/v1/leads/overdue?academic_year=&assigned_to=
pub async fn overdue_leads(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<FollowUpQueueQuery>,
) -> Result<Json<OverdueLeadsResponse>, ApiError> {
    let leads = open_leads(&state, &ctx, query).await?;
    let overdue = detect_overdue(&leads, Utc::now());
    let urgent_count = overdue.iter().filter(|l| l.is_urgent).count();

    Ok(Json(OverdueLeadsResponse {
        leads: overdue,
        urgent_count,
    }))
}

/// Leads with a follow-up due within the next week.
///
/// GET /api/v1/leads/upcoming?academic_year=&assigned_to=
pub async fn upcoming_leads(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<FollowUpQueueQuery>,
) -> Result<Json<UpcomingLeadsResponse>, ApiError> {
    let leads = open_leads(&state, &ctx, query).await?;

    Ok(Json(UpcomingLeadsResponse {
        leads: detect_upcoming(&leads, Utc::now()),
    }))
}
