//! In-app notification endpoint handlers.
//!
//! Every handler is scoped to the calling user.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use persistence::repositories::NotificationRepository;
use shared::pagination::clamp_limit;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use domain::models::notification::{
    ListNotificationsQuery, ListNotificationsResponse, MarkReadResponse, NotificationResponse,
};
use domain::models::Notification;

/// The caller's notifications, newest first, with the unread total.
///
/// GET /api/v1/notifications?unread_only=&limit=
pub async fn list_notifications(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let limit = clamp_limit(query.limit);

    let (entities, unread_count) = tokio::try_join!(
        repo.list_for_user(ctx.user_id, query.unread_only, limit),
        repo.count_unread(ctx.user_id),
    )?;

    let notifications: Vec<NotificationResponse> = entities
        .into_iter()
        .map(|e| Notification::from(e).into())
        .collect();

    Ok(Json(ListNotificationsResponse {
        notifications,
        unread_count,
    }))
}

/// Mark one notification as read.
///
/// POST /api/v1/notifications/:notification_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let found = NotificationRepository::new(state.pool.clone())
        .mark_read(notification_id, ctx.user_id)
        .await?;

    if !found {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(MarkReadResponse { updated: 1 }))
}

/// Mark all of the caller's notifications as read.
///
/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = NotificationRepository::new(state.pool.clone())
        .mark_all_read(ctx.user_id)
        .await?;

    Ok(Json(MarkReadResponse { updated }))
}
