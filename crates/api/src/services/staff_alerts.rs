//! In-app notifications addressed to groups of staff.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::notification::NewNotification;
use domain::models::StaffUser;
use persistence::repositories::{NotificationRepository, UserRepository};

/// Active admins and managers.
pub async fn elevated_staff(pool: &PgPool) -> Result<Vec<StaffUser>, sqlx::Error> {
    let users = UserRepository::new(pool.clone()).list_elevated().await?;
    Ok(users.into_iter().map(StaffUser::from).collect())
}

/// Builds one notification per recipient, skipping `exclude`.
pub fn fan_out<F>(recipients: &[StaffUser], exclude: Option<Uuid>, build: F) -> Vec<NewNotification>
where
    F: Fn(Uuid) -> NewNotification,
{
    recipients
        .iter()
        .filter(|user| Some(user.id) != exclude)
        .map(|user| build(user.id))
        .collect()
}

/// Notifies every admin and manager except `exclude`. Returns how many
/// notifications were written.
pub async fn notify_elevated<F>(pool: &PgPool, exclude: Option<Uuid>, build: F) -> Result<u64, sqlx::Error>
where
    F: Fn(Uuid) -> NewNotification,
{
    let recipients = elevated_staff(pool).await?;
    let notifications = fan_out(&recipients, exclude, build);
    NotificationRepository::new(pool.clone())
        .create_many(&notifications)
        .await
}

/// Writes a single notification, logging instead of failing.
///
/// Used after a primary write has already succeeded.
pub async fn notify_user(pool: &PgPool, notification: NewNotification) {
    let user_id = notification.user_id;
    if let Err(e) = NotificationRepository::new(pool.clone())
        .create(&notification)
        .await
    {
        tracing::warn!(
            user_id = %user_id,
            notification_type = %notification.notification_type,
            error = %e,
            "Failed to create notification"
        );
    }
}
