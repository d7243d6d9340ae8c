//! Staff user repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::StaffUserEntity;
use crate::metrics::QueryTimer;

/// Repository for the staff directory.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StaffUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");

        let result = sqlx::query_as::<_, StaffUserEntity>(
            r#"
            SELECT id, email, display_name, role, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Active admins and managers.
    pub async fn list_elevated(&self) -> Result<Vec<StaffUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_elevated_users");

        let result = sqlx::query_as::<_, StaffUserEntity>(
            r#"
            SELECT id, email, display_name, role, is_active
            FROM users
            WHERE is_active AND role IN ('admin', 'manager')
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }
}
