//! Exception request repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ExceptionRequestEntity;
use crate::metrics::QueryTimer;

/// Input data for filing an exception request.
#[derive(Debug, Clone)]
pub struct ExceptionRequestInput {
    pub lead_id: Uuid,
    pub reason: String,
    pub justification: Option<String>,
    pub requested_by: Uuid,
}

/// Repository for exception request database operations.
#[derive(Clone)]
pub struct ExceptionRequestRepository {
    pool: PgPool,
}

impl ExceptionRequestRepository {
    /// Creates a new ExceptionRequestRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a request. A second request for the same lead violates the
    /// unique constraint on `lead_id`.
    pub async fn create(
        &self,
        input: ExceptionRequestInput,
    ) -> Result<ExceptionRequestEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_exception_request");

        let result = sqlx::query_as::<_, ExceptionRequestEntity>(
            r#"
            INSERT INTO exception_requests (lead_id, reason, justification, requested_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, lead_id, status, reason, justification, requested_by, reviewed_by,
                review_note, reviewed_at, created_at, updated_at
            "#,
        )
        .bind(input.lead_id)
        .bind(&input.reason)
        .bind(&input.justification)
        .bind(input.requested_by)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Find request by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ExceptionRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_exception_request_by_id");

        let result = sqlx::query_as::<_, ExceptionRequestEntity>(
            r#"
            SELECT id, lead_id, status, reason, justification, requested_by, reviewed_by,
                review_note, reviewed_at, created_at, updated_at
            FROM exception_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Find the request attached to a lead.
    pub async fn find_by_lead(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<ExceptionRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_exception_request_by_lead");

        let result = sqlx::query_as::<_, ExceptionRequestEntity>(
            r#"
            SELECT id, lead_id, status, reason, justification, requested_by, reviewed_by,
                review_note, reviewed_at, created_at, updated_at
            FROM exception_requests
            WHERE lead_id = $1
            "#,
        )
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// List requests, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status_filter: Option<String>,
    ) -> Result<Vec<ExceptionRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_exception_requests");

        let result = sqlx::query_as::<_, ExceptionRequestEntity>(
            r#"
            SELECT id, lead_id, status, reason, justification, requested_by, reviewed_by,
                review_note, reviewed_at, created_at, updated_at
            FROM exception_requests
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(status_filter)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Record a review decision on a pending request.
    ///
    /// Returns `None` when the request is no longer pending.
    pub async fn review(
        &self,
        id: Uuid,
        status: &str,
        reviewed_by: Uuid,
        review_note: Option<&str>,
    ) -> Result<Option<ExceptionRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("review_exception_request");

        let result = sqlx::query_as::<_, ExceptionRequestEntity>(
            r#"
            UPDATE exception_requests
            SET status = $2, reviewed_by = $3, review_note = $4,
                reviewed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, lead_id, status, reason, justification, requested_by, reviewed_by,
                review_note, reviewed_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(reviewed_by)
        .bind(review_note)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }
}
