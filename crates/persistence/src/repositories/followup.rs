//! Follow-up repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::followup::{next_followup_number, NewFollowUp};

use crate::entities::FollowUpEntity;
use crate::metrics::QueryTimer;

/// Repository for follow-up database operations.
#[derive(Clone)]
pub struct FollowUpRepository {
    pool: PgPool,
}

impl FollowUpRepository {
    /// Creates a new FollowUpRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a follow-up and update the lead's counters in one transaction.
    ///
    /// The lead row is locked while the number is assigned, so concurrent
    /// inserts on the same lead receive distinct numbers. Outstanding
    /// reminders for the lead are dismissed. Fails with `RowNotFound` when
    /// the lead does not exist.
    pub async fn create_with_counters(
        &self,
        followup: &NewFollowUp,
    ) -> Result<FollowUpEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_followup");

        let mut tx = self.pool.begin().await?;

        let current_count: i32 = sqlx::query_scalar(
            r#"
            SELECT followup_count FROM leads WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(followup.lead_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        let entity = sqlx::query_as::<_, FollowUpEntity>(
            r#"
            INSERT INTO followups (
                lead_id, followup_number, followup_type, outcome, followup_date,
                next_action_date, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, lead_id, followup_number, followup_type, outcome, followup_date,
                next_action_date, notes, created_by, created_at
            "#,
        )
        .bind(followup.lead_id)
        .bind(next_followup_number(current_count))
        .bind(followup.followup_type.to_string())
        .bind(followup.outcome.to_string())
        .bind(followup.followup_date)
        .bind(followup.next_action_date)
        .bind(&followup.notes)
        .bind(followup.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE leads
            SET followup_count = followup_count + 1,
                last_followup_date = $2,
                next_followup_date = COALESCE($3, next_followup_date),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(followup.lead_id)
        .bind(followup.followup_date)
        .bind(followup.next_action_date)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE followup_reminders
            SET is_dismissed = TRUE
            WHERE lead_id = $1 AND NOT is_sent AND NOT is_dismissed
            "#,
        )
        .bind(followup.lead_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        timer.record();
        Ok(entity)
    }

    /// Find follow-up by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FollowUpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_followup_by_id");

        let result = sqlx::query_as::<_, FollowUpEntity>(
            r#"
            SELECT id, lead_id, followup_number, followup_type, outcome, followup_date,
                next_action_date, notes, created_by, created_at
            FROM followups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Follow-ups of a lead ordered by number.
    pub async fn list_for_lead(&self, lead_id: Uuid) -> Result<Vec<FollowUpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_followups_for_lead");

        let result = sqlx::query_as::<_, FollowUpEntity>(
            r#"
            SELECT id, lead_id, followup_number, followup_type, outcome, followup_date,
                next_action_date, notes, created_by, created_at
            FROM followups
            WHERE lead_id = $1
            ORDER BY followup_number ASC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Every follow-up belonging to leads of an academic year.
    pub async fn list_for_year(&self, academic_year: &str) -> Result<Vec<FollowUpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_followups_for_year");

        let result = sqlx::query_as::<_, FollowUpEntity>(
            r#"
            SELECT f.id, f.lead_id, f.followup_number, f.followup_type, f.outcome, f.followup_date,
                f.next_action_date, f.notes, f.created_by, f.created_at
            FROM followups f
            JOIN leads l ON l.id = f.lead_id
            WHERE l.academic_year = $1
            ORDER BY f.lead_id, f.followup_number
            "#,
        )
        .bind(academic_year)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Delete a follow-up. The lead's counter and remaining numbers are left as they are.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_followup");

        let result = sqlx::query(
            r#"
            DELETE FROM followups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
