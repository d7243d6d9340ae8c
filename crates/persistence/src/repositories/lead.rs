//! Lead repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::lead::NewLead;

use crate::entities::LeadEntity;
use crate::metrics::QueryTimer;

/// Query parameters for lead pagination.
#[derive(Debug, Clone)]
pub struct LeadQuery {
    pub academic_year: String,
    pub status_filter: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub is_hot: Option<bool>,
    pub cursor_created_at: Option<DateTime<Utc>>,
    pub cursor_id: Option<Uuid>,
    pub limit: i64,
}

/// Repository for lead database operations.
#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    /// Creates a new LeadRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a new lead.
    pub async fn create(&self, lead: &NewLead) -> Result<LeadEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_lead");

        let result = sqlx::query_as::<_, LeadEntity>(
            r#"
            INSERT INTO leads (
                full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, assigned_to, academic_year, is_hot, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            "#,
        )
        .bind(&lead.full_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.source)
        .bind(lead.room_choice.to_string())
        .bind(lead.stay_duration.to_string())
        .bind(lead.lead_status.to_string())
        .bind(lead.potential_revenue)
        .bind(lead.assigned_to)
        .bind(&lead.academic_year)
        .bind(lead.is_hot)
        .bind(&lead.notes)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Find lead by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LeadEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_lead_by_id");

        let result = sqlx::query_as::<_, LeadEntity>(
            r#"
            SELECT id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            FROM leads
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// List leads newest first with keyset pagination on `(created_at, id)`.
    ///
    /// Returns the page and whether more rows exist.
    pub async fn list(&self, query: LeadQuery) -> Result<(Vec<LeadEntity>, bool), sqlx::Error> {
        let timer = QueryTimer::new("list_leads");

        // Fetch limit + 1 to determine if more results exist
        let fetch_limit = query.limit + 1;

        let leads = sqlx::query_as::<_, LeadEntity>(
            r#"
            SELECT id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            FROM leads
            WHERE academic_year = $1
              AND ($2::text IS NULL OR lead_status = $2)
              AND ($3::uuid IS NULL OR assigned_to = $3)
              AND ($4::boolean IS NULL OR is_hot = $4)
              AND ($5::timestamptz IS NULL OR (created_at, id) < ($5, $6))
            ORDER BY created_at DESC, id DESC
            LIMIT $7
            "#,
        )
        .bind(&query.academic_year)
        .bind(&query.status_filter)
        .bind(query.assigned_to)
        .bind(query.is_hot)
        .bind(query.cursor_created_at)
        // Max UUID keeps the row comparison well-defined without a cursor id
        .bind(query.cursor_id.unwrap_or_else(|| Uuid::from_bytes([0xff; 16])))
        .bind(fetch_limit)
        .fetch_all(&self.pool)
        .await?;

        timer.record();

        let has_more = leads.len() as i64 > query.limit;
        let mut result = leads;
        if has_more {
            result.pop();
        }

        Ok((result, has_more))
    }

    /// All leads of an academic year, oldest first.
    pub async fn list_for_year(&self, academic_year: &str) -> Result<Vec<LeadEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_leads_for_year");

        let result = sqlx::query_as::<_, LeadEntity>(
            r#"
            SELECT id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            FROM leads
            WHERE academic_year = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(academic_year)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Non-terminal leads of an academic year, optionally for one owner.
    pub async fn list_open(
        &self,
        academic_year: &str,
        assigned_to: Option<Uuid>,
    ) -> Result<Vec<LeadEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_open_leads");

        let result = sqlx::query_as::<_, LeadEntity>(
            r#"
            SELECT id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            FROM leads
            WHERE academic_year = $1
              AND lead_status NOT IN ('converted', 'closed')
              AND ($2::uuid IS NULL OR assigned_to = $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(academic_year)
        .bind(assigned_to)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Move a lead from `expected_status` to `new_status`.
    ///
    /// Returns `None` when the lead no longer has `expected_status`, so a
    /// concurrent change is never overwritten.
    pub async fn update_status(
        &self,
        id: Uuid,
        expected_status: &str,
        new_status: &str,
        potential_revenue: f64,
    ) -> Result<Option<LeadEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_lead_status");

        let result = sqlx::query_as::<_, LeadEntity>(
            r#"
            UPDATE leads
            SET lead_status = $3, potential_revenue = $4, updated_at = NOW()
            WHERE id = $1 AND lead_status = $2
            RETURNING id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected_status)
        .bind(new_status)
        .bind(potential_revenue)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Assign (or unassign) a lead.
    pub async fn assign(
        &self,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<LeadEntity>, sqlx::Error> {
        let timer = QueryTimer::new("assign_lead");

        let result = sqlx::query_as::<_, LeadEntity>(
            r#"
            UPDATE leads
            SET assigned_to = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(assigned_to)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Set the hot flag.
    pub async fn set_hot(&self, id: Uuid, is_hot: bool) -> Result<Option<LeadEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_lead_hot");

        let result = sqlx::query_as::<_, LeadEntity>(
            r#"
            UPDATE leads
            SET is_hot = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, full_name, email, phone, source, room_choice, stay_duration, lead_status,
                potential_revenue, followup_count, last_followup_date, next_followup_date,
                assigned_to, academic_year, is_hot, notes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_hot)
        .fetch_optional(&self.pool)
        .await;

        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_query_clone() {
        let query = LeadQuery {
            academic_year: "2025/2026".to_string(),
            status_filter: Some("new".to_string()),
            assigned_to: None,
            is_hot: Some(true),
            cursor_created_at: None,
            cursor_id: None,
            limit: 50,
        };
        let cloned = query.clone();
        assert_eq!(cloned.academic_year, "2025/2026");
        assert_eq!(cloned.status_filter.as_deref(), Some("new"));
        assert_eq!(cloned.limit, 50);
    }
}
