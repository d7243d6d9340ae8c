//! Database metrics collection.
//!
//! Every repository call is timed under a stable query name such as
//! `update_lead_status` or `create_followup_reminder`, so slow lead queries
//! show up per operation. Pool gauges are sampled by the pool metrics job.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration under `query_name`.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record database connection pool gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one repository query.
///
/// The timer is recorded whether the query succeeded or not; a status
/// update that loses the optimistic check still counts:
/// ```ignore
/// let timer = QueryTimer::new("update_lead_status");
/// let result = sqlx::query_as::<_, LeadEntity>(
///     "UPDATE leads SET lead_status = $3 WHERE id = $1 AND lead_status = $2 RETURNING ...",
/// )
/// .fetch_optional(&self.pool)
/// .await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.query_name, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_timer_labels_histogram_with_query_name() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            QueryTimer::new("update_lead_status").record();
            record_query_duration("create_followup", 0.02);
        });

        let rendered = handle.render();
        assert!(rendered.contains("database_query_duration_seconds"));
        assert!(rendered.contains(r#"query="update_lead_status""#));
        assert!(rendered.contains(r#"query="create_followup""#));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        QueryTimer::new("list_open_leads").record();
    }
}
