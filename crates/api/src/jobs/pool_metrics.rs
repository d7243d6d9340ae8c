//! Periodic housekeeping: pool gauges and rate limiter pruning.

use std::sync::Arc;

use sqlx::PgPool;

use super::scheduler::{Job, JobError, JobFrequency};
use crate::middleware::RateLimiterState;

/// Records connection pool gauges and drops idle rate limiter buckets.
pub struct PoolMetricsJob {
    pool: PgPool,
    rate_limiter: Option<Arc<RateLimiterState>>,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool, rate_limiter: Option<Arc<RateLimiterState>>) -> Self {
        Self { pool, rate_limiter }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> Result<(), JobError> {
        persistence::metrics::record_pool_metrics(&self.pool);
        if let Some(limiter) = &self.rate_limiter {
            limiter.prune();
        }
        Ok(())
    }
}
