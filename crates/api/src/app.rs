use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::notification::NotificationService;
use shared::jwt::JwtConfig;

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    analytics, exception_requests, followups, form_webhook, health, leads, notifications,
};
use crate::services::EmailService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub notifier: Arc<dyn NotificationService>,
    pub jwt: Option<Arc<JwtConfig>>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, notifier: Arc<dyn NotificationService>) -> Self {
        let jwt = match JwtConfig::with_leeway(&config.jwt.secret, config.jwt.leeway_secs) {
            Ok(jwt) => Some(Arc::new(jwt)),
            Err(e) => {
                tracing::error!(error = %e, "JWT configuration rejected, protected routes will fail");
                None
            }
        };

        // Webhook rate limiting is disabled when the limit is 0
        let rate_limiter =
            RateLimiterState::new(config.security.webhook_rate_limit_per_minute).map(Arc::new);

        Self {
            pool,
            config: Arc::new(config),
            rate_limiter,
            notifier,
            jwt,
        }
    }
}

/// Builds the router with email delivery as the notifier.
pub fn create_app(config: Config, pool: PgPool) -> Router {
    let notifier: Arc<dyn NotificationService> = Arc::new(EmailService::new(config.email.clone()));
    create_app_with_notifier(config, pool, notifier)
}

pub fn create_app_with_notifier(
    config: Config,
    pool: PgPool,
    notifier: Arc<dyn NotificationService>,
) -> Router {
    router(AppState::new(config, pool, notifier))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Staff routes (require a user JWT)
    let protected_routes = Router::new()
        .route("/api/v1/leads", get(leads::list_leads).post(leads::create_lead))
        .route("/api/v1/leads/overdue", get(leads::overdue_leads))
        .route("/api/v1/leads/upcoming", get(leads::upcoming_leads))
        .route("/api/v1/leads/:lead_id", get(leads::get_lead))
        .route("/api/v1/leads/:lead_id/status", patch(leads::update_status))
        .route("/api/v1/leads/:lead_id/assign", patch(leads::assign_lead))
        .route("/api/v1/leads/:lead_id/hot", patch(leads::set_hot))
        .route(
            "/api/v1/leads/:lead_id/followups",
            get(followups::list_followups).post(followups::create_followup),
        )
        .route(
            "/api/v1/followups/:followup_id",
            delete(followups::delete_followup),
        )
        .route(
            "/api/v1/leads/:lead_id/exception-request",
            post(exception_requests::create_exception_request),
        )
        .route(
            "/api/v1/exception-requests",
            get(exception_requests::list_exception_requests),
        )
        .route(
            "/api/v1/exception-requests/:request_id/review",
            post(exception_requests::review_exception_request),
        )
        .route("/api/v1/notifications", get(notifications::list_notifications))
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
        .route(
            "/api/v1/analytics/followups",
            get(analytics::followup_analytics),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Form provider webhook (shared secret, rate limited per client)
    let webhook_routes = Router::new()
        .route("/api/v1/webhooks/forms", post(form_webhook::receive_form))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
