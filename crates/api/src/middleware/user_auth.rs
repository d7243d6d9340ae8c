//! User JWT authentication middleware.
//!
//! Tokens are issued by the hosted auth provider; this service only
//! verifies them and reads the caller's id and CRM role.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use domain::models::UserRole;
use shared::jwt::{extract_user_id, JwtConfig};

use crate::app::AppState;

/// Authenticated user information extracted from JWT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// Role from the `user_role` claim. Missing or unknown roles are staff.
    pub role: UserRole,
}

impl UserAuth {
    /// Validates a bearer token and returns the caller.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, String> {
        let claims = jwt_config
            .validate_token(token)
            .map_err(|e| format!("Invalid token: {}", e))?;

        let user_id = extract_user_id(&claims).map_err(|_| "Invalid user ID in token".to_string())?;

        let role = match claims.user_role.as_deref() {
            None => UserRole::Staff,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::debug!(user_id = %user_id, role = %raw, "Unknown role claim, treating as staff");
                UserRole::Staff
            }),
        };

        Ok(UserAuth { user_id, role })
    }
}

/// Returns the token of an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires JWT user authentication.
///
/// The authenticated caller is stored in request extensions for the
/// `AuthContext` extractor.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    let Some(jwt_config) = state.jwt.as_deref() else {
        tracing::error!("JWT verification is not configured");
        return internal_error_response("Authentication service unavailable");
    };

    match UserAuth::validate(jwt_config, token) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            unauthorized_response("Invalid or expired token")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}
