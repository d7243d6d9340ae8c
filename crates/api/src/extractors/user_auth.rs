//! Caller context extractor.
//!
//! Turns the authenticated user into the `RequestContext` every lead
//! operation takes.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use domain::models::RequestContext;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// Authenticated caller plus the academic year and currency in force.
#[derive(Debug, Clone)]
pub struct AuthContext(pub RequestContext);

impl AuthContext {
    fn from_auth(auth: UserAuth, state: &AppState) -> Self {
        AuthContext(RequestContext::new(
            auth.user_id,
            auth.role,
            state.config.crm.default_academic_year.clone(),
            state.config.crm.currency.clone(),
        ))
    }
}

impl std::ops::Deref for AuthContext {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Inserted by require_user_auth on protected routes
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(Self::from_auth(auth.clone(), state));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let jwt_config = state
            .jwt
            .as_deref()
            .ok_or_else(|| ApiError::Internal("JWT verification is not configured".to_string()))?;

        let auth = UserAuth::validate(jwt_config, bearer.token())
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(Self::from_auth(auth, state))
    }
}
