//! Custom Axum extractors.

pub mod form_payload;
pub mod user_auth;

pub use form_payload::FormSubmission;
pub use user_auth::AuthContext;
