//! Website form body extractor.
//!
//! Form providers post JSON, URL-encoded or multipart bodies. The body is
//! buffered once so the provider's signature can be checked, then flattened
//! into a `FormPayload`.

use axum::{
    async_trait,
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Request},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    Form,
};

use domain::models::form_submission::FormPayload;
use http_body_util::LengthLimitError;
use shared::crypto::{secrets_match, verify_signature};

use crate::app::AppState;
use crate::error::ApiError;

/// Header carrying the plain shared secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Header carrying a hex HMAC-SHA256 of the raw body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

/// A verified, flattened website form submission.
#[derive(Debug, Clone)]
pub struct FormSubmission(pub FormPayload);

/// Checks the provider's credentials when a webhook secret is configured.
///
/// Either the shared secret itself or an HMAC signature of the body is accepted.
pub fn authorize_webhook(
    secret: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), ApiError> {
    let Some(secret) = secret else {
        return Ok(());
    };

    let header_value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Some(presented) = header_value(WEBHOOK_SECRET_HEADER) {
        if secrets_match(presented, secret) {
            return Ok(());
        }
    }
    if let Some(signature) = header_value(WEBHOOK_SIGNATURE_HEADER) {
        if verify_signature(secret, body, signature) {
            return Ok(());
        }
    }

    Err(ApiError::Unauthorized("Invalid webhook credentials".to_string()))
}

#[async_trait]
impl FromRequest<AppState> for FormSubmission {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let limit = state.config.server.max_body_size;
        let (parts, body) = req.into_parts();

        let declared_length = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared_length.is_some_and(|len| len > limit) {
            return Err(ApiError::PayloadTooLarge);
        }

        let bytes = read_body(body, limit).await?;

        authorize_webhook(state.config.crm.webhook_secret(), &parts.headers, &bytes)?;

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let payload = if content_type.starts_with("application/json") {
            parse_json(&bytes)?
        } else if content_type.starts_with("multipart/form-data") {
            parse_multipart(parts, bytes, state).await?
        } else {
            parse_urlencoded(parts, bytes, state).await?
        };

        Ok(FormSubmission(payload))
    }
}

/// Buffers at most `limit` bytes. Bodies without a Content-Length are only
/// caught here.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        let over_limit = std::iter::successors(
            Some(inner.as_ref() as &(dyn std::error::Error + 'static)),
            |err| err.source(),
        )
        .any(|err| err.is::<LengthLimitError>());

        if over_limit {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation(format!("Request body could not be read: {}", inner))
        }
    })
}

fn parse_json(bytes: &[u8]) -> Result<FormPayload, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(FormPayload::new());
    }
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| ApiError::Validation(format!("Malformed JSON body: {}", e)))?;
    Ok(FormPayload::from_json(&value))
}

async fn parse_urlencoded(
    mut parts: Parts,
    bytes: Bytes,
    state: &AppState,
) -> Result<FormPayload, ApiError> {
    // Some providers omit the content type on plain form posts
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    let request = Request::from_parts(parts, Body::from(bytes));
    let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, state)
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed form body: {}", e.body_text())))?;
    Ok(FormPayload::from_pairs(pairs))
}

async fn parse_multipart(
    parts: Parts,
    bytes: Bytes,
    state: &AppState,
) -> Result<FormPayload, ApiError> {
    let request = Request::from_parts(parts, Body::from(bytes));
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e.body_text())))?;

    let mut payload = FormPayload::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        // File uploads carry nothing the lead needs
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::Validation(format!("Malformed multipart field: {}", e)))?;
        payload.push(&name, text);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::crypto::hmac_sha256_hex;

    #[test]
    fn test_no_secret_accepts_anything() {
        assert!(authorize_webhook(None, &HeaderMap::new(), b"{}").is_ok());
    }

    #[test]
    fn test_shared_secret_header() {
        let mut headers = HeaderMap::new();
        headers.insert(WEBHOOK_SECRET_HEADER, "s3cret".parse().unwrap());
        assert!(authorize_webhook(Some("s3cret"), &headers, b"{}").is_ok());

        headers.insert(WEBHOOK_SECRET_HEADER, "wrong".parse().unwrap());
        assert!(matches!(
            authorize_webhook(Some("s3cret"), &headers, b"{}"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_signature_header() {
        let body = br#"{"email":"ada@example.com"}"#;
        let signature = hmac_sha256_hex("s3cret", body).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            WEBHOOK_SIGNATURE_HEADER,
            format!("sha256={}", signature).parse().unwrap(),
        );
        assert!(authorize_webhook(Some("s3cret"), &headers, body).is_ok());
        assert!(authorize_webhook(Some("s3cret"), &headers, b"tampered").is_err());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(authorize_webhook(Some("s3cret"), &HeaderMap::new(), b"{}").is_err());
    }

    #[tokio::test]
    async fn test_read_body_over_limit_is_too_large() {
        let body = Body::from(vec![b'a'; 64]);
        assert!(matches!(
            read_body(body, 16).await,
            Err(ApiError::PayloadTooLarge)
        ));
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let bytes = read_body(Body::from("email=ada%40example.com"), 1024)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"email=ada%40example.com");
    }

    #[test]
    fn test_parse_json_nested_fields() {
        let body = br#"{"form_name":"Book a viewing","fields":[{"id":"email","value":"ada@example.com"}]}"#;
        let payload = parse_json(body).unwrap();
        assert_eq!(payload.get("email"), Some("ada@example.com"));
        assert_eq!(payload.get("form_name"), Some("Book a viewing"));
    }

    #[test]
    fn test_parse_json_empty_and_malformed() {
        assert!(parse_json(b"  ").unwrap().is_empty());
        assert!(matches!(parse_json(b"{not json"), Err(ApiError::Validation(_))));
    }
}
