//! Hashing and signature helpers for inbound form webhooks.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares a presented shared secret with the configured one.
///
/// Both sides are hashed first so the comparison runs over equal-length
/// digests regardless of input length.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Computes the hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn hmac_sha256_hex(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex HMAC-SHA256 signature, accepting an optional `sha256=` prefix.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(raw) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("form-secret", "form-secret"));
        assert!(!secrets_match("form-secret", "form-secret "));
        assert!(!secrets_match("", "form-secret"));
    }

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"email":"a@b.com"}"#;
        let signature = hmac_sha256_hex("s3cret", body).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_signature("s3cret", body, &signature));
        assert!(verify_signature(
            "s3cret",
            body,
            &format!("sha256={}", signature)
        ));
    }

    #[test]
    fn test_signature_rejects_tampered_body() {
        let signature = hmac_sha256_hex("s3cret", b"original").unwrap();
        assert!(!verify_signature("s3cret", b"tampered", &signature));
        assert!(!verify_signature("other", b"original", &signature));
    }

    #[test]
    fn test_signature_rejects_garbage() {
        assert!(!verify_signature("s3cret", b"body", "not-hex"));
        assert!(!verify_signature("s3cret", b"body", ""));
    }
}
