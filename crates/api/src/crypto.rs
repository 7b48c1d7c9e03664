//! Bearer token verification.
//!
//! Tokens are HS256 JWTs issued by the auth provider and signed with the shared
//! project secret. `sub` carries the user id; `exp` is enforced.
//!
//! Uses pure Rust crates (no platform crypto interop needed).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::ServiceError;

/// JWT header (always HS256).
const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Default token lifetime for [`sign_jwt`]: 1 hour in seconds.
pub const JWT_EXPIRY_SECS: u64 = 3600;

/// Verified token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Sign a JWT for the given user. Returns the encoded JWT string.
///
/// The server only verifies tokens; signing exists for local tooling and tests.
pub fn sign_jwt(user_id: &str, email: Option<&str>, secret: &str, now_unix: u64) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(JWT_HEADER.as_bytes());

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now_unix + JWT_EXPIRY_SECS,
        iat: Some(now_unix),
        email: email.map(str::to_string),
    };
    let payload = serde_json::to_vec(&claims).unwrap_or_default();
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature);

    format!("{signing_input}.{sig_b64}")
}

/// Verify a JWT and return its claims if valid.
pub fn verify_jwt(token: &str, secret: &str, now_unix: u64) -> Result<Claims, ServiceError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ServiceError::Unauthorized("invalid JWT format".into()));
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT header encoding".into()))?;
    let header: serde_json::Value = serde_json::from_slice(&header_bytes)
        .map_err(|_| ServiceError::Unauthorized("invalid JWT header".into()))?;
    if header["alg"] != "HS256" {
        return Err(ServiceError::Unauthorized("unsupported JWT algorithm".into()));
    }

    // Verify signature
    let signing_input = format!("{}.{}", parts[0], parts[1]);
    let expected_sig = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let actual_sig = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT signature encoding".into()))?;

    if expected_sig.len() != actual_sig.len()
        || !expected_sig
            .iter()
            .zip(actual_sig.iter())
            .fold(true, |eq, (a, b)| eq & (a == b))
    {
        return Err(ServiceError::Unauthorized("invalid JWT signature".into()));
    }

    // Decode payload
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload encoding".into()))?;
    let claims: Claims = serde_json::from_slice(&payload_bytes)
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload".into()))?;

    if now_unix > claims.exp {
        return Err(ServiceError::Unauthorized("JWT expired".into()));
    }
    if claims.sub.trim().is_empty() {
        return Err(ServiceError::Unauthorized("missing sub claim".into()));
    }

    Ok(claims)
}

// ── Internal ────────────────────────────────────────────────────────────────

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key) else {
        return Vec::new();
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const NOW: u64 = 1_750_000_000;

    #[test]
    fn signed_token_verifies() {
        let token = sign_jwt("user-1", Some("a@b.test"), SECRET, NOW);
        let claims = verify_jwt(&token, SECRET, NOW + 10).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("a@b.test"));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = sign_jwt("user-1", None, SECRET, NOW);
        let err = verify_jwt(&token, "other", NOW).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "invalid JWT signature");
    }

    #[test]
    fn expired_token_rejected() {
        let token = sign_jwt("user-1", None, SECRET, NOW);
        let err = verify_jwt(&token, SECRET, NOW + JWT_EXPIRY_SECS + 1).unwrap_err();
        assert_eq!(err.message(), "JWT expired");
    }

    #[test]
    fn tampered_payload_rejected() {
        let token = sign_jwt("user-1", None, SECRET, NOW);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin","exp":9999999999}"#);
        parts[1] = &forged;
        assert!(verify_jwt(&parts.join("."), SECRET, NOW).is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(verify_jwt("not-a-jwt", SECRET, NOW).is_err());
        assert!(verify_jwt("a.b.c", SECRET, NOW).is_err());
    }
}
