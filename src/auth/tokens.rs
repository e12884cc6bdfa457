//! Access token issuance and verification (HS256 JWTs).

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Claims carried by an access token. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mint an access token for a user.
pub fn create_token(user_id: i64, secret: &str, ttl_secs: u64) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_secs as i64,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| {
        tracing::error!(?err, "failed to encode access token");
        ApiError::internal("Token encoding failed")
    })
}

/// Verify an access token and return the user id it was issued for.
/// Returns `None` for anything unverifiable: bad signature, expiry,
/// malformed subject.
pub fn verify_token(token: &str, secret: &str) -> Option<i64> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .ok()?;
    data.claims.sub.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let token = create_token(42, "test-secret", 3600).unwrap();
        assert_eq!(verify_token(&token, "test-secret"), Some(42));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = create_token(42, "test-secret", 3600).unwrap();
        assert!(verify_token(&token, "other-secret").is_none());
    }

    #[test]
    fn rejects_expired() {
        let token = create_token(42, "test-secret", 0).unwrap();
        // Default validation applies leeway, so force a clearly-expired claim.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let expired = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(verify_token(&expired, "test-secret").is_none());
        // The zero-TTL token is within leeway and still parses.
        assert!(verify_token(&token, "test-secret").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(verify_token("not-a-jwt", "test-secret").is_none());
    }
}
