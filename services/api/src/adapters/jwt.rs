//! services/api/src/adapters/jwt.rs
//!
//! HS256 JSON Web Tokens as the session credential.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use learning_core::ports::{CredentialService, PortError, PortResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtCredentials {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtCredentials {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl CredentialService for JwtCredentials {
    fn issue(&self, user_id: &str) -> PortResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> PortResult<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|_| PortError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_resolve_to_their_user() {
        let credentials = JwtCredentials::new("test-secret", Duration::days(7));
        let token = credentials.issue("user-1").unwrap();
        assert_eq!(credentials.verify(&token).unwrap(), "user-1");
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let ours = JwtCredentials::new("test-secret", Duration::days(7));
        let theirs = JwtCredentials::new("other-secret", Duration::days(7));
        let token = theirs.issue("user-1").unwrap();
        assert!(matches!(ours.verify(&token), Err(PortError::Unauthorized)));

        // Well past the default 60s leeway.
        let stale = JwtCredentials::new("test-secret", Duration::minutes(-5));
        let token = stale.issue("user-1").unwrap();
        assert!(matches!(ours.verify(&token), Err(PortError::Unauthorized)));
        assert!(matches!(ours.verify("garbage"), Err(PortError::Unauthorized)));
    }
}
