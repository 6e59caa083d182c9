//! services/api/src/adapters/password.rs
//!
//! Argon2 implementation of the `PasswordHashingService` port.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use learning_core::ports::{PasswordHashingService, PortError, PortResult};

/// Hashes passwords with Argon2id. Hashing runs on the blocking thread pool so it
/// does not stall the async runtime.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

#[async_trait]
impl PasswordHashingService for Argon2Hasher {
    async fn hash(&self, plaintext: &str) -> PortResult<String> {
        let argon2 = self.argon2();
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))
        })
        .await
        .map_err(|e| PortError::Unexpected(format!("Task join error: {}", e)))?
    }

    async fn verify(&self, plaintext: &str, hash: &str) -> PortResult<bool> {
        let argon2 = self.argon2();
        let plaintext = plaintext.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&hash).map_err(|e| {
                PortError::Unexpected(format!("Failed to parse password hash: {}", e))
            })?;
            Ok(argon2
                .verify_password(plaintext.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|e| PortError::Unexpected(format!("Task join error: {}", e)))?
    }
}
