use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use rand::rngs::OsRng;
use thiserror::Error;
use tokio::task::JoinError;

use crate::telemetry::{observe, op_span, Traced};

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password mismatch")]
    Mismatch,
    #[error("password hashing failed: {0}")]
    Primitive(String),
    #[error("hashing worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// One-way credential hashing.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plain: &str) -> Result<String, HashError>;
    /// `Ok(())` when `plain` reproduces `hash`, [`HashError::Mismatch`] otherwise.
    async fn compare(&self, hash: &str, plain: &str) -> Result<(), HashError>;
}

/// Argon2id with the crate's default cost (19 MiB, 2 passes, 1 lane).
///
/// Work runs on the blocking pool so request tasks keep making progress
/// while a hash is computed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

fn hash_blocking(plain: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| HashError::Primitive(e.to_string()))?
        .to_string();
    Ok(hash)
}

fn compare_blocking(hash: &str, plain: &str) -> Result<(), HashError> {
    let parsed = PasswordHash::new(hash).map_err(|e| HashError::Primitive(e.to_string()))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(HashError::Mismatch),
        Err(e) => Err(HashError::Primitive(e.to_string())),
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, plain: &str) -> Result<String, HashError> {
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(&plain)).await?
    }

    async fn compare(&self, hash: &str, plain: &str) -> Result<(), HashError> {
        let (hash, plain) = (hash.to_owned(), plain.to_owned());
        tokio::task::spawn_blocking(move || compare_blocking(&hash, &plain)).await?
    }
}

// Neither span carries the plaintext or the hash.
#[async_trait]
impl<H: PasswordHasher> PasswordHasher for Traced<H> {
    async fn hash(&self, plain: &str) -> Result<String, HashError> {
        observe(op_span!("hasher.Hash"), "password hashed", self.0.hash(plain)).await
    }

    async fn compare(&self, hash: &str, plain: &str) -> Result<(), HashError> {
        observe(
            op_span!("hasher.Compare"),
            "password matched",
            self.0.compare(hash, plain),
        )
        .await
    }
}
