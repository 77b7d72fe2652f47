use bcrypt::{hash, verify};
use tokio::task;

use crate::error::AppResult;

/// hash_secret
///
/// One-way bcrypt hash of an admin password with the configured work factor.
/// The salt is generated per call, so hashing the same secret twice yields
/// different strings.
pub fn hash_secret(secret: &str, cost: u32) -> AppResult<String> {
    Ok(hash(secret, cost)?)
}

/// verify_secret
///
/// Hash-and-compare. A malformed stored hash is reported as an error rather than
/// as a mismatch.
pub fn verify_secret(secret: &str, stored_hash: &str) -> AppResult<bool> {
    Ok(verify(secret, stored_hash)?)
}

/// [`hash_secret`] on the blocking pool, for use inside request handlers.
pub async fn hash_secret_blocking(secret: String, cost: u32) -> AppResult<String> {
    task::spawn_blocking(move || hash_secret(&secret, cost)).await?
}

/// [`verify_secret`] on the blocking pool, for use inside request handlers.
pub async fn verify_secret_blocking(secret: String, stored_hash: String) -> AppResult<bool> {
    task::spawn_blocking(move || verify_secret(&secret, &stored_hash)).await?
}
