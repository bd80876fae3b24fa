//! Token generation and hashing shared by the session and auth-token
//! services.
//!
//! Raw tokens are 32 cryptographically random bytes rendered as hex; only
//! their SHA-256 hashes are persisted.

use rolegrid_core::{AppError, AppResult};

/// Length of a raw token in hex characters.
pub(crate) const RAW_TOKEN_LENGTH: usize = 64;

/// Generates a cryptographically random token and its SHA-256 hash.
///
/// Returns `(raw_token_hex, sha256_hash_hex)`.
pub(crate) fn generate_token() -> AppResult<(String, String)> {
    use std::fmt::Write;

    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate token: {error}")))?;

    let raw_token = bytes
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        });

    let hash = hash_token(&raw_token);
    Ok((raw_token, hash))
}

/// Computes the SHA-256 hash of a token string for storage.
pub(crate) fn hash_token(raw_token: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

/// Returns true when the value has the shape of a raw token.
pub(crate) fn is_well_formed_token(value: &str) -> bool {
    value.len() == RAW_TOKEN_LENGTH && value.bytes().all(|byte| byte.is_ascii_hexdigit())
}
