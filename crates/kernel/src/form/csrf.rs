//! CSRF token generation and verification.
//!
//! Tokens are bound to the session, single-use, and expire after an hour.
//! Up to [`MAX_TOKENS`] outstanding tokens are kept so several open tabs
//! can each submit their own form.

use anyhow::{Result, bail};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tower_sessions::Session;

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of tokens to store per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

/// Message shown when a submitted token does not verify.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid form token. Please try again.";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IssuedToken {
    token: String,
    issued: i64,
}

impl IssuedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now - self.issued <= TOKEN_VALIDITY_SECS
    }
}

async fn load_tokens(session: &Session) -> Vec<IssuedToken> {
    session
        .get(CSRF_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or_default()
}

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let issued = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(issued.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens = load_tokens(session).await;
    tokens.retain(|t| t.is_fresh(issued));
    tokens.push(IssuedToken {
        token: token.clone(),
        issued,
    });

    // Keep only the most recent tokens
    if tokens.len() > MAX_TOKENS {
        let skip = tokens.len() - MAX_TOKENS;
        tokens = tokens.split_off(skip);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify a CSRF token against the session, consuming it on success.
pub async fn verify_csrf_token(session: &Session, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        bail!("empty CSRF token");
    }

    let mut tokens = load_tokens(session).await;
    if tokens.is_empty() {
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();
    let Some(index) = tokens
        .iter()
        .position(|t| t.token == submitted && t.is_fresh(now))
    else {
        return Ok(false);
    };

    tokens.remove(index);
    tokens.retain(|t| t.is_fresh(now));

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}

/// Whether an optional submitted token verifies. Missing tokens fail.
pub async fn check_submitted(session: &Session, submitted: Option<&str>) -> bool {
    match submitted {
        Some(token) => verify_csrf_token(session, token).await.unwrap_or(false),
        None => false,
    }
}
