//! Session management using Redis.

use anyhow::{Context, Result};
use fred::prelude::*;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_redis_store::RedisStore;

/// Default session expiry (two weeks of inactivity).
pub const DEFAULT_SESSION_EXPIRY_DAYS: i64 = 14;

/// Connect to Redis and build a session store on top of it.
pub async fn create_redis_store(redis_url: &str) -> Result<RedisStore<Pool>> {
    let config = Config::from_url(redis_url).context("failed to parse Redis URL")?;

    let pool = Builder::from_config(config)
        .build_pool(1)
        .context("failed to create Redis pool")?;

    pool.init()
        .await
        .context("failed to connect to Redis for sessions")?;

    Ok(RedisStore::new(pool))
}

/// Wrap a session store in the cookie-managing layer.
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    same_site: SameSite,
    secure: bool,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_secure(secure)
        .with_http_only(true)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(Duration::days(
            DEFAULT_SESSION_EXPIRY_DAYS,
        )))
}

/// Map the configured SameSite name onto the cookie policy.
pub fn parse_same_site(value: &str) -> SameSite {
    match value {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_site_defaults_to_lax() {
        assert_eq!(parse_same_site("strict"), SameSite::Strict);
        assert_eq!(parse_same_site("none"), SameSite::None);
        assert_eq!(parse_same_site("lax"), SameSite::Lax);
        assert_eq!(parse_same_site("bogus"), SameSite::Lax);
    }
}
