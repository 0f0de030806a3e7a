//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL. Required unless running in-memory.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL for sessions.
    pub redis_url: String,

    /// Path to the Tera templates directory (default: ./templates).
    pub templates_dir: PathBuf,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "lax").
    pub cookie_same_site: String,

    /// Whether the session cookie carries the `Secure` attribute (default: true).
    pub cookie_secure: bool,

    /// SMTP host for email delivery. When None, email is disabled.
    pub smtp_host: Option<String>,

    /// SMTP port (default: 587).
    pub smtp_port: u16,

    /// SMTP username for authentication.
    pub smtp_username: Option<String>,

    /// SMTP password for authentication.
    pub smtp_password: Option<String>,

    /// SMTP encryption mode: "starttls" (default), "tls", or "none".
    pub smtp_encryption: String,

    /// From address for outgoing email.
    pub smtp_from_email: String,

    /// Recipient of messages sent through the contact form.
    pub contact_email: String,

    /// Site name shown in page titles.
    pub site_name: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = env::var("DATABASE_URL").ok();

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let templates_dir = env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./templates"));

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "lax".to_string())
            .to_lowercase();

        let cookie_secure = parse_bool(&env::var("COOKIE_SECURE").unwrap_or_default(), true);

        let smtp_host = env::var("SMTP_HOST").ok().filter(|h| !h.is_empty());

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .context("SMTP_PORT must be a valid u16")?;

        let smtp_username = env::var("SMTP_USERNAME").ok();
        let smtp_password = env::var("SMTP_PASSWORD").ok();

        let smtp_encryption = env::var("SMTP_ENCRYPTION")
            .unwrap_or_else(|_| "starttls".to_string())
            .to_lowercase();

        let smtp_from_email =
            env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| "noreply@localhost".to_string());

        let contact_email = env::var("CONTACT_EMAIL").unwrap_or_else(|_| smtp_from_email.clone());

        let site_name = env::var("SITE_NAME").unwrap_or_else(|_| "Folio".to_string());

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            templates_dir,
            cookie_same_site,
            cookie_secure,
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            smtp_encryption,
            smtp_from_email,
            contact_email,
            site_name,
        })
    }

    /// Return the database URL or fail with a readable message.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL environment variable is required")
    }
}

/// Parse a boolean-ish environment value, falling back to `default` when empty
/// or unrecognised.
fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("TRUE", false));
        assert!(parse_bool("on", false));
        assert!(!parse_bool("0", true));
        assert!(!parse_bool("No", true));
    }

    #[test]
    fn parse_bool_falls_back_to_default() {
        assert!(parse_bool("", true));
        assert!(!parse_bool("maybe", false));
    }
}
