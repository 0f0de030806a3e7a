//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::services::{Mailer, SmtpMailer};
use crate::store::{BlogStore, MemoryStore, PgStore};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Storage backend.
    store: Arc<dyn BlogStore>,

    /// Template engine.
    theme: ThemeEngine,

    /// Outbound mail; `None` when SMTP is not configured.
    mailer: Option<Arc<dyn Mailer>>,

    /// Site name shown in page titles.
    site_name: String,

    /// Recipient of contact-form messages.
    contact_email: String,
}

impl AppState {
    /// Create state backed by PostgreSQL, applying pending migrations.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config.require_database_url()?, config.database_max_connections)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        Self::with_store(config, Arc::new(PgStore::new(pool)))
    }

    /// Create state backed by the in-memory store. Data is lost on exit.
    pub fn in_memory(config: &Config) -> Result<Self> {
        warn!("using in-memory storage; nothing will be persisted");
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    fn with_store(config: &Config, store: Arc<dyn BlogStore>) -> Result<Self> {
        let theme = ThemeEngine::new(&config.templates_dir)
            .context("failed to initialize theme engine")?;

        let mailer: Option<Arc<dyn Mailer>> = match SmtpMailer::from_config(config)? {
            Some(mailer) => {
                info!(host = ?config.smtp_host, "email delivery enabled");
                Some(Arc::new(mailer))
            }
            None => {
                info!("SMTP_HOST not set; contact form email is disabled");
                None
            }
        };

        Ok(Self::from_parts(
            store,
            theme,
            mailer,
            config.site_name.clone(),
            config.contact_email.clone(),
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        store: Arc<dyn BlogStore>,
        theme: ThemeEngine,
        mailer: Option<Arc<dyn Mailer>>,
        site_name: String,
        contact_email: String,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                theme,
                mailer,
                site_name,
                contact_email,
            }),
        }
    }

    /// Get the storage backend.
    pub fn store(&self) -> &dyn BlogStore {
        self.inner.store.as_ref()
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    /// Get the mailer, if email is configured.
    pub fn mailer(&self) -> Option<&dyn Mailer> {
        self.inner.mailer.as_deref()
    }

    pub fn site_name(&self) -> &str {
        &self.inner.site_name
    }

    pub fn contact_email(&self) -> &str {
        &self.inner.contact_email
    }
}
