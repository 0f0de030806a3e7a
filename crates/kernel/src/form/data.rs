//! URL-encoded form bodies with repeated keys.
//!
//! `axum::Form` deserialises through serde_urlencoded, which cannot collect
//! repeated keys (checkbox groups such as `tags`). `FormData` keeps every
//! submitted pair in order instead.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use url::form_urlencoded;

use crate::error::AppError;

/// Name of the hidden CSRF token field.
pub const TOKEN_FIELD: &str = "_token";

/// Decoded form submission.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// Build from explicit pairs.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `name`, trimmed; empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(str::trim).unwrap_or_default().to_string()
    }

    /// Raw value for `name` without trimming (passwords); empty when absent.
    pub fn raw(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// All values submitted under `name`.
    pub fn all(&self, name: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Whether a checkbox named `name` was ticked.
    pub fn checkbox(&self, name: &str) -> bool {
        match self.get(name) {
            Some(v) => !matches!(v.trim().to_lowercase().as_str(), "" | "false" | "0" | "off"),
            None => false,
        }
    }

    /// Submitted CSRF token, if any.
    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_FIELD)
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(Self::parse(&body))
    }
}
