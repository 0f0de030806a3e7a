//! Post model and slug handling.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Tag;
use crate::store::BlogStore;

/// Maximum slug length before truncation at a word boundary.
const MAX_SLUG_LEN: usize = 200;

/// Post record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub headline: String,
    pub sub_headline: Option<String>,
    /// URL of the thumbnail image.
    pub thumbnail: Option<String>,
    /// Rich-text body (HTML, sanitised at render time).
    pub body: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub active: bool,
    pub featured: bool,
    pub slug: String,
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Input for creating or updating a post.
///
/// `slug` is final: callers resolve blank slugs with [`generate_unique_slug`]
/// before handing the input to the store.
#[derive(Debug, Clone, Deserialize)]
pub struct SavePost {
    pub headline: String,
    pub sub_headline: Option<String>,
    pub thumbnail: Option<String>,
    pub body: Option<String>,
    pub active: bool,
    pub featured: bool,
    pub slug: String,
    pub tag_ids: Vec<Uuid>,
}

impl Post {
    /// Whether the post carries the given tag.
    pub fn has_tag(&self, tag_id: Uuid) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

/// Convert text into a URL-safe slug.
///
/// Transforms to lowercase, replaces non-alphanumeric characters with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_hyphen = true;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.len() > MAX_SLUG_LEN {
        // Pure ASCII at this point, so byte slicing is safe
        let truncated = &result[..MAX_SLUG_LEN];
        return match truncated.rfind('-') {
            Some(idx) => truncated[..idx].to_string(),
            None => truncated.to_string(),
        };
    }

    result
}

/// Whether a user-supplied slug consists only of letters, digits, hyphens and
/// underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Generate a slug from a headline that no other post uses.
///
/// If `my-post` is taken, tries `my-post-2`, `my-post-3`, and so on.
/// `exclude` names the post being updated so it does not collide with itself.
pub async fn generate_unique_slug(
    store: &dyn BlogStore,
    headline: &str,
    exclude: Option<Uuid>,
) -> Result<String> {
    let mut base = slugify(headline);
    if base.is_empty() {
        base = "post".to_string();
    }

    if !store.slug_exists(&base, exclude).await? {
        return Ok(base);
    }

    let mut count = 2u32;
    loop {
        let candidate = format!("{base}-{count}");
        if !store.slug_exists(&candidate, exclude).await? {
            return Ok(candidate);
        }
        count += 1;
    }
}
