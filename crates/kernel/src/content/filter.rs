//! Query-string driven post filtering.
//!
//! Recognised parameters:
//! - `headline`: case-insensitive substring match on the headline
//! - `tags` (repeatable): post must carry at least one of the given tag IDs
//!
//! Unknown parameters (such as `page`) and unparseable tag IDs are ignored.

use serde::Serialize;
use url::form_urlencoded;
use uuid::Uuid;

use crate::models::Post;

/// Filter applied to the public post listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostFilter {
    pub headline: Option<String>,
    pub tags: Vec<Uuid>,
}

impl PostFilter {
    /// Parse a filter from a raw (undecoded) query string.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut filter = Self::default();
        let Some(raw) = raw else {
            return filter;
        };

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "headline" => {
                    let value = value.trim();
                    if !value.is_empty() {
                        filter.headline = Some(value.to_string());
                    }
                }
                "tags" => {
                    if let Ok(id) = Uuid::parse_str(value.trim()) {
                        if !filter.tags.contains(&id) {
                            filter.tags.push(id);
                        }
                    }
                }
                _ => {}
            }
        }

        filter
    }

    /// Whether no criteria are set.
    pub fn is_empty(&self) -> bool {
        self.headline.is_none() && self.tags.is_empty()
    }

    /// Whether a post satisfies the filter.
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(needle) = &self.headline {
            if !post
                .headline
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        self.tags.is_empty() || self.tags.iter().any(|id| post.has_tag(*id))
    }

    /// Encode the filter back into a query string (without `page`), for
    /// pagination links.
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(headline) = &self.headline {
            serializer.append_pair("headline", headline);
        }
        for id in &self.tags {
            serializer.append_pair("tags", &id.to_string());
        }
        serializer.finish()
    }
}

/// Extract the raw `page` parameter from a query string.
pub fn page_param(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    form_urlencoded::parse(raw.as_bytes())
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned())
}
