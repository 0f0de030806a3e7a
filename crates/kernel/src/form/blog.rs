//! Forms for posts, comments and the contact page.

use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use super::data::FormData;
use super::types::{self, Cleaned, FormErrors};
use crate::models::post::{generate_unique_slug, is_valid_slug};
use crate::models::{Post, SavePost, Tag};
use crate::store::BlogStore;

/// Maximum headline / sub-headline length.
const HEADLINE_MAX: usize = 200;

/// Maximum slug length.
const SLUG_MAX: usize = 255;

/// Save attempts before a slug lost to concurrent writers is reported.
const SAVE_ATTEMPTS: usize = 3;

const SLUG_TAKEN: &str = "Post with this Slug already exists.";

// =============================================================================
// Comment
// =============================================================================

/// A comment on a post.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub body: String,
}

impl CommentForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            body: data.text("body"),
        }
    }

    /// The comment body, if non-blank.
    pub fn clean(&self) -> Cleaned<String> {
        let mut errors = FormErrors::new();
        types::require(&mut errors, "body", &self.body);
        errors.into_result(self.body.clone())
    }
}

// =============================================================================
// Post
// =============================================================================

/// Create/update form for a post. All fields of the model are editable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub headline: String,
    pub sub_headline: String,
    pub thumbnail: String,
    pub body: String,
    pub active: bool,
    pub featured: bool,
    /// Selected tag IDs as submitted.
    pub tags: Vec<String>,
    /// Blank means "generate from the headline".
    pub slug: String,
}

impl PostForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            headline: data.text("headline"),
            sub_headline: data.text("sub_headline"),
            thumbnail: data.text("thumbnail"),
            // Rich text keeps its leading whitespace
            body: data.raw("body"),
            active: data.checkbox("active"),
            featured: data.checkbox("featured"),
            tags: data.all("tags"),
            slug: data.text("slug"),
        }
    }

    /// Prefill from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            headline: post.headline.clone(),
            sub_headline: post.sub_headline.clone().unwrap_or_default(),
            thumbnail: post.thumbnail.clone().unwrap_or_default(),
            body: post.body.clone().unwrap_or_default(),
            active: post.active,
            featured: post.featured,
            tags: post.tags.iter().map(|t| t.id.to_string()).collect(),
            slug: post.slug.clone(),
        }
    }

    /// Field-level checks that need no storage access.
    fn check_fields(&self, known_tags: &[Tag]) -> Cleaned<Vec<Uuid>> {
        let mut errors = FormErrors::new();

        types::require(&mut errors, "headline", &self.headline);
        types::max_length(&mut errors, "headline", &self.headline, HEADLINE_MAX);
        types::max_length(&mut errors, "sub_headline", &self.sub_headline, HEADLINE_MAX);
        types::url(&mut errors, "thumbnail", &self.thumbnail);

        if !self.slug.is_empty() {
            if !is_valid_slug(&self.slug) {
                errors.add(
                    "slug",
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
                );
            }
            types::max_length(&mut errors, "slug", &self.slug, SLUG_MAX);
        }

        let mut tag_ids = Vec::with_capacity(self.tags.len());
        for raw in &self.tags {
            match Uuid::parse_str(raw) {
                Ok(id) if known_tags.iter().any(|t| t.id == id) => {
                    if !tag_ids.contains(&id) {
                        tag_ids.push(id);
                    }
                }
                _ => errors.add(
                    "tags",
                    format!("Select a valid choice. {raw} is not one of the available choices."),
                ),
            }
        }

        errors.into_result(tag_ids)
    }

    /// Validate against the store and produce the final input.
    ///
    /// `exclude` is the post being edited, so an unchanged slug does not
    /// collide with itself. The outer error is a storage failure; the inner
    /// one is a validation failure to show to the user.
    pub async fn clean(
        &self,
        store: &dyn BlogStore,
        exclude: Option<Uuid>,
    ) -> Result<Cleaned<SavePost>> {
        let known_tags = store.list_tags().await?;
        let tag_ids = match self.check_fields(&known_tags) {
            Ok(ids) => ids,
            Err(errors) => return Ok(Err(errors)),
        };

        let slug = if self.slug.is_empty() {
            generate_unique_slug(store, &self.headline, exclude).await?
        } else if store.slug_exists(&self.slug, exclude).await? {
            let mut errors = FormErrors::new();
            errors.add("slug", SLUG_TAKEN);
            return Ok(Err(errors));
        } else {
            self.slug.clone()
        };

        Ok(Ok(SavePost {
            headline: self.headline.clone(),
            sub_headline: types::non_empty(&self.sub_headline),
            thumbnail: types::non_empty(&self.thumbnail),
            body: types::non_empty(&self.body),
            active: self.active,
            featured: self.featured,
            slug,
            tag_ids,
        }))
    }

    /// Validate and persist: create a post, or update `existing`.
    ///
    /// Another writer can take the slug between the check and the write. The
    /// form is then cleaned again, so a generated slug moves on to the next
    /// free suffix and an explicit one becomes a field error. `Ok(Ok(None))`
    /// means `existing` was deleted meanwhile.
    pub async fn save(
        &self,
        store: &dyn BlogStore,
        existing: Option<Uuid>,
    ) -> Result<Cleaned<Option<Post>>> {
        for _ in 0..SAVE_ATTEMPTS {
            let input = match self.clean(store, existing).await? {
                Ok(input) => input,
                Err(errors) => return Ok(Err(errors)),
            };

            let slug = input.slug.clone();
            let saved = match existing {
                Some(id) => store.update_post(id, input).await,
                None => store.create_post(input).await.map(Some),
            };
            match saved {
                Ok(post) => return Ok(Ok(post)),
                Err(e) => {
                    if !store.slug_exists(&slug, existing).await? {
                        return Err(e);
                    }
                    tracing::warn!(%slug, error = %e, "slug taken while saving post, retrying");
                }
            }
        }

        let mut errors = FormErrors::new();
        errors.add("slug", SLUG_TAKEN);
        Ok(Err(errors))
    }
}

// =============================================================================
// Contact
// =============================================================================

/// Message sent to the site owner.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
            email: data.text("email"),
            subject: data.text("subject"),
            message: data.text("message"),
        }
    }

    pub fn clean(&self) -> Cleaned<Self> {
        let mut errors = FormErrors::new();
        types::require(&mut errors, "name", &self.name);
        types::require(&mut errors, "email", &self.email);
        types::email(&mut errors, "email", &self.email);
        types::require(&mut errors, "subject", &self.subject);
        types::require(&mut errors, "message", &self.message);
        // Subjects end up in a mail header
        if self.subject.contains(['\r', '\n']) {
            errors.add("subject", "Subject must be a single line.");
        }
        errors.into_result(self.clone())
    }
}
