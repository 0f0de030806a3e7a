//! Persistence backends.
//!
//! All reads and writes of users, profiles, tags, posts and comments go
//! through [`BlogStore`]. The PostgreSQL backend is used in production; the
//! in-memory backend backs the test suite and `folio serve --in-memory`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::content::PostFilter;
use crate::models::{
    CommentListing, CreateComment, CreateUser, Post, PostComment, Profile, SavePost, Tag,
    UpdateProfile, UpdateUser, User,
};

/// Selection criteria for post listings.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Only posts with `active = true`.
    pub active_only: bool,
    /// Only posts with `featured = true`.
    pub featured_only: bool,
    /// Headline/tag filter from the query string.
    pub filter: PostFilter,
}

impl PostQuery {
    /// Publicly listed posts.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    /// Publicly listed posts marked as featured.
    pub fn featured() -> Self {
        Self {
            active_only: true,
            featured_only: true,
            ..Self::default()
        }
    }

    /// Apply a query-string filter.
    pub fn with_filter(mut self, filter: PostFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Whether a post satisfies the query.
    pub fn matches(&self, post: &Post) -> bool {
        (!self.active_only || post.active)
            && (!self.featured_only || post.featured)
            && self.filter.matches(post)
    }
}

/// Storage backend for the blog.
#[async_trait]
pub trait BlogStore: Send + Sync {
    // --- Users & profiles ---

    /// Create a user together with its profile.
    ///
    /// Fails if the (normalised) email is already registered.
    async fn create_user(&self, input: CreateUser) -> Result<User>;

    /// Find a user by ID.
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user's name and email.
    async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<User>>;

    /// Record a successful login.
    async fn touch_login(&self, id: Uuid) -> Result<()>;

    /// Find the profile belonging to a user.
    async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>>;

    /// Replace a user's profile fields.
    async fn update_profile(&self, user_id: Uuid, input: UpdateProfile)
    -> Result<Option<Profile>>;

    // --- Tags ---

    /// List all tags ordered by name.
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Create a tag, or return the existing one with the same name.
    async fn create_tag(&self, name: &str) -> Result<Tag>;

    // --- Posts ---

    /// Create a post and link its tags.
    async fn create_post(&self, input: SavePost) -> Result<Post>;

    /// Update a post and replace its tag links.
    async fn update_post(&self, id: Uuid, input: SavePost) -> Result<Option<Post>>;

    /// Delete a post; its comments and tag links go with it.
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    /// Find a post by slug.
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Whether a slug is taken by any post other than `exclude`.
    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool>;

    /// Count posts matching a query.
    async fn count_posts(&self, query: &PostQuery) -> Result<u64>;

    /// List posts matching a query, newest first.
    async fn list_posts(&self, query: &PostQuery, limit: u64, offset: u64) -> Result<Vec<Post>>;

    // --- Comments ---

    /// Create a comment.
    async fn create_comment(&self, input: CreateComment) -> Result<PostComment>;

    /// List a post's comments with author names, newest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentListing>>;

    /// Count a post's comments.
    async fn count_comments(&self, post_id: Uuid) -> Result<u64>;

    // --- Health ---

    /// Whether the backend is reachable.
    async fn healthy(&self) -> bool;
}
