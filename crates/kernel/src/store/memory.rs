//! In-memory storage backend.
//!
//! Mirrors the PostgreSQL schema's constraints (unique email, unique slug,
//! unique tag name, cascading deletes) over plain maps behind a
//! `parking_lot::RwLock`. Data lives only as long as the process.

use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{BlogStore, PostQuery};
use crate::models::user::{hash_password, normalize_email};
use crate::models::{
    CommentListing, CreateComment, CreateUser, Post, PostComment, Profile, SavePost, Tag,
    UpdateProfile, UpdateUser, User,
};

/// Post as stored: tags are kept as IDs and resolved on read.
#[derive(Debug, Clone)]
struct StoredPost {
    post: Post,
    tag_ids: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    tags: HashMap<Uuid, Tag>,
    posts: HashMap<Uuid, StoredPost>,
    comments: Vec<PostComment>,
}

impl Inner {
    fn resolve(&self, stored: &StoredPost) -> Post {
        let mut post = stored.post.clone();
        let mut tags: Vec<Tag> = stored
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        post.tags = tags;
        post
    }

    fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != exclude)
    }

    fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> bool {
        self.posts
            .values()
            .any(|p| p.post.slug == slug && Some(p.post.id) != exclude)
    }

    fn known_tags(&self, ids: &[Uuid]) -> Vec<Uuid> {
        let mut known = Vec::new();
        for id in ids {
            if self.tags.contains_key(id) && !known.contains(id) {
                known.push(*id);
            }
        }
        known
    }

    fn sorted_matches(&self, query: &PostQuery) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .values()
            .map(|p| self.resolve(p))
            .filter(|p| query.matches(p))
            .collect();
        posts.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        posts
    }
}

/// Process-local storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn create_user(&self, input: CreateUser) -> Result<User> {
        let email = normalize_email(&input.email);
        let pass = hash_password(&input.password)?;

        let mut inner = self.inner.write();
        if inner.email_taken(&email, None) {
            bail!("a user with email {email} already exists");
        }

        let user = User {
            id: Uuid::now_v7(),
            username: email.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name,
            email: email.clone(),
            pass,
            is_staff: input.is_staff,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };
        let profile = Profile {
            id: Uuid::now_v7(),
            user_id: user.id,
            name: Some(input.first_name).filter(|n| !n.is_empty()),
            email: Some(email),
            profile_pic: None,
            bio: None,
        };

        inner.users.insert(user.id, user.clone());
        inner.profiles.insert(profile.id, profile);
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<User>> {
        let email = normalize_email(&input.email);
        let mut inner = self.inner.write();
        if inner.email_taken(&email, Some(id)) {
            bail!("a user with email {email} already exists");
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.username = email.clone();
        user.email = email;
        Ok(Some(user.clone()))
    }

    async fn touch_login(&self, id: Uuid) -> Result<()> {
        if let Some(user) = self.inner.write().users.get_mut(&id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self
            .inner
            .read()
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfile,
    ) -> Result<Option<Profile>> {
        let mut inner = self.inner.write();
        let Some(profile) = inner.profiles.values_mut().find(|p| p.user_id == user_id) else {
            return Ok(None);
        };
        profile.name = input.name;
        profile.email = input.email;
        profile.profile_pic = input.profile_pic;
        profile.bio = input.bio;
        Ok(Some(profile.clone()))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self.inner.read().tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_tag(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            bail!("tag name must not be empty");
        }

        let mut inner = self.inner.write();
        if let Some(existing) = inner.tags.values().find(|t| t.name == name) {
            return Ok(existing.clone());
        }
        let tag = Tag {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        inner.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn create_post(&self, input: SavePost) -> Result<Post> {
        let mut inner = self.inner.write();
        if inner.slug_taken(&input.slug, None) {
            bail!("slug {} is already in use", input.slug);
        }

        let now = Utc::now();
        let tag_ids = inner.known_tags(&input.tag_ids);
        let stored = StoredPost {
            post: Post {
                id: Uuid::now_v7(),
                headline: input.headline,
                sub_headline: input.sub_headline,
                thumbnail: input.thumbnail,
                body: input.body,
                created: now,
                updated: now,
                active: input.active,
                featured: input.featured,
                slug: input.slug,
                tags: Vec::new(),
            },
            tag_ids,
        };
        let post = inner.resolve(&stored);
        inner.posts.insert(post.id, stored);
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, input: SavePost) -> Result<Option<Post>> {
        let mut inner = self.inner.write();
        if inner.slug_taken(&input.slug, Some(id)) {
            bail!("slug {} is already in use", input.slug);
        }

        let tag_ids = inner.known_tags(&input.tag_ids);
        let Some(stored) = inner.posts.get_mut(&id) else {
            return Ok(None);
        };
        stored.post.headline = input.headline;
        stored.post.sub_headline = input.sub_headline;
        stored.post.thumbnail = input.thumbnail;
        stored.post.body = input.body;
        stored.post.active = input.active;
        stored.post.featured = input.featured;
        stored.post.slug = input.slug;
        stored.post.updated = Utc::now();
        stored.tag_ids = tag_ids;

        let stored = stored.clone();
        Ok(Some(inner.resolve(&stored)))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write();
        if inner.posts.remove(&id).is_none() {
            return Ok(false);
        }
        inner.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let inner = self.inner.read();
        Ok(inner
            .posts
            .values()
            .find(|p| p.post.slug == slug)
            .map(|p| inner.resolve(p)))
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        Ok(self.inner.read().slug_taken(slug, exclude))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64> {
        let inner = self.inner.read();
        let count = inner
            .posts
            .values()
            .filter(|p| query.matches(&inner.resolve(p)))
            .count();
        Ok(count as u64)
    }

    async fn list_posts(&self, query: &PostQuery, limit: u64, offset: u64) -> Result<Vec<Post>> {
        let posts = self.inner.read().sorted_matches(query);
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(posts.into_iter().skip(offset).take(limit).collect())
    }

    async fn create_comment(&self, input: CreateComment) -> Result<PostComment> {
        let mut inner = self.inner.write();
        if !inner.posts.contains_key(&input.post_id) {
            bail!("post {} does not exist", input.post_id);
        }
        if !inner.profiles.contains_key(&input.author_id) {
            bail!("profile {} does not exist", input.author_id);
        }

        let comment = PostComment {
            id: Uuid::now_v7(),
            author_id: input.author_id,
            post_id: input.post_id,
            body: input.body,
            created: Utc::now(),
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentListing>> {
        let inner = self.inner.read();
        let mut comments: Vec<CommentListing> = inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| {
                let author = inner.profiles.get(&c.author_id);
                CommentListing {
                    id: c.id,
                    author_id: c.author_id,
                    author_name: author.and_then(|p| p.name.clone()),
                    author_pic: author.and_then(|p| p.profile_pic.clone()),
                    body: c.body.clone(),
                    created: c.created,
                }
            })
            .collect();
        comments.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<u64> {
        let count = self
            .inner
            .read()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .count();
        Ok(count as u64)
    }

    async fn healthy(&self) -> bool {
        true
    }
}
