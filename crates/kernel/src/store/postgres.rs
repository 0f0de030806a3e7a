//! PostgreSQL storage backend.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BlogStore, PostQuery};
use crate::models::user::{hash_password, normalize_email};
use crate::models::{
    CommentListing, CreateComment, CreateUser, Post, PostComment, Profile, SavePost, Tag,
    UpdateProfile, UpdateUser, User,
};

const POST_COLUMNS: &str = "p.id, p.headline, p.sub_headline, p.thumbnail, p.body, p.created, \
                            p.updated, p.active, p.featured, p.slug";

/// Storage backend over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load tags for a batch of posts and attach them.
    async fn attach_tags(&self, posts: &mut [Post]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let rows: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
            r#"
            SELECT pt.post_id, t.id, t.name
            FROM post_tag pt
            JOIN tag t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .context("failed to load post tags")?;

        let mut by_post: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (post_id, id, name) in rows {
            by_post.entry(post_id).or_default().push(Tag { id, name });
        }
        for post in posts.iter_mut() {
            post.tags = by_post.remove(&post.id).unwrap_or_default();
        }

        Ok(())
    }

    /// Replace a post's tag links inside a transaction.
    async fn link_tags(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        post_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<()> {
        sqlx::query("DELETE FROM post_tag WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut **tx)
            .await
            .context("failed to clear post tags")?;

        if tag_ids.is_empty() {
            return Ok(());
        }

        // Unknown tag IDs are silently dropped by the join
        sqlx::query(
            r#"
            INSERT INTO post_tag (post_id, tag_id)
            SELECT $1, t.id FROM tag t WHERE t.id = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await
        .context("failed to link post tags")?;

        Ok(())
    }

    /// Append the WHERE clause for a post query.
    fn push_post_conditions(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
        builder.push(" WHERE TRUE");
        if query.active_only {
            builder.push(" AND p.active = TRUE");
        }
        if query.featured_only {
            builder.push(" AND p.featured = TRUE");
        }
        if let Some(headline) = &query.filter.headline {
            builder.push(" AND p.headline ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(headline)));
        }
        if !query.filter.tags.is_empty() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM post_tag pt WHERE pt.post_id = p.id AND pt.tag_id = ANY(",
            );
            builder.push_bind(query.filter.tags.clone());
            builder.push("))");
        }
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM post p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch post by id")?;

        self.with_tags(post).await
    }

    async fn with_tags(&self, post: Option<Post>) -> Result<Option<Post>> {
        let Some(post) = post else {
            return Ok(None);
        };
        let mut posts = [post];
        self.attach_tags(&mut posts).await?;
        let [post] = posts;
        Ok(Some(post))
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl BlogStore for PgStore {
    async fn create_user(&self, input: CreateUser) -> Result<User> {
        let email = normalize_email(&input.email);
        let pass = hash_password(&input.password)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, first_name, last_name, email, pass, is_staff)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&email)
        .bind(&pass)
        .bind(input.is_staff)
        .fetch_one(&mut *tx)
        .await
        .context("failed to create user")?;

        let name = Some(input.first_name).filter(|n| !n.is_empty());
        sqlx::query("INSERT INTO profile (id, user_id, name, email) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::now_v7())
            .bind(user.id)
            .bind(name)
            .bind(&email)
            .execute(&mut *tx)
            .await
            .context("failed to create profile")?;

        tx.commit().await.context("failed to commit new user")?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch user by email")?;

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<User>> {
        let email = normalize_email(&input.email);
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = $1, last_name = $2, email = $3, username = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update user")?;

        Ok(user)
    }

    async fn touch_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to update login time")?;

        Ok(())
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profile WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch profile")?;

        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfile,
    ) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profile
            SET name = $1, email = $2, profile_pic = $3, bio = $4
            WHERE user_id = $5
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.profile_pic)
        .bind(&input.bio)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update profile")?;

        Ok(profile)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tag ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("failed to list tags")?;

        Ok(tags)
    }

    async fn create_tag(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("tag name must not be empty");
        }

        // The no-op update makes RETURNING yield the existing row on conflict
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tag (id, name) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .context("failed to create tag")?;

        Ok(tag)
    }

    async fn create_post(&self, input: SavePost) -> Result<Post> {
        let id = Uuid::now_v7();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO post (id, headline, sub_headline, thumbnail, body, active, featured, slug)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&input.headline)
        .bind(&input.sub_headline)
        .bind(&input.thumbnail)
        .bind(&input.body)
        .bind(input.active)
        .bind(input.featured)
        .bind(&input.slug)
        .execute(&mut *tx)
        .await
        .context("failed to create post")?;

        Self::link_tags(&mut tx, id, &input.tag_ids).await?;
        tx.commit().await.context("failed to commit new post")?;

        self.find_post(id)
            .await?
            .context("post vanished after insert")
    }

    async fn update_post(&self, id: Uuid, input: SavePost) -> Result<Option<Post>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            UPDATE post
            SET headline = $1, sub_headline = $2, thumbnail = $3, body = $4,
                active = $5, featured = $6, slug = $7, updated = NOW()
            WHERE id = $8
            "#,
        )
        .bind(&input.headline)
        .bind(&input.sub_headline)
        .bind(&input.thumbnail)
        .bind(&input.body)
        .bind(input.active)
        .bind(input.featured)
        .bind(&input.slug)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("failed to update post")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::link_tags(&mut tx, id, &input.tag_ids).await?;
        tx.commit().await.context("failed to commit post update")?;

        self.find_post(id).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        // post_comment and post_tag rows cascade
        let result = sqlx::query("DELETE FROM post WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM post p WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch post by slug")?;

        self.with_tags(post).await
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM post WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .context("failed to check slug")?;

        Ok(exists)
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM post p");
        Self::push_post_conditions(&mut builder, query);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("failed to count posts")?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_posts(&self, query: &PostQuery, limit: u64, offset: u64) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM post p"));
        Self::push_post_conditions(&mut builder, query);
        builder.push(" ORDER BY p.created DESC, p.id DESC LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let mut posts: Vec<Post> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .context("failed to list posts")?;

        self.attach_tags(&mut posts).await?;
        Ok(posts)
    }

    async fn create_comment(&self, input: CreateComment) -> Result<PostComment> {
        let comment = sqlx::query_as::<_, PostComment>(
            r#"
            INSERT INTO post_comment (id, author_id, post_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, post_id, body, created
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.author_id)
        .bind(input.post_id)
        .bind(&input.body)
        .fetch_one(&self.pool)
        .await
        .context("failed to create comment")?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentListing>> {
        let comments = sqlx::query_as::<_, CommentListing>(
            r#"
            SELECT c.id, c.author_id, pr.name AS author_name, pr.profile_pic AS author_pic,
                   c.body, c.created
            FROM post_comment c
            JOIN profile pr ON pr.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list comments for post")?;

        Ok(comments)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_comment WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .context("failed to count comments for post")?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}
