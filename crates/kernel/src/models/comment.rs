//! Comments left on posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment record. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostComment {
    pub id: Uuid,
    /// Author profile ID.
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub body: String,
    pub created: DateTime<Utc>,
}

/// Comment joined with its author's display name, for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentListing {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub author_pic: Option<String>,
    pub body: String,
    pub created: DateTime<Utc>,
}

/// Input for creating a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}
