//! Per-user profile record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile record, one per user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    /// URL of the profile picture.
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
}

/// Input for updating a profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
}
