//! Post tags.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}
