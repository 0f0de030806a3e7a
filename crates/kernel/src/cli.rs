//! CLI command implementations for site administration.
//!
//! These commands operate on a store only, without starting the server.

use anyhow::{Result, bail};

use crate::form::account::password_problems;
use crate::form::types;
use crate::models::CreateUser;
use crate::models::user::normalize_email;
use crate::store::BlogStore;

/// Create a staff account.
pub async fn cmd_create_admin(
    store: &dyn BlogStore,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<()> {
    let email = normalize_email(email);
    if !types::is_valid_email(&email) {
        bail!("'{email}' is not a valid email address");
    }
    let problems = password_problems(password);
    if !problems.is_empty() {
        bail!("password rejected: {}", problems.join(" "));
    }
    if store.find_user_by_email(&email).await?.is_some() {
        bail!("a user with email '{email}' already exists");
    }

    let user = store
        .create_user(CreateUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email,
            password: password.to_string(),
            is_staff: true,
        })
        .await?;

    println!(
        "Created staff user {} <{}> ({})",
        user.display_name(),
        user.email,
        user.id
    );
    Ok(())
}

/// Create a tag, or report the existing one.
pub async fn cmd_create_tag(store: &dyn BlogStore, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("tag name must not be empty");
    }
    let tag = store.create_tag(name).await?;
    println!("Tag '{}' ({})", tag.name, tag.id);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn create_admin_makes_staff_user() {
        let store = MemoryStore::new();
        cmd_create_admin(&store, "Admin@Example.com", "correct horse", "Ada", "")
            .await
            .unwrap();

        let user = store
            .find_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_staff);
        assert!(user.verify_password("correct horse"));
        assert!(store.find_profile_by_user(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_admin_rejects_duplicates_and_weak_passwords() {
        let store = MemoryStore::new();
        assert!(
            cmd_create_admin(&store, "a@example.com", "123", "", "")
                .await
                .is_err()
        );
        cmd_create_admin(&store, "a@example.com", "long enough", "", "")
            .await
            .unwrap();
        assert!(
            cmd_create_admin(&store, "a@example.com", "long enough", "", "")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn create_tag_is_idempotent() {
        let store = MemoryStore::new();
        cmd_create_tag(&store, "rust").await.unwrap();
        cmd_create_tag(&store, " rust ").await.unwrap();
        assert_eq!(store.list_tags().await.unwrap().len(), 1);
        assert!(cmd_create_tag(&store, "  ").await.is_err());
    }
}
