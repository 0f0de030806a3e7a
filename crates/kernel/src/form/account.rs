//! Login, registration and account-settings forms.

use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use super::data::FormData;
use super::types::{self, Cleaned, FormErrors};
use crate::models::user::normalize_email;
use crate::models::{CreateUser, Profile, UpdateProfile, UpdateUser, User};
use crate::store::BlogStore;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of first/last names.
const NAME_MAX: usize = 150;

/// Login credentials.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            email: data.text("email"),
            password: data.raw("password"),
        }
    }

    /// Normalised email used for the lookup.
    pub fn lookup_email(&self) -> String {
        normalize_email(&self.email)
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Sign-up form. The email doubles as the username.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            first_name: data.text("first_name"),
            last_name: data.text("last_name"),
            email: data.text("email"),
            password1: data.raw("password1"),
            password2: data.raw("password2"),
        }
    }

    /// Validate and check the email is not already registered.
    pub async fn clean(&self, store: &dyn BlogStore) -> Result<Cleaned<CreateUser>> {
        let mut errors = FormErrors::new();

        types::max_length(&mut errors, "first_name", &self.first_name, NAME_MAX);
        types::max_length(&mut errors, "last_name", &self.last_name, NAME_MAX);
        types::require(&mut errors, "email", &self.email);
        types::email(&mut errors, "email", &self.email);
        types::require(&mut errors, "password1", &self.password1);
        types::require(&mut errors, "password2", &self.password2);

        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                for message in password_problems(&self.password1) {
                    errors.add("password2", message);
                }
            }
        }

        let email = normalize_email(&self.email);
        if !errors.has("email") && store.find_user_by_email(&email).await?.is_some() {
            errors.add("email", "A user with that email already exists.");
        }

        Ok(errors.into_result(CreateUser {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email,
            password: self.password1.clone(),
            is_staff: false,
        }))
    }
}

/// Reasons a password is too weak, empty when acceptable.
pub fn password_problems(password: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    problems
}

// =============================================================================
// Account settings
// =============================================================================

/// The user's own name and email.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            first_name: data.text("first_name"),
            last_name: data.text("last_name"),
            email: data.text("email"),
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }

    /// Validate; the email may not belong to another user.
    pub async fn clean(&self, store: &dyn BlogStore, user_id: Uuid) -> Result<Cleaned<UpdateUser>> {
        let mut errors = FormErrors::new();
        types::max_length(&mut errors, "first_name", &self.first_name, NAME_MAX);
        types::max_length(&mut errors, "last_name", &self.last_name, NAME_MAX);
        types::require(&mut errors, "email", &self.email);
        types::email(&mut errors, "email", &self.email);

        let email = normalize_email(&self.email);
        if !errors.has("email") {
            if let Some(other) = store.find_user_by_email(&email).await? {
                if other.id != user_id {
                    errors.add("email", "A user with that email already exists.");
                }
            }
        }

        Ok(errors.into_result(UpdateUser {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email,
        }))
    }
}

/// Public profile fields.
///
/// Submitted alongside [`UserForm`], so its inputs carry [`ProfileForm::PREFIX`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub profile_pic: String,
    pub bio: String,
}

impl ProfileForm {
    /// Input name prefix, e.g. `profile-email`.
    pub const PREFIX: &'static str = "profile-";

    pub fn from_data(data: &FormData) -> Self {
        let field = |name: &str| data.text(&format!("{}{name}", Self::PREFIX));
        Self {
            name: field("name"),
            email: field("email"),
            profile_pic: field("profile_pic"),
            bio: field("bio"),
        }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone().unwrap_or_default(),
            email: profile.email.clone().unwrap_or_default(),
            profile_pic: profile.profile_pic.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }

    pub fn clean(&self) -> Cleaned<UpdateProfile> {
        let mut errors = FormErrors::new();
        types::max_length(&mut errors, "name", &self.name, 200);
        types::max_length(&mut errors, "email", &self.email, 200);
        types::email(&mut errors, "email", &self.email);
        types::url(&mut errors, "profile_pic", &self.profile_pic);

        errors.into_result(UpdateProfile {
            name: types::non_empty(&self.name),
            email: types::non_empty(&self.email),
            profile_pic: types::non_empty(&self.profile_pic),
            bio: types::non_empty(&self.bio),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registration(pairs: &[(&str, &str)]) -> RegistrationForm {
        RegistrationForm::from_data(&FormData::from_pairs(pairs.iter().copied()))
    }

    fn valid_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("first_name", "Ada"),
            ("last_name", "Lovelace"),
            ("email", "Ada@Example.com"),
            ("password1", "analytical-engine"),
            ("password2", "analytical-engine"),
        ]
    }

    #[tokio::test]
    async fn valid_registration_normalises_email() {
        let store = MemoryStore::new();
        let input = registration(&valid_pairs())
            .clean(&store)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(input.email, "ada@example.com");
        assert!(!input.is_staff);
    }

    #[tokio::test]
    async fn names_are_optional() {
        let store = MemoryStore::new();
        let input = registration(&valid_pairs()[2..])
            .clean(&store)
            .await
            .unwrap()
            .unwrap();
        assert!(input.first_name.is_empty());
        assert!(input.last_name.is_empty());
    }

    #[tokio::test]
    async fn mismatched_passwords_are_rejected() {
        let store = MemoryStore::new();
        let mut pairs = valid_pairs();
        pairs[4] = ("password2", "something-else");
        let errors = registration(&pairs).clean(&store).await.unwrap().unwrap_err();
        assert!(errors.has("password2"));
    }

    #[tokio::test]
    async fn weak_passwords_are_rejected() {
        let store = MemoryStore::new();
        let mut pairs = valid_pairs();
        pairs[3] = ("password1", "12345678");
        pairs[4] = ("password2", "12345678");
        let errors = registration(&pairs).clean(&store).await.unwrap().unwrap_err();
        assert!(errors.has("password2"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let input = registration(&valid_pairs())
            .clean(&store)
            .await
            .unwrap()
            .unwrap();
        store.create_user(input).await.unwrap();

        let errors = registration(&valid_pairs())
            .clean(&store)
            .await
            .unwrap()
            .unwrap_err();
        assert!(errors.has("email"));
    }

    #[test]
    fn password_rules() {
        assert!(password_problems("correct horse").is_empty());
        assert_eq!(password_problems("short").len(), 1);
        assert_eq!(password_problems("1234").len(), 2);
    }

    #[tokio::test]
    async fn user_form_allows_own_email() {
        let store = MemoryStore::new();
        let input = registration(&valid_pairs())
            .clean(&store)
            .await
            .unwrap()
            .unwrap();
        let ada = store.create_user(input).await.unwrap();

        let form = UserForm::from_user(&ada);
        assert!(form.clean(&store, ada.id).await.unwrap().is_ok());

        let errors = form
            .clean(&store, Uuid::now_v7())
            .await
            .unwrap()
            .unwrap_err();
        assert!(errors.has("email"));
    }

    #[test]
    fn profile_form_blank_fields_become_none() {
        let form = ProfileForm::from_data(&FormData::parse(b"profile-name=Ada&profile-bio=&profile-profile_pic="));
        let update = form.clean().unwrap();
        assert_eq!(update.name.as_deref(), Some("Ada"));
        assert!(update.bio.is_none());
        assert!(update.profile_pic.is_none());
    }

    #[test]
    fn profile_form_rejects_bad_picture_url() {
        let form = ProfileForm::from_data(&FormData::parse(b"profile-profile_pic=ftp%3A%2F%2Fx"));
        assert!(form.clean().unwrap_err().has("profile_pic"));
    }
}
