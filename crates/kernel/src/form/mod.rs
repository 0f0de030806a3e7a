//! Form handling: decoding, validation, and CSRF protection.
//!
//! Each form reads itself from [`FormData`], and `clean` turns it into the
//! typed input for the store or a [`FormErrors`] set to re-render with.
//! Forms serialise into the template context, so submitted values survive a
//! failed validation round-trip. Password fields never do.

pub mod account;
pub mod blog;
pub mod csrf;
mod data;
pub mod types;

pub use account::{LoginForm, ProfileForm, RegistrationForm, UserForm};
pub use blog::{CommentForm, ContactForm, PostForm};
pub use csrf::{INVALID_TOKEN_MESSAGE, check_submitted, generate_csrf_token, verify_csrf_token};
pub use data::{FormData, TOKEN_FIELD};
pub use types::{Cleaned, FormErrors, NON_FIELD_ERRORS, ValidationError};
