//! Database models.

pub mod comment;
pub mod post;
pub mod profile;
pub mod tag;
pub mod user;

pub use comment::{CommentListing, CreateComment, PostComment};
pub use post::{Post, SavePost};
pub use profile::{Profile, UpdateProfile};
pub use tag::Tag;
pub use user::{CreateUser, UpdateUser, User};
