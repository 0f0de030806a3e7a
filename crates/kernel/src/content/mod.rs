//! Post listing support: filtering, pagination, and text formats.

pub mod filter;
pub mod format;
pub mod pager;

pub use filter::PostFilter;
pub use format::html_escape;
pub use pager::{POSTS_PER_PAGE, Page, Paginator};
