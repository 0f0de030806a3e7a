//! HTTP route handlers.

pub mod account;
pub mod auth;
pub mod contact;
pub mod front;
pub mod health;
pub mod helpers;
pub mod post;
pub mod post_admin;
