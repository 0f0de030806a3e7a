//! Outbound services.

pub mod email;

pub use email::{Mailer, SmtpMailer};
