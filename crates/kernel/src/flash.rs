//! One-shot messages carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key for queued messages.
const FLASH_KEY: &str = "flash_messages";

/// Severity, used as a CSS class by templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

/// A queued message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

/// Queue a message for the next rendered page.
pub async fn push(session: &Session, level: Level, text: impl Into<String>) {
    let mut messages: Vec<FlashMessage> = session.get(FLASH_KEY).await.ok().flatten().unwrap_or_default();
    messages.push(FlashMessage {
        level,
        text: text.into(),
    });
    if let Err(e) = session.insert(FLASH_KEY, messages).await {
        tracing::warn!(error = %e, "failed to store flash message");
    }
}

pub async fn success(session: &Session, text: impl Into<String>) {
    push(session, Level::Success, text).await;
}

pub async fn info(session: &Session, text: impl Into<String>) {
    push(session, Level::Info, text).await;
}

pub async fn error(session: &Session, text: impl Into<String>) {
    push(session, Level::Error, text).await;
}

/// Read and clear all queued messages.
pub async fn take(session: &Session) -> Vec<FlashMessage> {
    session
        .remove::<Vec<FlashMessage>>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn messages_are_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        success(&session, "saved").await;
        info(&session, "partly").await;
        error(&session, "but also").await;

        let messages = take(&session).await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].level, Level::Success);
        assert_eq!(messages[1].level, Level::Info);
        assert_eq!(messages[2].text, "but also");

        assert!(take(&session).await.is_empty());
    }
}
