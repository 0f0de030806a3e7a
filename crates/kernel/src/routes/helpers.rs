//! Shared route helpers for authentication and page rendering.

use axum::http::Uri;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::flash;
use crate::form::{FormData, FormErrors, INVALID_TOKEN_MESSAGE, check_submitted, generate_csrf_token};
use crate::models::User;
use crate::state::AppState;

/// Session key for the authenticated user's ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Login page path.
pub const LOGIN_PATH: &str = "/login/";

/// The logged-in user, if the session names an active one.
pub async fn current_user(state: &AppState, session: &Session) -> AppResult<Option<User>> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();
    let Some(id) = user_id else {
        return Ok(None);
    };

    let user = state.store().find_user(id).await?;
    Ok(user.filter(|u| u.is_active))
}

/// Require an authenticated user, or redirect to login with a `next` link
/// back to `uri`.
pub async fn require_login(
    state: &AppState,
    session: &Session,
    uri: &Uri,
) -> Result<User, Response> {
    match current_user(state, session).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(login_redirect(uri)),
        Err(e) => Err(e.into_response()),
    }
}

/// Require a **staff** user. Anonymous visitors are sent to login; other
/// users get 403.
pub async fn require_staff(state: &AppState, session: &Session, uri: &Uri) -> Result<User, Response> {
    let user = require_login(state, session, uri).await?;
    if user.is_staff {
        Ok(user)
    } else {
        tracing::info!(user_id = %user.id, path = %uri.path(), "non-staff user denied");
        Err(AppError::Forbidden.into_response())
    }
}

/// Redirect to the login page, remembering where the visitor was going.
pub fn login_redirect(uri: &Uri) -> Response {
    let next = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());
    Redirect::to(&format!("{LOGIN_PATH}?next={}", urlencoding::encode(&next))).into_response()
}

/// Accept a post-login redirect target only if it stays on this site.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then(|| next.to_string())
}

/// Verify the submitted CSRF token. On failure, flash the error and redirect
/// to `back`.
pub async fn check_token(session: &Session, data: &FormData, back: &str) -> Result<(), Response> {
    if check_submitted(session, data.token()).await {
        return Ok(());
    }
    tracing::warn!(path = %back, "rejected form with invalid CSRF token");
    flash::error(session, INVALID_TOKEN_MESSAGE).await;
    Err(Redirect::to(back).into_response())
}

/// Render a page with the site-wide context.
///
/// Adds: `site_name`, `user`, `is_authenticated`, `is_staff`, `messages`,
/// `csrf_token`, and an empty `errors` map unless the page set one.
pub async fn render(
    state: &AppState,
    session: &Session,
    user: Option<&User>,
    template: &str,
    mut context: tera::Context,
) -> AppResult<Response> {
    let csrf_token = generate_csrf_token(session).await?;
    let messages = flash::take(session).await;

    context.insert("site_name", state.site_name());
    context.insert("user", &user);
    context.insert("is_authenticated", &user.is_some());
    context.insert("is_staff", &user.is_some_and(|u| u.is_staff));
    context.insert("messages", &messages);
    context.insert("csrf_token", &csrf_token);
    if !context.contains_key("errors") {
        context.insert("errors", &FormErrors::new());
    }

    let html = state.theme().render(template, &context)?;
    Ok(Html(html).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/account/")), Some("/account/".to_string()));
        assert_eq!(
            safe_next(Some("/posts/?page=2")),
            Some("/posts/?page=2".to_string())
        );
    }

    #[test]
    fn safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("https://evil.example.com/")), None);
        assert_eq!(safe_next(Some("//evil.example.com/")), None);
        assert_eq!(safe_next(Some("/\\evil.example.com")), None);
        assert_eq!(safe_next(Some("")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn login_redirect_encodes_next() {
        let uri: Uri = "/update_post/hello/?x=1".parse().unwrap_or_default();
        let response = login_redirect(&uri);
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert_eq!(location, "/login/?next=%2Fupdate_post%2Fhello%2F%3Fx%3D1");
    }
}
