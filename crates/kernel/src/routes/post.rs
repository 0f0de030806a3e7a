//! Post detail page and comment submission.

use axum::Router;
use axum::extract::{OriginalUri, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::flash;
use crate::form::{CommentForm, FormData, FormErrors};
use crate::models::{CreateComment, Post, User};
use crate::routes::helpers::{check_token, current_user, login_redirect, render};
use crate::state::AppState;

/// Load a post visible to `user`. Inactive posts are visible to staff only.
async fn visible_post(state: &AppState, slug: &str, user: Option<&User>) -> AppResult<Post> {
    let post = state
        .store()
        .find_post_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)?;

    if post.active || user.is_some_and(|u| u.is_staff) {
        Ok(post)
    } else {
        Err(AppError::NotFound)
    }
}

async fn render_post(
    state: &AppState,
    session: &Session,
    user: Option<&User>,
    post: &Post,
    form: &CommentForm,
    errors: Option<&FormErrors>,
) -> AppResult<Response> {
    let comments = state.store().list_comments(post.id).await?;

    let mut context = tera::Context::new();
    context.insert("post", post);
    context.insert("comments", &comments);
    context.insert("form", form);
    context.insert("errors", &errors.cloned().unwrap_or_default());
    render(state, session, user, "blog/post.html", context).await
}

/// Post detail page with comments.
///
/// GET /post/{slug}/
async fn post_detail(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let user = current_user(&state, &session).await?;
    let post = visible_post(&state, &slug, user.as_ref()).await?;
    render_post(
        &state,
        &session,
        user.as_ref(),
        &post,
        &CommentForm::default(),
        None,
    )
    .await
}

/// Add a comment to a post.
///
/// POST /post/{slug}/
async fn post_comment(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
    data: FormData,
) -> AppResult<Response> {
    let Some(user) = current_user(&state, &session).await? else {
        return Ok(login_redirect(&uri));
    };
    if let Err(response) = check_token(&session, &data, uri.path()).await {
        return Ok(response);
    }

    let post = visible_post(&state, &slug, Some(&user)).await?;
    let form = CommentForm::from_data(&data);
    let body = match form.clean() {
        Ok(body) => body,
        Err(errors) => {
            return render_post(&state, &session, Some(&user), &post, &form, Some(&errors)).await;
        }
    };

    let profile = state
        .store()
        .find_profile_by_user(user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} has no profile", user.id))?;

    let comment = state
        .store()
        .create_comment(CreateComment {
            post_id: post.id,
            author_id: profile.id,
            body,
        })
        .await?;

    info!(comment_id = %comment.id, slug = %post.slug, user_id = %user.id, "comment posted");
    flash::success(&session, "Your comment was successfully posted!").await;
    Ok(Redirect::to(&format!("/post/{}/", post.slug)).into_response())
}

/// Create the post detail router.
pub fn router() -> Router<AppState> {
    Router::new().route("/post/{slug}/", get(post_detail).post(post_comment))
}
