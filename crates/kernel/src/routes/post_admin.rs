//! Staff-only post management: create, update, delete.

use axum::Router;
use axum::extract::{OriginalUri, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::flash;
use crate::form::{FormData, FormErrors, PostForm};
use crate::models::{Post, User};
use crate::routes::helpers::{check_token, render, require_staff};
use crate::state::AppState;

/// Where staff land after a successful change.
const POSTS_PATH: &str = "/posts/";

async fn find_post(state: &AppState, slug: &str) -> AppResult<Post> {
    state
        .store()
        .find_post_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound)
}

async fn render_form(
    state: &AppState,
    session: &Session,
    user: &User,
    form: &PostForm,
    errors: Option<&FormErrors>,
    post: Option<&Post>,
) -> AppResult<Response> {
    let tags = state.store().list_tags().await?;

    let mut context = tera::Context::new();
    context.insert("form", form);
    context.insert("errors", &errors.cloned().unwrap_or_default());
    context.insert("tags", &tags);
    context.insert("post", &post);
    render(state, session, Some(user), "blog/post_form.html", context).await
}

/// Empty post form.
///
/// GET /create_post/
async fn create_form(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Response> {
    let user = match require_staff(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    render_form(&state, &session, &user, &PostForm::default(), None, None).await
}

/// Create a post.
///
/// POST /create_post/
async fn create_submit(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    data: FormData,
) -> AppResult<Response> {
    let user = match require_staff(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    if let Err(response) = check_token(&session, &data, uri.path()).await {
        return Ok(response);
    }

    let form = PostForm::from_data(&data);
    let post = match form.save(state.store(), None).await? {
        Ok(post) => post.ok_or_else(|| anyhow::anyhow!("created post was not returned"))?,
        Err(errors) => {
            return render_form(&state, &session, &user, &form, Some(&errors), None).await;
        }
    };
    info!(slug = %post.slug, user_id = %user.id, "post created");
    flash::success(&session, "Post created.").await;
    Ok(Redirect::to(POSTS_PATH).into_response())
}

/// Edit form prefilled from the post.
///
/// GET /update_post/{slug}/
async fn update_form(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let user = match require_staff(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let post = find_post(&state, &slug).await?;
    let form = PostForm::from_post(&post);
    render_form(&state, &session, &user, &form, None, Some(&post)).await
}

/// Update a post.
///
/// POST /update_post/{slug}/
async fn update_submit(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
    data: FormData,
) -> AppResult<Response> {
    let user = match require_staff(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    if let Err(response) = check_token(&session, &data, uri.path()).await {
        return Ok(response);
    }

    let post = find_post(&state, &slug).await?;
    let form = PostForm::from_data(&data);
    let updated = match form.save(state.store(), Some(post.id)).await? {
        Ok(updated) => updated.ok_or(AppError::NotFound)?,
        Err(errors) => {
            return render_form(&state, &session, &user, &form, Some(&errors), Some(&post)).await;
        }
    };
    info!(slug = %updated.slug, previous_slug = %post.slug, user_id = %user.id, "post updated");
    flash::success(&session, "Post updated.").await;
    Ok(Redirect::to(POSTS_PATH).into_response())
}

/// Deletion confirmation page.
///
/// GET /delete_post/{slug}/
async fn delete_confirm(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let user = match require_staff(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let post = find_post(&state, &slug).await?;

    let mut context = tera::Context::new();
    context.insert("post", &post);
    render(&state, &session, Some(&user), "blog/delete.html", context).await
}

/// Delete a post and its comments.
///
/// POST /delete_post/{slug}/
async fn delete_submit(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
    data: FormData,
) -> AppResult<Response> {
    let user = match require_staff(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    if let Err(response) = check_token(&session, &data, uri.path()).await {
        return Ok(response);
    }

    let post = find_post(&state, &slug).await?;
    state.store().delete_post(post.id).await?;
    info!(slug = %post.slug, user_id = %user.id, "post deleted");
    flash::success(&session, "Post deleted.").await;
    Ok(Redirect::to(POSTS_PATH).into_response())
}

/// Create the post management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create_post/", get(create_form).post(create_submit))
        .route("/update_post/{slug}/", get(update_form).post(update_submit))
        .route("/delete_post/{slug}/", get(delete_confirm).post(delete_submit))
}
