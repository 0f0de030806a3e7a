//! Public pages: home, post listing, and the site owner's profile.

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::response::Response;
use axum::routing::get;
use tower_sessions::Session;

use crate::content::filter::page_param;
use crate::content::{POSTS_PER_PAGE, Paginator, PostFilter};
use crate::error::AppResult;
use crate::routes::helpers::{current_user, render};
use crate::state::AppState;
use crate::store::PostQuery;

/// Number of featured posts on the home page.
const FEATURED_LIMIT: u64 = 3;

/// Home page.
///
/// GET /
async fn home(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let user = current_user(&state, &session).await?;
    let posts = state
        .store()
        .list_posts(&PostQuery::featured(), FEATURED_LIMIT, 0)
        .await?;

    let mut context = tera::Context::new();
    context.insert("posts", &posts);
    render(&state, &session, user.as_ref(), "blog/index.html", context).await
}

/// Paginated, filterable post listing.
///
/// GET /posts/?headline=…&tags=…&page=…
async fn posts(
    State(state): State<AppState>,
    session: Session,
    RawQuery(query): RawQuery,
) -> AppResult<Response> {
    let user = current_user(&state, &session).await?;
    let filter = PostFilter::from_query(query.as_deref());
    let post_query = PostQuery::active().with_filter(filter.clone());

    let count = state.store().count_posts(&post_query).await?;
    let paginator = Paginator::new(count, POSTS_PER_PAGE);
    let number = paginator.resolve(page_param(query.as_deref()).as_deref());
    let items = state
        .store()
        .list_posts(
            &post_query,
            u64::from(paginator.per_page()),
            paginator.offset(number),
        )
        .await?;
    let page = paginator.page(items, number);
    let tags = state.store().list_tags().await?;

    let mut context = tera::Context::new();
    context.insert("page", &page);
    context.insert("posts", &page.items);
    context.insert("tags", &tags);
    context.insert("filter", &filter);
    context.insert("filter_query", &filter.to_query());
    render(&state, &session, user.as_ref(), "blog/posts.html", context).await
}

/// The site owner's profile and contact form.
///
/// GET /profile/
async fn profile(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let user = current_user(&state, &session).await?;
    render(
        &state,
        &session,
        user.as_ref(),
        "blog/profile.html",
        tera::Context::new(),
    )
    .await
}

/// Create the public pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/posts/", get(posts))
        .route("/profile/", get(profile))
}
