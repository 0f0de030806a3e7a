//! Authentication routes (login, registration, logout).

use axum::Router;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::flash;
use crate::form::{FormData, FormErrors, LoginForm, RegistrationForm};
use crate::models::User;
use crate::routes::helpers::{
    LOGIN_PATH, SESSION_USER_ID, check_token, current_user, render, safe_next,
};
use crate::state::AppState;

/// Registration page path.
const REGISTER_PATH: &str = "/register/";

/// `?next=` on login and registration pages.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// The redirect target from the query string or the hidden form field.
fn next_target(query: &NextQuery, data: Option<&FormData>) -> Option<String> {
    safe_next(query.next.as_deref()).or_else(|| data.and_then(|d| safe_next(d.get("next"))))
}

/// Path back to a page, keeping a valid `next`.
fn with_next(path: &str, next: Option<&str>) -> String {
    match next {
        Some(next) => format!("{path}?next={}", urlencoding::encode(next)),
        None => path.to_string(),
    }
}

/// Bind the session to `user_id`, issuing a fresh session ID.
async fn establish_session(session: &Session, user_id: Uuid) -> anyhow::Result<()> {
    session
        .cycle_id()
        .await
        .map_err(|e| anyhow::anyhow!("failed to cycle session id: {e}"))?;
    session
        .insert(SESSION_USER_ID, user_id)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store user id in session: {e}"))?;
    Ok(())
}

async fn render_login(
    state: &AppState,
    session: &Session,
    form: &LoginForm,
    next: Option<&str>,
) -> AppResult<Response> {
    let mut context = tera::Context::new();
    context.insert("form", form);
    context.insert("next", &next);
    render(state, session, None, "user/login.html", context).await
}

/// Login form.
///
/// GET /login/
async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
) -> AppResult<Response> {
    if current_user(&state, &session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let next = next_target(&query, None);
    render_login(&state, &session, &LoginForm::default(), next.as_deref()).await
}

/// Form-based login handler.
///
/// POST /login/
async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
    data: FormData,
) -> AppResult<Response> {
    if current_user(&state, &session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let next = next_target(&query, Some(&data));
    let back = with_next(LOGIN_PATH, next.as_deref());
    if let Err(response) = check_token(&session, &data, &back).await {
        return Ok(response);
    }

    let form = LoginForm::from_data(&data);
    let Some(user) = state.store().find_user_by_email(&form.lookup_email()).await? else {
        info!(email = %form.lookup_email(), "login attempt for unknown email");
        flash::error(&session, "User with this email does not exist").await;
        return Ok(Redirect::to(&back).into_response());
    };

    if !user.is_active || !user.verify_password(&form.password) {
        info!(user_id = %user.id, "failed login");
        flash::error(&session, "Email OR password is incorrect").await;
        return render_login(&state, &session, &form, next.as_deref()).await;
    }

    establish_session(&session, user.id).await?;
    if let Err(e) = state.store().touch_login(user.id).await {
        tracing::warn!(error = %e, user_id = %user.id, "failed to update login timestamp");
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Redirect::to(next.as_deref().unwrap_or("/")).into_response())
}

async fn render_register(
    state: &AppState,
    session: &Session,
    form: &RegistrationForm,
    errors: Option<&FormErrors>,
    next: Option<&str>,
) -> AppResult<Response> {
    let mut context = tera::Context::new();
    context.insert("form", form);
    context.insert("errors", &errors.cloned().unwrap_or_default());
    context.insert("next", &next);
    render(state, session, None, "user/register.html", context).await
}

/// Registration form.
///
/// GET /register/
async fn register_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
) -> AppResult<Response> {
    if current_user(&state, &session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let next = next_target(&query, None);
    render_register(
        &state,
        &session,
        &RegistrationForm::default(),
        None,
        next.as_deref(),
    )
    .await
}

/// Create an account and log in.
///
/// POST /register/
async fn register_submit(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
    data: FormData,
) -> AppResult<Response> {
    if current_user(&state, &session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let next = next_target(&query, Some(&data));
    let back = with_next(REGISTER_PATH, next.as_deref());
    if let Err(response) = check_token(&session, &data, &back).await {
        return Ok(response);
    }

    let form = RegistrationForm::from_data(&data);
    let input = match form.clean(state.store()).await? {
        Ok(input) => input,
        Err(errors) => {
            flash::error(&session, "An error has occurred with registration").await;
            return render_register(&state, &session, &form, Some(&errors), next.as_deref())
                .await;
        }
    };

    let user: User = state.store().create_user(input).await?;
    info!(user_id = %user.id, "user registered");

    establish_session(&session, user.id).await?;
    if let Err(e) = state.store().touch_login(user.id).await {
        tracing::warn!(error = %e, user_id = %user.id, "failed to update login timestamp");
    }
    flash::success(&session, "Account successfully created!").await;

    Ok(Redirect::to(next.as_deref().unwrap_or("/")).into_response())
}

/// Logout handler.
///
/// GET /logout/
async fn logout(session: Session) -> AppResult<Response> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();

    session
        .flush()
        .await
        .map_err(|e| anyhow::anyhow!("failed to flush session: {e}"))?;

    if let Some(user_id) = user_id {
        info!(%user_id, "user logged out");
    }
    Ok(Redirect::to("/").into_response())
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/", get(login_form).post(login_submit))
        .route("/register/", get(register_form).post(register_submit))
        .route("/logout/", get(logout))
}
