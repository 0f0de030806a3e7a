//! The logged-in user's account page and profile editing.

use axum::Router;
use axum::extract::{OriginalUri, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::flash;
use crate::form::{FormData, FormErrors, ProfileForm, UserForm};
use crate::models::{Profile, User};
use crate::routes::helpers::{check_token, render, require_login};
use crate::state::AppState;

async fn load_profile(state: &AppState, user: &User) -> AppResult<Profile> {
    state
        .store()
        .find_profile_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {} has no profile", user.id)))
}

/// Current user's profile.
///
/// GET /account/
async fn account(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Response> {
    let user = match require_login(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let profile = load_profile(&state, &user).await?;

    let mut context = tera::Context::new();
    context.insert("profile", &profile);
    render(&state, &session, Some(&user), "user/account.html", context).await
}

async fn render_edit(
    state: &AppState,
    session: &Session,
    user: &User,
    user_form: &UserForm,
    profile_form: &ProfileForm,
    errors: Option<&FormErrors>,
) -> AppResult<Response> {
    let mut context = tera::Context::new();
    context.insert("user_form", user_form);
    context.insert("profile_form", profile_form);
    context.insert("errors", &errors.cloned().unwrap_or_default());
    render(state, session, Some(user), "user/profile_form.html", context).await
}

/// Edit form prefilled with the user's details.
///
/// GET /update_profile/
async fn update_form(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Response> {
    let user = match require_login(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let profile = load_profile(&state, &user).await?;
    render_edit(
        &state,
        &session,
        &user,
        &UserForm::from_user(&user),
        &ProfileForm::from_profile(&profile),
        None,
    )
    .await
}

/// Save user and profile changes.
///
/// POST /update_profile/
async fn update_submit(
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
    data: FormData,
) -> AppResult<Response> {
    let user = match require_login(&state, &session, &uri).await {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    if let Err(response) = check_token(&session, &data, uri.path()).await {
        return Ok(response);
    }

    let user_form = UserForm::from_data(&data);
    let profile_form = ProfileForm::from_data(&data);

    // The two forms are saved independently; only profile errors block the redirect
    let mut errors = match user_form.clean(state.store(), user.id).await? {
        Ok(user_input) => {
            state
                .store()
                .update_user(user.id, user_input)
                .await?
                .ok_or(AppError::NotFound)?;
            info!(user_id = %user.id, "user details updated");
            FormErrors::new()
        }
        Err(user_errors) => user_errors,
    };

    match profile_form.clean() {
        Ok(profile_input) => {
            state
                .store()
                .update_profile(user.id, profile_input)
                .await?
                .ok_or(AppError::NotFound)?;
            info!(user_id = %user.id, "profile updated");
            if errors.is_empty() {
                flash::success(&session, "Profile updated.").await;
            } else {
                flash::info(&session, "Profile updated. Your account details were not changed.")
                    .await;
            }
            Ok(Redirect::to("/account/").into_response())
        }
        Err(profile_errors) => {
            for (field, messages) in profile_errors.to_map() {
                for message in messages {
                    errors.add(&format!("{}{field}", ProfileForm::PREFIX), message);
                }
            }
            render_edit(&state, &session, &user, &user_form, &profile_form, Some(&errors)).await
        }
    }
}

/// Create the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/account/", get(account))
        .route("/update_profile/", get(update_form).post(update_submit))
}
