//! Contact form delivery.

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::post;
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::flash;
use crate::form::{ContactForm, FormData};
use crate::routes::helpers::{check_token, current_user, render};
use crate::state::AppState;

/// The page hosting the contact form.
const PROFILE_PATH: &str = "/profile/";

/// Email the site owner.
///
/// POST /send_email/
async fn send_email(
    State(state): State<AppState>,
    session: Session,
    data: FormData,
) -> AppResult<Response> {
    if let Err(response) = check_token(&session, &data, PROFILE_PATH).await {
        return Ok(response);
    }

    let form = match ContactForm::from_data(&data).clean() {
        Ok(form) => form,
        Err(errors) => {
            let fields: Vec<String> = errors.to_map().into_keys().collect();
            info!(?fields, "rejected contact form");
            flash::error(&session, "Please fill in every field with valid values.").await;
            return Ok(Redirect::to(PROFILE_PATH).into_response());
        }
    };

    let Some(mailer) = state.mailer() else {
        return Err(AppError::Internal(anyhow::anyhow!(
            "contact form submitted but email is not configured"
        )));
    };

    let mut context = tera::Context::new();
    context.insert("name", &form.name);
    context.insert("email", &form.email);
    context.insert("subject", &form.subject);
    context.insert("message", &form.message);
    context.insert("site_name", state.site_name());
    let body = state.theme().render("email/contact.txt", &context)?;

    mailer
        .send(state.contact_email(), &form.subject, &body)
        .await
        .context("failed to deliver contact email")?;
    info!(from = %form.email, to = %state.contact_email(), "contact email sent");

    let user = current_user(&state, &session).await?;
    let mut context = tera::Context::new();
    context.insert("name", &form.name);
    render(&state, &session, user.as_ref(), "blog/email_sent.html", context).await
}

/// Create the contact router.
pub fn router() -> Router<AppState> {
    Router::new().route("/send_email/", post(send_email))
}
