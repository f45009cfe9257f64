use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::auth::accounts::{self, AccountError};
use crate::auth::session;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Form};
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template, Default)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub viewer: Option<CurrentUser>,
    pub error: Option<String>,
    pub email: String,
    pub username: String,
}

#[derive(Template, Default)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<CurrentUser>,
    pub error: Option<String>,
    pub email: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// -- Registration --

/// GET /register
pub async fn register_page() -> Html<RegisterTemplate> {
    Html(RegisterTemplate::default())
}

/// POST /register — create the account, then send the user to log in
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let email = form.email.trim();
    let username = form.username.trim();

    match accounts::register(
        &state.db,
        state.config.auth.bcrypt_cost,
        email,
        username,
        &form.password,
    ) {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(err) => match err.form_message() {
            Some(message) => Ok(Html(RegisterTemplate {
                viewer: None,
                error: Some(message),
                email: email.to_string(),
                username: username.to_string(),
            })
            .into_response()),
            None => Err(err.into()),
        },
    }
}

// -- Login --

/// GET /login
pub async fn login_page() -> Html<LoginTemplate> {
    Html(LoginTemplate::default())
}

/// POST /login — verify credentials, start a session and set the cookie
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let email = form.email.trim();

    let user = match accounts::authenticate(&state.db, email, &form.password) {
        Ok(user) => user,
        Err(err @ (AccountError::Invalid(_) | AccountError::InvalidCredentials)) => {
            return Ok(Html(LoginTemplate {
                viewer: None,
                error: Some(err.to_string()),
                email: email.to_string(),
            })
            .into_response());
        }
        Err(err) => return Err(err.into()),
    };

    let new_session = session::create_session(&state.db, user.id, state.config.auth.session_hours)
        .map_err(|e| AppError::Internal(format!("Failed to create session: {}", e)))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (
                header::SET_COOKIE,
                session::session_cookie(&state.config.auth.cookie_name, &new_session),
            ),
        ],
    )
        .into_response())
}

// -- Logout handler --

/// POST /logout — delete session, clear the cookie and go home
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = session::cookie_value(&headers, cookie_name) {
        if let Err(e) = session::invalidate_session(&state.db, token) {
            tracing::error!("Failed to delete session on logout: {}", e);
        }
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, session::clear_session_cookie(cookie_name)),
        ],
    )
        .into_response())
}
