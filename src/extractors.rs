use std::convert::Infallible;

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::Redirect;
use serde::de::DeserializeOwned;

use crate::auth::session;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// The identity resolved for a request, stored in request extensions by
/// [`crate::auth::guard::resolve_viewer`]. `None` means anonymous.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<CurrentUser>);

impl Viewer {
    /// Use the identity resolved by the middleware chain, or resolve it now if
    /// the request did not pass through that stage.
    pub fn from_parts(parts: &Parts, state: &AppState) -> Self {
        if let Some(viewer) = parts.extensions.get::<Viewer>() {
            return viewer.clone();
        }
        let token = session::cookie_value(&parts.headers, &state.config.auth.cookie_name);
        Viewer(session::resolve_current_user(&state.db, token))
    }
}

/// Extractor that requires authentication.
/// Anonymous requests are redirected to the login page.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Viewer::from_parts(parts, state)
            .0
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Optional user extractor — returns None instead of redirecting when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(Viewer::from_parts(parts, state).0))
    }
}

/// `axum::Form` that rejects unreadable bodies with the HTML 400 page.
pub struct Form<T>(pub T);

impl<T, S> FromRequest<S> for Form<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Form(value) = axum::Form::<T>::from_request(req, state).await?;
        Ok(Form(value))
    }
}

/// `axum::extract::Query` that rejects malformed query strings with the HTML
/// 400 page.
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Query(value))
    }
}
