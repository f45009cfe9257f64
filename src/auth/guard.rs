//! Request interceptors for the router's middleware chain.
//!
//! `resolve_viewer` always continues; `require_auth` and `require_guest`
//! either continue or short-circuit with a redirect.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::session;
use crate::extractors::Viewer;
use crate::state::AppState;

/// Resolve the session cookie once and record the viewer for later stages.
pub async fn resolve_viewer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = session::cookie_value(req.headers(), &state.config.auth.cookie_name);
    let viewer = Viewer(session::resolve_current_user(&state.db, token));
    req.extensions_mut().insert(viewer);
    next.run(req).await
}

fn viewer_of(req: &Request) -> Option<&Viewer> {
    req.extensions().get::<Viewer>()
}

/// Anonymous requests are sent to the login page.
pub async fn require_auth(req: Request, next: Next) -> Response {
    match viewer_of(&req) {
        Some(Viewer(Some(_))) => next.run(req).await,
        _ => Redirect::to("/login").into_response(),
    }
}

/// Signed-in requests are sent home instead of re-registering or logging in again.
pub async fn require_guest(req: Request, next: Next) -> Response {
    match viewer_of(&req) {
        Some(Viewer(Some(_))) => Redirect::to("/").into_response(),
        _ => next.run(req).await,
    }
}
