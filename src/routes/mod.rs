pub mod assets;
pub mod auth;
pub mod comments;
pub mod home;
pub mod likes;
pub mod posts;
pub mod views;

use std::any::Any;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{guard, handlers};
use crate::error::{error_page, AppError};
use crate::state::AppState;

/// Fallback for unknown paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("The page you're looking for doesn't exist".into())
}

/// Fallback for a known path hit with the wrong method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Render a panicking handler as the generic 500 page. The panic payload is
/// logged, never shown.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "Handler panicked");
    error_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        "The server encountered an unexpected error",
    )
}

/// All forum routes, without the outer middleware stack.
pub fn router() -> Router<AppState> {
    let members = Router::new()
        .route(
            "/create_post",
            get(posts::create_post_page)
                .post(posts::create_post)
                .fallback(method_not_allowed),
        )
        .route(
            "/delete_post",
            post(posts::delete_post).fallback(method_not_allowed),
        )
        .route(
            "/comment",
            post(comments::add_comment).fallback(method_not_allowed),
        )
        .route(
            "/delete_comment",
            post(comments::delete_comment).fallback(method_not_allowed),
        )
        .route("/like", post(likes::vote).fallback(method_not_allowed))
        .route_layer(middleware::from_fn(guard::require_auth));

    Router::new()
        .route("/", get(home::index).fallback(method_not_allowed))
        .route("/post", get(posts::view_post).fallback(method_not_allowed))
        .route(
            "/logout",
            post(handlers::logout).fallback(method_not_allowed),
        )
        .route("/static/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(members)
        .fallback(not_found)
}

/// Wrap `router` in the request pipeline: panic recovery, then tracing, then
/// viewer resolution. Route-level guards run after these.
pub fn with_middleware(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::resolve_viewer,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// The complete application.
pub fn app(state: AppState) -> Router {
    with_middleware(router(), state)
}
