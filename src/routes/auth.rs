use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::auth::{guard, handlers};
use crate::routes::method_not_allowed;
use crate::state::AppState;

/// Registration and login pages. Only reachable while signed out.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            get(handlers::register_page)
                .post(handlers::register)
                .fallback(method_not_allowed),
        )
        .route(
            "/login",
            get(handlers::login_page)
                .post(handlers::login)
                .fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn(guard::require_guest))
}
