use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser, Query};
use crate::forum::categories::{find_category, list_categories};
use crate::forum::likes::{current_vote, LikeTarget};
use crate::forum::posts::{list_posts, PostFilter};
use crate::routes::views::{CategoryOption, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub viewer: Option<CurrentUser>,
    pub posts: Vec<PostCard>,
    pub categories: Vec<CategoryOption>,
    pub filter: String,
    pub heading: String,
    /// No filter or category is narrowing the listing
    pub listing_all: bool,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => AppError::Template(e).into_response(),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct HomeQuery {
    pub category_id: Option<String>,
    pub filter: Option<String>,
}

/// Resolve the listing filter from the query string. `my` and `liked` need a
/// signed-in viewer and take precedence over a category.
fn resolve_filter(
    query: &HomeQuery,
    viewer: Option<&CurrentUser>,
) -> Result<Result<PostFilter, Redirect>, AppError> {
    match query.filter.as_deref() {
        Some(f @ ("my" | "liked")) => {
            let Some(user) = viewer else {
                return Ok(Err(Redirect::to("/login")));
            };
            return Ok(Ok(if f == "my" {
                PostFilter::Mine(user.id)
            } else {
                PostFilter::Liked(user.id)
            }));
        }
        _ => {}
    }

    match query.category_id.as_deref().map(str::trim) {
        None | Some("") => Ok(Ok(PostFilter::All)),
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(|id| Ok(PostFilter::Category(id)))
            .ok_or_else(|| AppError::BadRequest("The category ID provided is not valid".into())),
    }
}

/// GET / — list posts, optionally filtered
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<HomeQuery>,
) -> AppResult<Response> {
    let filter = match resolve_filter(&query, viewer.as_ref())? {
        Ok(filter) => filter,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let conn = state.db.get()?;

    let heading = match filter {
        PostFilter::All => "All posts".to_string(),
        PostFilter::Mine(_) => "My posts".to_string(),
        PostFilter::Liked(_) => "Liked posts".to_string(),
        PostFilter::Category(id) => match find_category(&conn, id)? {
            Some(category) => category.name,
            None => return Err(AppError::NotFound("That category doesn't exist".into())),
        },
    };

    let mut posts = Vec::new();
    for post in list_posts(&conn, filter)? {
        let vote = match &viewer {
            Some(user) => current_vote(&conn, user.id, LikeTarget::Post(post.id))?,
            None => None,
        };
        posts.push(PostCard::new(post, viewer.as_ref(), vote));
    }

    let listing_all = filter == PostFilter::All;
    let selected: Vec<i64> = match filter {
        PostFilter::Category(id) => vec![id],
        _ => Vec::new(),
    };
    let categories = CategoryOption::list(list_categories(&conn)?, &selected);

    let filter = match filter {
        PostFilter::Mine(_) => "my",
        PostFilter::Liked(_) => "liked",
        _ => "",
    }
    .to_string();

    Ok(Html(HomeTemplate {
        viewer,
        posts,
        categories,
        filter,
        heading,
        listing_all,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(category_id: Option<&str>, filter: Option<&str>) -> HomeQuery {
        HomeQuery {
            category_id: category_id.map(String::from),
            filter: filter.map(String::from),
        }
    }

    fn alice() -> CurrentUser {
        CurrentUser {
            id: 7,
            username: "alice".into(),
        }
    }

    #[test]
    fn no_params_lists_everything() {
        let f = resolve_filter(&query(None, None), None).unwrap().unwrap();
        assert_eq!(f, PostFilter::All);
        let f = resolve_filter(&query(Some(""), Some("")), None).unwrap().unwrap();
        assert_eq!(f, PostFilter::All);
    }

    #[test]
    fn personal_filters_need_a_viewer() {
        assert!(resolve_filter(&query(None, Some("my")), None).unwrap().is_err());
        assert!(resolve_filter(&query(None, Some("liked")), None).unwrap().is_err());

        let user = alice();
        assert_eq!(
            resolve_filter(&query(None, Some("my")), Some(&user)).unwrap().unwrap(),
            PostFilter::Mine(7)
        );
        assert_eq!(
            resolve_filter(&query(Some("3"), Some("liked")), Some(&user))
                .unwrap()
                .unwrap(),
            PostFilter::Liked(7)
        );
    }

    #[test]
    fn category_must_be_a_positive_integer() {
        assert_eq!(
            resolve_filter(&query(Some("3"), None), None).unwrap().unwrap(),
            PostFilter::Category(3)
        );
        assert!(resolve_filter(&query(Some("abc"), None), None).is_err());
        assert!(resolve_filter(&query(Some("-1"), None), None).is_err());
    }
}
