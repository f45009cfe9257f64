use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Form, MaybeUser, Query};
use crate::forum::categories::list_categories;
use crate::forum::comments::list_comments;
use crate::forum::likes::{current_vote, LikeTarget};
use crate::forum::posts::{self, find_post};
use crate::forum::ForumError;
use crate::routes::home::Html;
use crate::routes::views::{CategoryOption, CommentCard, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/create_post.html")]
pub struct CreatePostTemplate {
    pub viewer: Option<CurrentUser>,
    pub error: Option<String>,
    pub title: String,
    pub content: String,
    pub categories: Vec<CategoryOption>,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub viewer: Option<CurrentUser>,
    pub post: PostCard,
    pub comments: Vec<CommentCard>,
}

/// Parse a positive row id from a query or form value.
pub(crate) fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Fields of the new-post form. Category checkboxes repeat the
/// `category_id` key, so the body is read as raw pairs.
#[derive(Debug, Default, PartialEq)]
struct NewPost {
    title: String,
    content: String,
    category_ids: Vec<i64>,
    /// A `category_id` value that was not a number
    bad_category: bool,
}

impl NewPost {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = NewPost::default();
        for (key, value) in pairs {
            match key.as_str() {
                "title" => form.title = value,
                "content" => form.content = value,
                "category_id" => match value.trim().parse::<i64>() {
                    Ok(id) => form.category_ids.push(id),
                    Err(_) => form.bad_category = true,
                },
                _ => {}
            }
        }
        form
    }
}

/// GET /create_post
pub async fn create_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let categories = CategoryOption::list(list_categories(&conn)?, &[]);
    Ok(Html(CreatePostTemplate {
        viewer: Some(user),
        error: None,
        title: String::new(),
        content: String::new(),
        categories,
    })
    .into_response())
}

/// POST /create_post — validation failures re-render the form with the
/// entered values and an inline message
pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = NewPost::from_pairs(pairs);
    let mut conn = state.db.get()?;

    let result = if form.bad_category {
        Err(ForumError::Invalid("Please select a valid category.".to_string()))
    } else {
        posts::create_post(&mut conn, user.id, &form.title, &form.content, &form.category_ids)
    };

    match result {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(ForumError::Invalid(message)) => {
            let categories = CategoryOption::list(list_categories(&conn)?, &form.category_ids);
            Ok(Html(CreatePostTemplate {
                viewer: Some(user),
                error: Some(message),
                title: form.title,
                content: form.content,
                categories,
            })
            .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Deserialize)]
pub struct PostQuery {
    pub id: Option<String>,
}

/// GET /post?id=N — a post with its comments
pub async fn view_post(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<PostQuery>,
) -> AppResult<Response> {
    let post_id = parse_id(query.id.as_deref())
        .ok_or_else(|| AppError::BadRequest("The post ID provided is not valid".into()))?;

    let conn = state.db.get()?;
    let post = find_post(&conn, post_id)?
        .ok_or_else(|| AppError::NotFound("The post you're looking for doesn't exist".into()))?;

    let vote_on = |target| match &viewer {
        Some(user) => current_vote(&conn, user.id, target),
        None => Ok(None),
    };

    let post_vote = vote_on(LikeTarget::Post(post.id))?;
    let mut comments = Vec::new();
    for comment in list_comments(&conn, post.id)? {
        let vote = vote_on(LikeTarget::Comment(comment.id))?;
        comments.push(CommentCard::new(comment, viewer.as_ref(), vote));
    }
    let post = PostCard::new(post, viewer.as_ref(), post_vote);

    Ok(Html(PostTemplate {
        viewer,
        post,
        comments,
    })
    .into_response())
}

#[derive(Deserialize)]
pub struct DeletePostForm {
    #[serde(default)]
    pub post_id: Option<String>,
}

/// POST /delete_post
pub async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<DeletePostForm>,
) -> AppResult<Redirect> {
    let post_id = parse_id(form.post_id.as_deref())
        .ok_or_else(|| AppError::BadRequest("The post ID provided is not valid".into()))?;

    let conn = state.db.get()?;
    posts::delete_post(&conn, post_id, user.id)?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_id_accepts_only_positive_integers() {
        assert_eq!(parse_id(Some("12")), Some(12));
        assert_eq!(parse_id(Some(" 3 ")), Some(3));
        assert_eq!(parse_id(Some("0")), None);
        assert_eq!(parse_id(Some("-4")), None);
        assert_eq!(parse_id(Some("x")), None);
        assert_eq!(parse_id(None), None);
    }

    #[test]
    fn repeated_category_ids_are_collected() {
        let form = NewPost::from_pairs(pairs(&[
            ("title", "Hi"),
            ("category_id", "1"),
            ("content", "Hello"),
            ("category_id", "4"),
        ]));
        assert_eq!(form.title, "Hi");
        assert_eq!(form.content, "Hello");
        assert_eq!(form.category_ids, vec![1, 4]);
        assert!(!form.bad_category);
    }

    #[test]
    fn non_numeric_category_is_flagged() {
        let form = NewPost::from_pairs(pairs(&[("category_id", "rex")]));
        assert!(form.category_ids.is_empty());
        assert!(form.bad_category);
    }
}
