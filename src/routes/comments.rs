use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Form};
use crate::forum::comments;
use crate::routes::posts::parse_id;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// POST /comment — add a comment and return to the post
pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    let post_id = parse_id(form.post_id.as_deref()).ok_or_else(|| {
        AppError::BadRequest("Please provide valid post ID and comment content".into())
    })?;

    let conn = state.db.get()?;
    comments::add_comment(&conn, user.id, post_id, &form.content)?;
    Ok(Redirect::to(&format!("/post?id={}", post_id)))
}

#[derive(Deserialize)]
pub struct DeleteCommentForm {
    #[serde(default)]
    pub comment_id: Option<String>,
}

/// POST /delete_comment
pub async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<DeleteCommentForm>,
) -> AppResult<Redirect> {
    let comment_id = parse_id(form.comment_id.as_deref())
        .ok_or_else(|| AppError::BadRequest("The comment ID provided is not valid".into()))?;

    let conn = state.db.get()?;
    let post_id = comments::delete_comment(&conn, comment_id, user.id)?;
    Ok(Redirect::to(&format!("/post?id={}", post_id)))
}
