use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Redirect;
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Form};
use crate::forum::likes::{cast_vote, LikeTarget, Vote};
use crate::routes::posts::parse_id;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LikeForm {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub comment_id: Option<String>,
    #[serde(default)]
    pub is_like: Option<String>,
}

impl LikeForm {
    /// A comment id wins when both ids are present.
    fn target(&self) -> Option<LikeTarget> {
        if let Some(id) = parse_id(self.comment_id.as_deref()) {
            return Some(LikeTarget::Comment(id));
        }
        parse_id(self.post_id.as_deref()).map(LikeTarget::Post)
    }
}

/// Path and query of `referer` when it points back at `host`.
fn same_site_path(referer: &str, host: &str) -> Option<String> {
    let url = Url::parse(referer).ok()?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", url.host_str()?, port),
        None => url.host_str()?.to_string(),
    };
    if !authority.eq_ignore_ascii_case(host) {
        return None;
    }
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}

fn back_to(headers: &HeaderMap) -> String {
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    match (referer, host) {
        (Some(referer), Some(host)) => same_site_path(referer, host).unwrap_or_else(|| "/".into()),
        _ => "/".into(),
    }
}

/// POST /like — record a like or dislike, then return to the referring page
pub async fn vote(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Form(form): Form<LikeForm>,
) -> AppResult<Redirect> {
    let target = form.target();
    let vote = form.is_like.as_deref().and_then(Vote::from_flag);
    let (Some(target), Some(vote)) = (target, vote) else {
        return Err(AppError::BadRequest(
            "Invalid post/comment ID or like value".into(),
        ));
    };

    let conn = state.db.get()?;
    cast_vote(&conn, user.id, target, vote)?;
    Ok(Redirect::to(&back_to(&headers)))
}
