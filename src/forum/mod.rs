//! Forum content: posts, comments, categories and votes.
//!
//! Text is HTML-escaped before it is stored, so stored titles and bodies are
//! safe to emit into a page verbatim.

pub mod categories;
pub mod comments;
pub mod likes;
pub mod posts;

use crate::error::AppError;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_POST_CHARS: usize = 1000;
pub const MAX_COMMENT_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl From<ForumError> for AppError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::NotFound(msg) => AppError::NotFound(msg.to_string()),
            ForumError::Forbidden(msg) => AppError::Forbidden(msg.to_string()),
            ForumError::Invalid(msg) => AppError::BadRequest(msg),
            ForumError::Pool(e) => AppError::Pool(e),
            ForumError::Sql(e) => AppError::Database(e),
        }
    }
}

/// Trim and escape user text for storage. Length is checked on the trimmed
/// input, before escaping, so entity expansion never counts against the user.
pub fn clean_text(raw: &str, max_chars: usize) -> Result<String, TextError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TextError::Empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(TextError::TooLong);
    }
    Ok(html_escape::encode_safe(trimmed).into_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextError {
    Empty,
    TooLong,
}
