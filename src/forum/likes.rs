//! Like/dislike votes. A user holds at most one vote per target; voting again
//! overwrites it in place.

use rusqlite::{params, Connection, OptionalExtension};

use crate::forum::ForumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post(i64),
    Comment(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    pub fn is_like(self) -> bool {
        matches!(self, Vote::Like)
    }

    /// Parse the form encoding: `1` is a like, `0` a dislike.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim() {
            "1" => Some(Vote::Like),
            "0" => Some(Vote::Dislike),
            _ => None,
        }
    }
}

fn target_exists(conn: &Connection, target: LikeTarget) -> rusqlite::Result<bool> {
    let (sql, id) = match target {
        LikeTarget::Post(id) => ("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)", id),
        LikeTarget::Comment(id) => ("SELECT EXISTS(SELECT 1 FROM comments WHERE id = ?1)", id),
    };
    conn.query_row(sql, params![id], |row| row.get(0))
}

/// Record `vote` for `user_id` on `target`, replacing any earlier vote.
pub fn cast_vote(
    conn: &Connection,
    user_id: i64,
    target: LikeTarget,
    vote: Vote,
) -> Result<(), ForumError> {
    if !target_exists(conn, target)? {
        return Err(ForumError::NotFound(match target {
            LikeTarget::Post(_) => "The post you're trying to like doesn't exist",
            LikeTarget::Comment(_) => "The comment you're trying to like doesn't exist",
        }));
    }

    match target {
        LikeTarget::Post(post_id) => conn.execute(
            "INSERT INTO likes (user_id, post_id, is_like) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, post_id) WHERE post_id IS NOT NULL
             DO UPDATE SET is_like = excluded.is_like",
            params![user_id, post_id, vote.is_like()],
        )?,
        LikeTarget::Comment(comment_id) => conn.execute(
            "INSERT INTO likes (user_id, comment_id, is_like) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, comment_id) WHERE comment_id IS NOT NULL
             DO UPDATE SET is_like = excluded.is_like",
            params![user_id, comment_id, vote.is_like()],
        )?,
    };

    tracing::debug!(user_id, ?target, ?vote, "Vote recorded");
    Ok(())
}

/// The vote `user_id` currently holds on `target`, if any.
pub fn current_vote(
    conn: &Connection,
    user_id: i64,
    target: LikeTarget,
) -> rusqlite::Result<Option<Vote>> {
    let (sql, id) = match target {
        LikeTarget::Post(id) => ("SELECT is_like FROM likes WHERE user_id = ?1 AND post_id = ?2", id),
        LikeTarget::Comment(id) => (
            "SELECT is_like FROM likes WHERE user_id = ?1 AND comment_id = ?2",
            id,
        ),
    };
    let flag: Option<bool> = conn
        .query_row(sql, params![user_id, id], |row| row.get(0))
        .optional()?;
    Ok(flag.map(|like| if like { Vote::Like } else { Vote::Dislike }))
}
