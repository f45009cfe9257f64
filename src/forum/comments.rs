use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Comment;
use crate::db::timestamp;
use crate::forum::{clean_text, ForumError, TextError, MAX_COMMENT_CHARS};

fn post_exists(conn: &Connection, post_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
        params![post_id],
        |row| row.get(0),
    )
}

/// Comments on a post, oldest first, with their vote counts.
pub fn list_comments(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at,
                (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id AND l.is_like = 1),
                (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id AND l.is_like = 0)
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.id ASC",
    )?;
    let rows = stmt.query_map(params![post_id], |row| {
        Ok(Comment {
            id: row.get(0)?,
            post_id: row.get(1)?,
            user_id: row.get(2)?,
            author: row.get(3)?,
            content: row.get(4)?,
            created_at: timestamp::column(row, 5)?,
            like_count: row.get(6)?,
            dislike_count: row.get(7)?,
        })
    })?;
    rows.collect()
}

pub fn add_comment(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    content: &str,
) -> Result<i64, ForumError> {
    let content = clean_text(content, MAX_COMMENT_CHARS).map_err(|e| match e {
        TextError::Empty => {
            ForumError::Invalid("Please provide valid post ID and comment content".to_string())
        }
        TextError::TooLong => {
            ForumError::Invalid("Comments must be 500 characters or less".to_string())
        }
    })?;

    if !post_exists(conn, post_id)? {
        return Err(ForumError::NotFound(
            "The post you're trying to comment on doesn't exist",
        ));
    }

    conn.execute(
        "INSERT INTO comments (post_id, user_id, content) VALUES (?1, ?2, ?3)",
        params![post_id, user_id, content],
    )?;
    let comment_id = conn.last_insert_rowid();
    tracing::info!(comment_id, post_id, user_id, "Comment added");
    Ok(comment_id)
}

/// Delete a comment on behalf of `actor_id`. Returns the post it belonged to.
pub fn delete_comment(conn: &Connection, comment_id: i64, actor_id: i64) -> Result<i64, ForumError> {
    let row: Option<(i64, i64)> = conn
        .query_row(
            "SELECT user_id, post_id FROM comments WHERE id = ?1",
            params![comment_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (owner, post_id) = row.ok_or(ForumError::NotFound(
        "The comment you're trying to delete doesn't exist",
    ))?;

    if owner != actor_id {
        tracing::warn!(comment_id, actor_id, "Refused to delete another user's comment");
        return Err(ForumError::Forbidden("You can only delete your own comments"));
    }

    conn.execute("DELETE FROM comments WHERE id = ?1", params![comment_id])?;
    tracing::info!(comment_id, actor_id, "Comment deleted");
    Ok(post_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{insert_user, test_pool};

    fn insert_post(conn: &Connection, user_id: i64) -> i64 {
        conn.execute(
            "INSERT INTO posts (user_id, title, content) VALUES (?1, 'Hi', 'Hello')",
            params![user_id],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn comments_are_listed_oldest_first() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let bob = insert_user(&pool, "bob");
        let conn = pool.get().unwrap();
        let post = insert_post(&conn, alice);

        let first = add_comment(&conn, alice, post, "first").unwrap();
        let second = add_comment(&conn, bob, post, "<i>second</i>").unwrap();

        let comments = list_comments(&conn, post).unwrap();
        assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(comments[1].author, "bob");
        assert!(comments[1].content.starts_with("&lt;i&gt;second"));
        assert!(!comments[1].content.contains('<'));
        assert_eq!(comments[0].like_count, 0);
    }

    #[test]
    fn comment_bounds() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let conn = pool.get().unwrap();
        let post = insert_post(&conn, alice);

        assert!(matches!(
            add_comment(&conn, alice, post, "   "),
            Err(ForumError::Invalid(_))
        ));
        assert!(add_comment(&conn, alice, post, &"c".repeat(500)).is_ok());
        assert_eq!(
            add_comment(&conn, alice, post, &"c".repeat(501))
                .unwrap_err()
                .to_string(),
            "Comments must be 500 characters or less"
        );
    }

    #[test]
    fn comment_on_missing_post_is_not_found() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let conn = pool.get().unwrap();
        assert!(matches!(
            add_comment(&conn, alice, 404, "hello"),
            Err(ForumError::NotFound(_))
        ));
    }

    #[test]
    fn only_owner_may_delete_comment() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let bob = insert_user(&pool, "bob");
        let conn = pool.get().unwrap();
        let post = insert_post(&conn, alice);
        let comment = add_comment(&conn, alice, post, "mine").unwrap();

        assert!(matches!(
            delete_comment(&conn, comment, bob),
            Err(ForumError::Forbidden(_))
        ));
        assert_eq!(list_comments(&conn, post).unwrap().len(), 1);

        assert_eq!(delete_comment(&conn, comment, alice).unwrap(), post);
        assert!(list_comments(&conn, post).unwrap().is_empty());
        assert!(matches!(
            delete_comment(&conn, comment, alice),
            Err(ForumError::NotFound(_))
        ));
    }
}
