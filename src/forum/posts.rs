use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::Post;
use crate::db::timestamp;
use crate::forum::categories::{find_category, names_for_post};
use crate::forum::{clean_text, ForumError, TextError, MAX_POST_CHARS, MAX_TITLE_CHARS};

const POST_SELECT: &str = "
    SELECT p.id, p.user_id, u.username, p.title, p.content, p.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id AND l.is_like = 1),
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id AND l.is_like = 0)
    FROM posts p
    JOIN users u ON u.id = p.user_id";

const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

/// Which posts the home page lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Category(i64),
    /// Posts written by the given user.
    Mine(i64),
    /// Posts the given user has liked (not disliked).
    Liked(i64),
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: timestamp::column(row, 5)?,
        like_count: row.get(6)?,
        dislike_count: row.get(7)?,
        categories: Vec::new(),
    })
}

pub fn list_posts(conn: &Connection, filter: PostFilter) -> rusqlite::Result<Vec<Post>> {
    let (sql, arg) = match filter {
        PostFilter::All => (format!("{POST_SELECT} {NEWEST_FIRST}"), None),
        PostFilter::Category(id) => (
            format!(
                "{POST_SELECT}
                 JOIN post_categories pc ON pc.post_id = p.id
                 WHERE pc.category_id = ?1 {NEWEST_FIRST}"
            ),
            Some(id),
        ),
        PostFilter::Mine(user_id) => (
            format!("{POST_SELECT} WHERE p.user_id = ?1 {NEWEST_FIRST}"),
            Some(user_id),
        ),
        PostFilter::Liked(user_id) => (
            format!(
                "{POST_SELECT}
                 JOIN likes lk ON lk.post_id = p.id
                 WHERE lk.user_id = ?1 AND lk.is_like = 1 {NEWEST_FIRST}"
            ),
            Some(user_id),
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let mut posts = match arg {
        Some(id) => stmt
            .query_map(params![id], map_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt
            .query_map([], map_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };

    for post in &mut posts {
        post.categories = names_for_post(conn, post.id)?;
    }
    Ok(posts)
}

pub fn find_post(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    let post = conn
        .query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), params![id], map_post)
        .optional()?;

    match post {
        Some(mut post) => {
            post.categories = names_for_post(conn, post.id)?;
            Ok(Some(post))
        }
        None => Ok(None),
    }
}

/// Create a post filed under the given categories. The post row and its
/// category links are written in one transaction.
pub fn create_post(
    conn: &mut Connection,
    user_id: i64,
    title: &str,
    content: &str,
    category_ids: &[i64],
) -> Result<i64, ForumError> {
    let title = clean_text(title, MAX_TITLE_CHARS);
    let content = clean_text(content, MAX_POST_CHARS);

    let (title, content) = match (title, content) {
        _ if category_ids.is_empty() => {
            return Err(ForumError::Invalid(
                "Please select at least one category.".to_string(),
            ))
        }
        (Ok(title), Ok(content)) => (title, content),
        (Err(TextError::Empty), _) | (_, Err(TextError::Empty)) => {
            return Err(ForumError::Invalid("All fields are required.".to_string()))
        }
        _ => return Err(ForumError::Invalid("Title or content too long.".to_string())),
    };

    let mut ids = category_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    for id in &ids {
        if find_category(conn, *id)?.is_none() {
            return Err(ForumError::Invalid(
                "Please select a valid category.".to_string(),
            ));
        }
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO posts (user_id, title, content) VALUES (?1, ?2, ?3)",
        params![user_id, title, content],
    )?;
    let post_id = tx.last_insert_rowid();
    for id in &ids {
        tx.execute(
            "INSERT INTO post_categories (post_id, category_id) VALUES (?1, ?2)",
            params![post_id, id],
        )?;
    }
    tx.commit()?;

    tracing::info!(post_id, user_id, "Post created");
    Ok(post_id)
}

/// Delete a post on behalf of `actor_id`. Comments and votes go with it.
pub fn delete_post(conn: &Connection, post_id: i64, actor_id: i64) -> Result<(), ForumError> {
    let owner: Option<i64> = conn
        .query_row(
            "SELECT user_id FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        None => Err(ForumError::NotFound(
            "The post you're trying to delete doesn't exist",
        )),
        Some(owner) if owner != actor_id => {
            tracing::warn!(post_id, actor_id, "Refused to delete another user's post");
            Err(ForumError::Forbidden("You can only delete your own posts"))
        }
        Some(_) => {
            conn.execute("DELETE FROM posts WHERE id = ?1", params![post_id])?;
            tracing::info!(post_id, actor_id, "Post deleted");
            Ok(())
        }
    }
}
