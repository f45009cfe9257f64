use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::db::models::Session;
use crate::db::timestamp;
use crate::extractors::CurrentUser;
use crate::state::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Create a new session for a user, replacing any session the user already had.
pub fn create_session(pool: &DbPool, user_id: i64, hours: u64) -> Result<Session, SessionError> {
    let mut conn = pool.get()?;
    let token = generate_token();

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
    let expires_at = tx.query_row(
        "INSERT INTO sessions (user_id, session_token, expires_at)
         VALUES (?1, ?2, datetime('now', ?3))
         RETURNING expires_at",
        params![user_id, token, format!("+{} hours", hours)],
        |row| timestamp::column(row, 0),
    )?;
    tx.commit()?;

    Ok(Session {
        token,
        expires_at,
    })
}

/// Look up the live session for a token.
pub fn lookup_session(pool: &DbPool, token: &str) -> Result<Option<CurrentUser>, SessionError> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            "SELECT u.id, u.username FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.session_token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(CurrentUser {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Resolve the session token to its user. Storage failures resolve to anonymous.
pub fn resolve_current_user(pool: &DbPool, token: Option<&str>) -> Option<CurrentUser> {
    let token = token?;
    match lookup_session(pool, token) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Session lookup failed, treating request as anonymous: {}", e);
            None
        }
    }
}

/// Delete a session by token. Deleting an unknown token is a no-op.
pub fn invalidate_session(pool: &DbPool, token: &str) -> Result<(), SessionError> {
    let conn = pool.get()?;
    conn.execute(
        "DELETE FROM sessions WHERE session_token = ?1",
        params![token],
    )?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// -- Cookie helpers --

pub fn session_cookie(name: &str, session: &Session) -> String {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Expires={}; Max-Age={}",
        name,
        session.token,
        http_date(&session.expires_at),
        max_age
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0",
        name
    )
}

fn http_date(ts: &DateTime<Utc>) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Read a cookie value from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{insert_user, test_pool};
    use axum::http::HeaderValue;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn session_authenticates_its_owner_only() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let bob = insert_user(&pool, "bob");

        let a = create_session(&pool, alice, 24).unwrap();
        let b = create_session(&pool, bob, 24).unwrap();

        let resolved = resolve_current_user(&pool, Some(&a.token)).unwrap();
        assert_eq!(resolved.id, alice);
        assert_eq!(resolved.username, "alice");

        let resolved = resolve_current_user(&pool, Some(&b.token)).unwrap();
        assert_eq!(resolved.id, bob);
    }

    #[test]
    fn session_expires_roughly_a_day_out() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let session = create_session(&pool, alice, 24).unwrap();
        let hours = (session.expires_at - Utc::now()).num_minutes() as f64 / 60.0;
        assert!((23.9..=24.1).contains(&hours), "got {hours}");
    }

    #[test]
    fn new_login_supersedes_previous_session() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");

        let first = create_session(&pool, alice, 24).unwrap();
        let second = create_session(&pool, alice, 24).unwrap();

        assert!(resolve_current_user(&pool, Some(&first.token)).is_none());
        assert!(resolve_current_user(&pool, Some(&second.token)).is_some());

        let conn = pool.get().unwrap();
        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE user_id = ?1",
                params![alice],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn invalidated_token_resolves_to_anonymous() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let session = create_session(&pool, alice, 24).unwrap();

        invalidate_session(&pool, &session.token).unwrap();
        assert!(resolve_current_user(&pool, Some(&session.token)).is_none());

        // second delete is a no-op
        invalidate_session(&pool, &session.token).unwrap();
    }

    #[test]
    fn expired_session_is_inert() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO sessions (user_id, session_token, expires_at)
             VALUES (?1, 'stale', datetime('now', '-1 hours'))",
            params![alice],
        )
        .unwrap();

        assert!(resolve_current_user(&pool, Some("stale")).is_none());
        assert!(resolve_current_user(&pool, None).is_none());
        assert!(resolve_current_user(&pool, Some("never-issued")).is_none());
    }

    #[test]
    fn storage_failure_fails_closed() {
        let (_tmp, pool) = test_pool();
        let alice = insert_user(&pool, "alice");
        let session = create_session(&pool, alice, 24).unwrap();

        pool.get()
            .unwrap()
            .execute_batch("DROP TABLE sessions;")
            .unwrap();

        assert!(lookup_session(&pool, &session.token).is_err());
        assert!(resolve_current_user(&pool, Some(&session.token)).is_none());
    }

    #[test]
    fn session_cookie_is_http_only_and_site_wide() {
        let session = Session {
            token: "abc".to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(24),
        };
        let cookie = session_cookie("session_token", &session);
        assert!(cookie.starts_with("session_token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Expires="));
        assert!(cookie.contains("GMT"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie("session_token");
        assert!(cookie.starts_with("session_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=tok123; other=x"),
        );
        assert_eq!(cookie_value(&headers, "session_token"), Some("tok123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token="));
        assert_eq!(cookie_value(&headers, "session_token"), None);
    }
}
