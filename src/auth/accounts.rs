use rusqlite::{params, OptionalExtension};

use crate::auth::{password, validation};
use crate::db::models::User;
use crate::error::AppError;
use crate::state::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// A field failed validation; the message is shown on the form.
    #[error("{0}")]
    Invalid(String),

    /// Email or username collides with an existing account. Which one is not revealed.
    #[error("Email or username already taken.")]
    Taken,

    /// Unknown email or wrong password. Which one is not revealed.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl AccountError {
    /// The message to render inline, if this is a user-correctable rejection.
    pub fn form_message(&self) -> Option<String> {
        match self {
            AccountError::Invalid(_) | AccountError::Taken | AccountError::InvalidCredentials => {
                Some(self.to_string())
            }
            _ => None,
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Pool(e) => AppError::Pool(e),
            AccountError::Sql(e) => AppError::Database(e),
            AccountError::Hash(e) => AppError::Hash(e),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// Create an account. Returns the new user id.
pub fn register(
    pool: &DbPool,
    bcrypt_cost: u32,
    email: &str,
    username: &str,
    plain_password: &str,
) -> Result<i64, AccountError> {
    validation::validate_registration(email, username, plain_password)
        .map_err(AccountError::Invalid)?;

    let conn = pool.get()?;
    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1 OR username = ?2",
        params![email, username],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Err(AccountError::Taken);
    }

    let hash = password::hash_password(plain_password, bcrypt_cost)?;

    match conn.execute(
        "INSERT INTO users (email, username, password_hash) VALUES (?1, ?2, ?3)",
        params![email, username, hash],
    ) {
        Ok(_) => {}
        // lost a race with a concurrent registration
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AccountError::Taken);
        }
        Err(e) => return Err(e.into()),
    }

    let user_id = conn.last_insert_rowid();
    tracing::info!(user_id, "Registered new user");
    Ok(user_id)
}

pub fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AccountError> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            "SELECT id, username, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Check credentials. Unknown email and wrong password yield the same rejection.
pub fn authenticate(pool: &DbPool, email: &str, plain_password: &str) -> Result<User, AccountError> {
    if email.is_empty() || plain_password.is_empty() {
        return Err(AccountError::Invalid("All fields are required.".to_string()));
    }

    let user = find_user_by_email(pool, email)?.ok_or(AccountError::InvalidCredentials)?;

    if !password::verify_password(plain_password, &user.password_hash)? {
        return Err(AccountError::InvalidCredentials);
    }

    Ok(user)
}
