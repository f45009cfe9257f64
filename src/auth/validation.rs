//! Registration field rules. Each check returns the message shown on the form.

const MAX_EMAIL_LEN: usize = 254;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=20;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=50;

pub fn validate_email(email: &str) -> Result<(), String> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err("Please enter a valid email address.".to_string())
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN {
        return false;
    }
    if email.contains("..") || email.contains("@.") || email.contains(".@") {
        return false;
    }
    if email.starts_with('.') || email.ends_with('.') {
        return false;
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }

    // at least one internal dot with a non-empty first label
    match domain.split_once('.') {
        Some((first, rest)) => !first.is_empty() && !rest.is_empty(),
        None => false,
    }
}

pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < *USERNAME_LEN.start() {
        return Err("Username must be at least 3 characters long.".to_string());
    }
    if len > *USERNAME_LEN.end() {
        return Err("Username must be no more than 20 characters long.".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(
            "Username can only contain letters, numbers, underscores, and hyphens.".to_string(),
        );
    }
    Ok(())
}

/// Length is counted in bytes. bcrypt reads at most 72 bytes, so every
/// accepted password is hashed in full.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.len();
    if len < *PASSWORD_LEN.start() {
        return Err("Password must be at least 8 characters long.".to_string());
    }
    if len > *PASSWORD_LEN.end() {
        return Err("Password must be no more than 50 characters long.".to_string());
    }
    Ok(())
}

/// Run the registration checks in order, stopping at the first failure.
pub fn validate_registration(email: &str, username: &str, password: &str) -> Result<(), String> {
    if email.is_empty() || username.is_empty() || password.is_empty() {
        return Err("All fields are required.".to_string());
    }
    validate_email(email)?;
    validate_username(username)?;
    validate_password(password)
}
