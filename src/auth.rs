//! Password hashing and role gates.

use crate::error::{AppError, AppResult};
use crate::model::{Role, User};
use crate::repo::users;
use crate::state::AppState;
use anyhow::Context;

pub fn hash_password(password: &str) -> AppResult<String> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST).context("password hashing failed")?;
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// The user bound to the session, if any. Deactivated accounts are
/// treated as logged out.
pub async fn current_user(state: &AppState, session_id: &str) -> AppResult<Option<User>> {
    let Some(user_id) = state.sessions().user_id(session_id) else {
        return Ok(None);
    };
    let user = users::find_by_id(state.pool(), user_id).await?;
    Ok(user.filter(|u| u.is_active))
}

pub async fn require_user(state: &AppState, session_id: &str) -> AppResult<User> {
    current_user(state, session_id)
        .await?
        .ok_or(AppError::LoginRequired)
}

/// Point-of-sale gate: any staff role.
pub async fn require_staff(state: &AppState, session_id: &str) -> AppResult<User> {
    let user = require_user(state, session_id).await?;
    if user.role.is_staff() {
        Ok(user)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Admin panel gate.
pub async fn require_admin(state: &AppState, session_id: &str) -> AppResult<User> {
    let user = require_user(state, session_id).await?;
    if user.role == Role::Admin {
        Ok(user)
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_passwords_verify() {
        let hash = hash_password("secreto123").unwrap();
        assert!(verify_password("secreto123", &hash));
        assert!(!verify_password("otro", &hash));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("whatever", "not-a-bcrypt-hash"));
    }
}
