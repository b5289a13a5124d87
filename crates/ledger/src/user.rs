//! Member accounts: registration, login and removal.
//!
//! Everything here is a pure function over the user collection. Callers
//! persist the returned collection themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pointswap_core::{DomainError, DomainResult, Entity, UserId, position_of};

/// Unit of value tracked per balance.
pub type Points = u64;

/// Points credited to every new account.
pub const DEFAULT_WELCOME_BONUS: Points = 100;

/// Registering under this name (any letter case) yields an admin account.
pub const ADMIN_USERNAME: &str = "admin";

/// A member account.
///
/// Passwords are plain text; this is a closed-community toy ledger, not an
/// identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub balance: Points,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl User {
    /// Case-insensitive username comparison.
    pub fn has_username(&self, username: &str) -> bool {
        same_username(&self.username, username)
    }

    fn with_balance(&self, balance: Points) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }
}

pub(crate) fn same_username(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// True iff `username` designates the admin account.
pub fn is_admin_username(username: &str) -> bool {
    same_username(username, ADMIN_USERNAME)
}

/// Replace the balance of one user, leaving every other record untouched.
pub(crate) fn set_balance(users: &[User], user_id: &UserId, balance: Points) -> Vec<User> {
    users
        .iter()
        .map(|u| if &u.id == user_id { u.with_balance(balance) } else { u.clone() })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────────────────────────

/// Command: register a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUser {
    pub user_id: UserId,
    pub username: String,
    pub password: String,
    pub welcome_bonus: Points,
    pub occurred_at: DateTime<Utc>,
}

impl RegisterUser {
    /// Stamp a registration with a fresh id and the current time.
    pub fn now(username: impl Into<String>, password: impl Into<String>, welcome_bonus: Points) -> Self {
        Self {
            user_id: UserId::generate("u"),
            username: username.into(),
            password: password.into(),
            welcome_bonus,
            occurred_at: Utc::now(),
        }
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub users: Vec<User>,
    pub user: User,
}

/// Validate and append a new account.
pub fn register(users: &[User], cmd: &RegisterUser) -> DomainResult<Registration> {
    let username = cmd.username.trim();

    if username.is_empty() || cmd.password.is_empty() {
        return Err(DomainError::validation("username and password are required"));
    }

    if users.iter().any(|u| u.has_username(username)) {
        return Err(DomainError::validation("username is already taken"));
    }

    if position_of(users, &cmd.user_id).is_some() {
        return Err(DomainError::invariant("user id already in use"));
    }

    let user = User {
        id: cmd.user_id.clone(),
        username: username.to_string(),
        password: Some(cmd.password.clone()),
        balance: cmd.welcome_bonus,
        is_admin: is_admin_username(username),
        created_at: cmd.occurred_at,
    };

    let mut next = users.to_vec();
    next.push(user.clone());

    Ok(Registration { users: next, user })
}

// ─────────────────────────────────────────────────────────────────────────────
// Login / removal
// ─────────────────────────────────────────────────────────────────────────────

/// Look up the account matching `username` (case-insensitive) and `password` (exact).
pub fn authenticate<'a>(users: &'a [User], username: &str, password: &str) -> DomainResult<&'a User> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(DomainError::validation("username and password are required"));
    }

    users
        .iter()
        .find(|u| u.has_username(username) && u.password.as_deref() == Some(password))
        .ok_or(DomainError::Unauthorized)
}

/// Remove an account. Its transactions stay in the history.
pub fn remove_user(users: &[User], user_id: &UserId) -> DomainResult<Vec<User>> {
    if position_of(users, user_id).is_none() {
        return Err(DomainError::not_found());
    }
    Ok(users.iter().filter(|u| &u.id != user_id).cloned().collect())
}
