use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// A local account as stored in the `accounts` table.
///
/// IDs are opaque strings (UUIDv4 rendered as text); the account store owns
/// every column here and the rest of the service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a new account. The store assigns id and
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// The verified principal produced by a successful credential check or a
/// completed OAuth exchange. `name` is the account's username, not a
/// separate display-name field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<Account> for Identity {
    fn from(account: Account) -> Self {
        Identity {
            id: account.id,
            name: account.username,
            email: account.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: Identity,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication failures.
///
/// Missing fields, an unknown email and a wrong password all collapse into
/// `InvalidCredentials`; the caller cannot tell which factor failed. Store
/// failures pass through separately so an outage is never reported as a bad
/// password.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
