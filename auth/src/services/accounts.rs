use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use gatehouse_models::auth::{Account, NewAccount};

/// Read/write seam over the accounts table.
///
/// The credential verifier only reads; OAuth sign-in additionally creates
/// accounts for first-time visitors.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch at most one account by exact email match.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn create(&self, account: NewAccount) -> Result<Account>;
}

pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Database error looking up account by email: {:?}", e);
            anyhow!("Failed to look up account: {}", e)
        })?;

        Ok(account)
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Database error creating account: {:?}", e);
            anyhow!("Failed to create account: {}", e)
        })?;

        tracing::info!("Created account {} ({})", account.email, account.id);
        Ok(account)
    }
}
