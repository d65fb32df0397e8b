use std::sync::Arc;

use gatehouse_models::auth::{AuthError, Identity};

use crate::services::accounts::AccountStore;

/// Verifies local email/password credentials against the account store.
pub struct CredentialService {
    accounts: Arc<dyn AccountStore>,
}

impl CredentialService {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Check whether `email`/`password` identify a valid local account.
    ///
    /// A missing field, an unknown email and a wrong password all fail with
    /// the same error; the caller cannot tell which factor was at fault.
    pub async fn verify(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let account = match self.accounts.find_by_email(email).await? {
            Some(account) => account,
            None => return Err(AuthError::InvalidCredentials),
        };

        // bcrypt::verify re-hashes with the stored salt and compares in
        // constant time. An unparseable stored hash fails like a mismatch.
        match bcrypt::verify(password, &account.password_hash) {
            Ok(true) => Ok(Identity::from(account)),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use gatehouse_models::auth::{Account, NewAccount};

    struct MemoryAccountStore {
        accounts: Mutex<HashMap<String, Account>>,
    }

    impl MemoryAccountStore {
        fn seeded(accounts: Vec<Account>) -> Arc<Self> {
            Arc::new(Self {
                accounts: Mutex::new(
                    accounts.into_iter().map(|a| (a.email.clone(), a)).collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl AccountStore for MemoryAccountStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
            Ok(self.accounts.lock().unwrap().get(email).cloned())
        }

        async fn create(&self, account: NewAccount) -> Result<Account> {
            let now = Utc::now();
            let account = Account {
                id: format!("mem-{}", self.accounts.lock().unwrap().len() + 1),
                username: account.username,
                email: account.email,
                password_hash: account.password_hash,
                created_at: now,
                updated_at: now,
            };
            self.accounts
                .lock()
                .unwrap()
                .insert(account.email.clone(), account.clone());
            Ok(account)
        }
    }

    fn alice() -> Account {
        let now = Utc::now();
        Account {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: bcrypt::hash("correct", bcrypt::DEFAULT_COST).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    fn service() -> CredentialService {
        CredentialService::new(MemoryAccountStore::seeded(vec![alice()]))
    }

    #[tokio::test]
    async fn verify_returns_the_identity_on_a_match() {
        let identity = service().verify("a@x.com", "correct").await.unwrap();

        assert_eq!(
            identity,
            Identity {
                id: "u1".to_string(),
                name: "alice".to_string(),
                email: "a@x.com".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn verify_sources_name_from_the_username() {
        let identity = service().verify("a@x.com", "correct").await.unwrap();
        assert_eq!(identity.name, "alice");
    }

    #[tokio::test]
    async fn unknown_email_fails() {
        let err = service().verify("nobody@x.com", "correct").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_fails() {
        let err = service().verify("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn missing_fields_fail() {
        let service = service();
        assert!(matches!(
            service.verify("", "correct").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            service.verify("a@x.com", "").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn failure_modes_are_indistinguishable() {
        let service = service();
        let no_account = service.verify("nobody@x.com", "correct").await.unwrap_err();
        let bad_password = service.verify("a@x.com", "wrong").await.unwrap_err();

        assert_eq!(no_account.to_string(), bad_password.to_string());
    }
}
