use std::sync::Arc;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;

use gatehouse_models::auth::{Account, NewAccount};

use crate::services::accounts::AccountStore;
use crate::services::providers::{Provider, ProviderKind, ProviderRegistry};

#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUserInfo {
    id: u64,
    email: Option<String>,
    login: String,
}

/// Profile fields this service keeps from an OAuth provider.
#[derive(Debug, Clone)]
pub struct OAuthUserInfo {
    pub provider_user_id: String,
    pub email: String,
    pub username: String,
}

/// Drives the Google and GitHub redirect flows: authorization URLs, code
/// exchange and user-info fetch, plus first-login account provisioning.
#[derive(Clone)]
pub struct OAuthService {
    client: Client,
    registry: ProviderRegistry,
    redirect_uri: String,
    accounts: Arc<dyn AccountStore>,
}

impl OAuthService {
    pub fn new(
        registry: ProviderRegistry,
        redirect_uri: String,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            client: Client::new(),
            registry,
            redirect_uri,
            accounts,
        }
    }

    pub fn authorization_url(&self, kind: ProviderKind, state: &str) -> Result<String> {
        let redirect_with_provider = format!("{}?provider={}", self.redirect_uri, kind);
        match self.registry.get(kind) {
            Some(Provider::Google { client_id, .. }) => Ok(format!(
                "https://accounts.google.com/o/oauth2/v2/auth?\
                client_id={}&\
                redirect_uri={}&\
                response_type=code&\
                scope=openid%20email%20profile&\
                state={}",
                client_id,
                urlencoding::encode(&redirect_with_provider),
                state
            )),
            Some(Provider::GitHub { client_id, .. }) => {
                let scopes = "read:user user:email";
                Ok(format!(
                    "https://github.com/login/oauth/authorize?\
                    client_id={}&\
                    redirect_uri={}&\
                    scope={}&\
                    state={}",
                    client_id,
                    urlencoding::encode(&redirect_with_provider),
                    urlencoding::encode(scopes),
                    state
                ))
            }
            _ => Err(anyhow!("{} is not an OAuth provider", kind)),
        }
    }

    pub async fn exchange_code(&self, kind: ProviderKind, code: &str) -> Result<OAuthTokenResponse> {
        match self.registry.get(kind) {
            Some(Provider::Google {
                client_id,
                client_secret,
            }) => self.exchange_google_code(client_id, client_secret, code).await,
            Some(Provider::GitHub {
                client_id,
                client_secret,
            }) => self.exchange_github_code(client_id, client_secret, code).await,
            _ => Err(anyhow!("{} is not an OAuth provider", kind)),
        }
    }

    async fn exchange_google_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<OAuthTokenResponse> {
        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", &self.redirect_uri),
        ];

        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Google token exchange failed: {}", error_text));
        }

        Ok(response.json().await?)
    }

    async fn exchange_github_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<OAuthTokenResponse> {
        // GitHub requires the same redirect_uri the authorization request
        // carried, provider query parameter included.
        let redirect_with_provider = format!("{}?provider=github", self.redirect_uri);
        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_with_provider.as_str()),
        ];

        let response = self
            .client
            .post("https://github.com/login/oauth/access_token")
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(anyhow!(
                "GitHub token exchange failed (status {}): {}",
                status,
                body_text
            ));
        }

        // GitHub reports errors as 200 OK with an "error" field in the body.
        let json_value: serde_json::Value = serde_json::from_str(&body_text)
            .map_err(|e| anyhow!("GitHub token exchange failed: invalid JSON response: {}", e))?;

        if let Some(error) = json_value.get("error").and_then(|v| v.as_str()) {
            let description = json_value
                .get("error_description")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            return Err(anyhow!("GitHub OAuth error: {} - {}", error, description));
        }

        let token_response: OAuthTokenResponse = serde_json::from_value(json_value)
            .map_err(|e| anyhow!("GitHub token exchange failed: could not decode response: {}", e))?;

        Ok(token_response)
    }

    pub async fn fetch_user_info(
        &self,
        kind: ProviderKind,
        access_token: &str,
    ) -> Result<OAuthUserInfo> {
        match kind {
            ProviderKind::Google => {
                let user_info: GoogleUserInfo = self
                    .client
                    .get("https://www.googleapis.com/oauth2/v2/userinfo")
                    .bearer_auth(access_token)
                    .send()
                    .await?
                    .json()
                    .await?;

                // Google has no username concept; the mail-local part plays
                // that role, the same as for manually provisioned accounts.
                let username = user_info
                    .email
                    .split('@')
                    .next()
                    .unwrap_or(&user_info.name)
                    .to_string();

                Ok(OAuthUserInfo {
                    provider_user_id: user_info.sub,
                    email: user_info.email,
                    username,
                })
            }
            ProviderKind::GitHub => {
                let user_info: GitHubUserInfo = self
                    .client
                    .get("https://api.github.com/user")
                    .header("User-Agent", "Gatehouse")
                    .bearer_auth(access_token)
                    .send()
                    .await?
                    .json()
                    .await?;

                let email = match user_info.email {
                    Some(email) => email,
                    None => self.fetch_github_primary_email(access_token).await?,
                };

                Ok(OAuthUserInfo {
                    provider_user_id: user_info.id.to_string(),
                    email,
                    username: user_info.login,
                })
            }
            ProviderKind::Credentials => Err(anyhow!("credentials is not an OAuth provider")),
        }
    }

    async fn fetch_github_primary_email(&self, access_token: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct GitHubEmail {
            email: String,
            primary: bool,
            verified: bool,
        }

        let emails: Vec<GitHubEmail> = self
            .client
            .get("https://api.github.com/user/emails")
            .header("User-Agent", "Gatehouse")
            .bearer_auth(access_token)
            .send()
            .await?
            .json()
            .await?;

        emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email)
            .ok_or_else(|| anyhow!("No verified primary email found"))
    }

    /// Match the OAuth profile to a local account by email, provisioning one
    /// on first login. OAuth-only accounts get a placeholder password hash
    /// that can never be entered on the credentials path.
    pub async fn find_or_create_account(&self, info: &OAuthUserInfo) -> Result<Account> {
        if let Some(account) = self.accounts.find_by_email(&info.email).await? {
            return Ok(account);
        }

        let placeholder = bcrypt::hash(uuid::Uuid::new_v4().to_string(), bcrypt::DEFAULT_COST)?;
        self.accounts
            .create(NewAccount {
                username: info.username.clone(),
                email: info.email.clone(),
                password_hash: placeholder,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use gatehouse_config::AuthConfig;
    use gatehouse_models::auth::NewAccount;

    struct NoAccounts;

    #[async_trait]
    impl AccountStore for NoAccounts {
        async fn find_by_email(&self, _email: &str) -> Result<Option<Account>> {
            Ok(None)
        }

        async fn create(&self, _account: NewAccount) -> Result<Account> {
            Err(anyhow!("not available in this test"))
        }
    }

    fn service() -> OAuthService {
        let config = AuthConfig {
            port: 3010,
            database_url: "postgresql://localhost/test".to_string(),
            session_secret: "test-secret".to_string(),
            token_ttl_hours: 24,
            oauth_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            google_client_id: "google-id".to_string(),
            google_client_secret: "google-secret".to_string(),
            github_client_id: "github-id".to_string(),
            github_client_secret: "github-secret".to_string(),
        };
        OAuthService::new(
            ProviderRegistry::from_config(&config),
            config.oauth_redirect_uri.clone(),
            Arc::new(NoAccounts),
        )
    }

    #[test]
    fn google_authorization_url_carries_client_and_redirect() {
        let url = service()
            .authorization_url(ProviderKind::Google, "state-123")
            .unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=google-id"));
        assert!(url.contains("state=state-123"));
        assert!(url.contains(&urlencoding::encode(
            "http://localhost:3000/auth/callback?provider=google"
        ).to_string()));
    }

    #[test]
    fn github_authorization_url_requests_the_email_scope() {
        let url = service()
            .authorization_url(ProviderKind::GitHub, "state-456")
            .unwrap();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=github-id"));
        assert!(url.contains(&urlencoding::encode("read:user user:email").to_string()));
    }

    #[test]
    fn credentials_has_no_authorization_url() {
        assert!(service()
            .authorization_url(ProviderKind::Credentials, "state")
            .is_err());
    }
}
