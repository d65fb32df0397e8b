use std::fmt;
use std::str::FromStr;

use gatehouse_config::AuthConfig;

/// Wire names of the login entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    GitHub,
    Credentials,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::GitHub => write!(f, "github"),
            ProviderKind::Credentials => write!(f, "credentials"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "github" => Ok(ProviderKind::GitHub),
            "credentials" => Ok(ProviderKind::Credentials),
            _ => Err(()),
        }
    }
}

/// A configured login provider. The set is fixed; each OAuth variant owns
/// the client credentials it needs, so there is no shape-checking at the
/// point of use.
#[derive(Debug, Clone)]
pub enum Provider {
    Google {
        client_id: String,
        client_secret: String,
    },
    GitHub {
        client_id: String,
        client_secret: String,
    },
    Credentials,
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Google { .. } => ProviderKind::Google,
            Provider::GitHub { .. } => ProviderKind::GitHub,
            Provider::Credentials => ProviderKind::Credentials,
        }
    }

    /// Whether logins on this provider go through the OAuth redirect flow
    /// or the local credentials form.
    pub fn flow(&self) -> &'static str {
        match self {
            Provider::Google { .. } | Provider::GitHub { .. } => "oauth",
            Provider::Credentials => "credentials",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            providers: vec![
                Provider::Google {
                    client_id: config.google_client_id.clone(),
                    client_secret: config.google_client_secret.clone(),
                },
                Provider::GitHub {
                    client_id: config.github_client_id.clone(),
                    client_secret: config.github_client_secret.clone(),
                },
                Provider::Credentials,
            ],
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Provider> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            port: 3010,
            database_url: "postgresql://localhost/test".to_string(),
            session_secret: "test-secret".to_string(),
            token_ttl_hours: 24,
            oauth_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            google_client_id: "google-id".to_string(),
            google_client_secret: "google-secret".to_string(),
            github_client_id: "github-id".to_string(),
            github_client_secret: "github-secret".to_string(),
        }
    }

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!("google".parse(), Ok(ProviderKind::Google));
        assert_eq!("GitHub".parse(), Ok(ProviderKind::GitHub));
        assert_eq!("CREDENTIALS".parse(), Ok(ProviderKind::Credentials));
        assert!("saml".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn registry_holds_the_fixed_provider_set() {
        let registry = ProviderRegistry::from_config(&test_config());

        let kinds: Vec<ProviderKind> = registry.iter().map(Provider::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ProviderKind::Google,
                ProviderKind::GitHub,
                ProviderKind::Credentials
            ]
        );
    }

    #[test]
    fn oauth_variants_carry_their_client_credentials() {
        let registry = ProviderRegistry::from_config(&test_config());

        match registry.get(ProviderKind::GitHub) {
            Some(Provider::GitHub {
                client_id,
                client_secret,
            }) => {
                assert_eq!(client_id, "github-id");
                assert_eq!(client_secret, "github-secret");
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn credentials_provider_uses_the_credentials_flow() {
        let registry = ProviderRegistry::from_config(&test_config());
        let provider = registry.get(ProviderKind::Credentials).unwrap();
        assert_eq!(provider.flow(), "credentials");
    }
}
