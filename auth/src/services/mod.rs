pub mod accounts;
pub mod credentials;
pub mod oauth;
pub mod providers;
pub mod security;

pub use accounts::{AccountStore, PgAccountStore};
pub use credentials::CredentialService;
pub use oauth::OAuthService;
pub use providers::{Provider, ProviderKind, ProviderRegistry};
pub use security::SecurityService;
