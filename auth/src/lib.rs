// Gatehouse authentication service.
//
// Three login entry points (Google OAuth, GitHub OAuth, local credentials)
// produce signed identity tokens; sessions are derived views over those
// tokens. Handlers live in `handlers`, the verification/signing/OAuth
// machinery in `services`.

pub mod handlers;
pub mod services;

use std::sync::Arc;

use services::accounts::AccountStore;
use services::oauth::OAuthService;
use services::providers::ProviderRegistry;
use services::security::SecurityService;

/// Shared per-worker state. Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub security: SecurityService,
    pub oauth: OAuthService,
    pub providers: ProviderRegistry,
}
