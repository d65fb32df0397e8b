use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use gatehouse_models::auth::{AuthResponse, Identity};

use crate::services::providers::ProviderKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    #[allow(dead_code)]
    pub state: Option<String>,
}

/// Start an OAuth login: hand the client the provider's authorization URL
/// and a fresh state value to round-trip.
pub async fn oauth_login(
    provider: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let kind = match provider.parse::<ProviderKind>() {
        Ok(kind) => kind,
        Err(_) => return Ok(invalid_provider()),
    };

    let oauth_state = Uuid::new_v4().to_string();
    match state.oauth.authorization_url(kind, &oauth_state) {
        Ok(authorization_url) => Ok(HttpResponse::Ok().json(json!({
            "authorization_url": authorization_url,
            "state": oauth_state
        }))),
        Err(_) => Ok(invalid_provider()),
    }
}

/// Complete an OAuth login: exchange the code, fetch the profile, match or
/// provision the local account and issue an identity token.
pub async fn oauth_callback(
    provider: web::Path<String>,
    query: web::Query<OAuthCallbackQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let kind = match provider.parse::<ProviderKind>() {
        Ok(kind) => kind,
        Err(_) => return Ok(invalid_provider()),
    };

    let token_response = match state.oauth.exchange_code(kind, &query.code).await {
        Ok(token_response) => token_response,
        Err(e) => {
            tracing::error!("Failed to exchange OAuth code with {}: {}", kind, e);
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Failed to exchange authorization code"
            })));
        }
    };

    let user_info = match state
        .oauth
        .fetch_user_info(kind, &token_response.access_token)
        .await
    {
        Ok(user_info) => user_info,
        Err(e) => {
            tracing::error!("Failed to get user info from {}: {}", kind, e);
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to retrieve user information"
            })));
        }
    };

    let account = match state.oauth.find_or_create_account(&user_info).await {
        Ok(account) => account,
        Err(e) => {
            tracing::error!("Failed to resolve account for {} login: {}", kind, e);
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to resolve account"
            })));
        }
    };

    let identity = Identity::from(account);
    let (token, expires_at) = match state.security.issue(&identity) {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!("Failed to issue token for {}: {}", identity.id, e);
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to generate authentication token"
            })));
        }
    };

    tracing::info!("User {} logged in via {}", identity.id, kind);

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: identity,
        token,
        expires_at,
    }))
}

fn invalid_provider() -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "error": "Invalid provider",
        "message": "Supported providers: google, github"
    }))
}
