use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use gatehouse_models::auth::{AuthError, AuthResponse, LoginRequest, RefreshResponse};
use gatehouse_models::claims::{derive_session, Session};

use crate::services::credentials::CredentialService;
use crate::AppState;

/// Local credentials entry point.
///
/// The request body is deliberately not shape-validated up front: an absent
/// or empty field has to fail exactly like a wrong password.
pub async fn login(
    request: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let credentials = CredentialService::new(state.accounts.clone());

    let identity = match credentials.verify(&request.email, &request.password).await {
        Ok(identity) => identity,
        Err(AuthError::InvalidCredentials) => {
            return Ok(HttpResponse::Unauthorized().json(json!({
                "error": "Invalid credentials"
            })));
        }
        Err(AuthError::Store(e)) => {
            tracing::error!("Account lookup failed during login: {}", e);
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Service unavailable"
            })));
        }
    };

    let (token, expires_at) = match state.security.issue(&identity) {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!("Failed to issue token for {}: {}", identity.id, e);
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to generate authentication token"
            })));
        }
    };

    tracing::info!("User {} logged in with credentials", identity.id);

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: identity,
        token,
        expires_at,
    }))
}

/// Materialize the session view for the presented token.
pub async fn session(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return Ok(unauthorized()),
    };

    let claims = match state.security.verify(token) {
        Ok(claims) if claims.has_identity() => claims,
        _ => return Ok(unauthorized()),
    };

    let expires = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
        .unwrap_or_else(|| Utc::now() + Duration::hours(1));
    let session = derive_session(Session::expiring_at(expires), &claims);

    Ok(HttpResponse::Ok().json(session))
}

/// Re-sign the presented token with a fresh expiry. Identity claims are
/// carried forward untouched; only a new login can change them.
pub async fn refresh(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return Ok(unauthorized()),
    };

    let claims = match state.security.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Token refresh failed: {}", e);
            return Ok(unauthorized());
        }
    };

    match state.security.reissue(claims) {
        Ok((token, expires_at)) => Ok(HttpResponse::Ok().json(RefreshResponse { token, expires_at })),
        Err(e) => {
            tracing::error!("Failed to reissue token: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to generate authentication token"
            })))
        }
    }
}

/// The fixed set of login entry points this deployment offers.
pub async fn providers(state: web::Data<AppState>) -> Result<HttpResponse> {
    let providers: Vec<_> = state
        .providers
        .iter()
        .map(|p| {
            json!({
                "id": p.kind().to_string(),
                "type": p.flow(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "providers": providers })))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "error": "Invalid or expired token"
    }))
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/login", web::post().to(login))
            .route("/session", web::get().to(session))
            .route("/refresh", web::post().to(refresh))
            .route("/providers", web::get().to(providers))
            .route("/oauth/{provider}", web::get().to(super::oauth::oauth_login))
            .route(
                "/oauth/{provider}/callback",
                web::get().to(super::oauth::oauth_callback),
            ),
    );
}
