use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use gatehouse_models::auth::Identity;
use gatehouse_models::claims::{extend_token, TokenClaims, TOKEN_ISSUER};

/// Signs and verifies identity tokens (HS256 over the session secret).
#[derive(Clone)]
pub struct SecurityService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl SecurityService {
    pub fn new(session_secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(session_secret.as_bytes()),
            token_ttl,
        }
    }

    /// Issue a token for a freshly authenticated principal. The identity
    /// claims are written exactly once here, at login.
    pub fn issue(&self, identity: &Identity) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let base = TokenClaims::base(
            now.timestamp() as usize,
            expires_at.timestamp() as usize,
            Uuid::new_v4().to_string(),
        );
        let claims = extend_token(base, Some(identity));

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// Re-sign a verified claim set with fresh issuance metadata. No new
    /// login happened, so the identity claims pass through untouched.
    pub fn reissue(&self, claims: TokenClaims) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let mut claims = extend_token(claims, None);
        claims.iat = now.timestamp() as usize;
        claims.exp = expires_at.timestamp() as usize;
        claims.jti = Uuid::new_v4().to_string();

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }
}
