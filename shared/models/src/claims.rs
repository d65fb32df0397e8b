use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// Issuer stamped into every token this service signs.
pub const TOKEN_ISSUER: &str = "gatehouse-auth";

/// The signed claim set carried by an identity token.
///
/// `sub`, `name` and `email` are the identity claims; everything else is
/// issuance metadata that claim propagation must never touch. A token with
/// `sub = None` has not been claimed by a login event yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub jti: String,
}

impl TokenClaims {
    /// A fresh claim set with issuance metadata only.
    pub fn base(iat: usize, exp: usize, jti: String) -> Self {
        TokenClaims {
            sub: None,
            name: None,
            email: None,
            iat,
            exp,
            iss: TOKEN_ISSUER.to_string(),
            jti,
        }
    }

    /// Whether a login event has populated the identity claims.
    pub fn has_identity(&self) -> bool {
        self.sub.is_some()
    }
}

/// The identity sub-object exposed on a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A per-request view over a token. Recreated on every session read; it has
/// no identity of its own beyond what the token supplies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

impl Session {
    /// An empty session shell expiring with the backing token.
    pub fn expiring_at(expires: DateTime<Utc>) -> Self {
        Session {
            user: SessionUser::default(),
            expires,
        }
    }
}

/// Copy identity claims onto a token at login time.
///
/// With an identity present this overwrites `sub`, `name` and `email` and
/// nothing else; without one the token passes through unchanged, so a
/// refresh never disturbs claims set by the original login.
pub fn extend_token(mut token: TokenClaims, identity: Option<&Identity>) -> TokenClaims {
    if let Some(identity) = identity {
        token.sub = Some(identity.id.clone());
        token.name = Some(identity.name.clone());
        token.email = Some(identity.email.clone());
    }
    token
}

/// Materialize a session from a token.
///
/// The session's user is replaced wholesale with the token's claims; nothing
/// from a previous user value survives.
pub fn derive_session(mut session: Session, token: &TokenClaims) -> Session {
    session.user = SessionUser {
        id: token.sub.clone().unwrap_or_default(),
        name: token.name.clone(),
        email: token.email.clone(),
    };
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> Identity {
        Identity {
            id: "u1".to_string(),
            name: "alice".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    fn base_token() -> TokenClaims {
        TokenClaims::base(1_700_000_000, 1_700_086_400, "jti-1".to_string())
    }

    #[test]
    fn extend_token_copies_identity_claims() {
        let token = extend_token(base_token(), Some(&identity()));

        assert_eq!(token.sub.as_deref(), Some("u1"));
        assert_eq!(token.name.as_deref(), Some("alice"));
        assert_eq!(token.email.as_deref(), Some("a@x.com"));
        assert!(token.has_identity());
    }

    #[test]
    fn extend_token_leaves_issuance_metadata_untouched() {
        let token = extend_token(base_token(), Some(&identity()));

        assert_eq!(token.iat, 1_700_000_000);
        assert_eq!(token.exp, 1_700_086_400);
        assert_eq!(token.iss, TOKEN_ISSUER);
        assert_eq!(token.jti, "jti-1");
    }

    #[test]
    fn extend_token_without_identity_is_a_no_op() {
        let claimed = extend_token(base_token(), Some(&identity()));
        let refreshed = extend_token(claimed.clone(), None);

        assert_eq!(refreshed, claimed);
    }

    #[test]
    fn base_token_starts_without_identity() {
        assert!(!base_token().has_identity());
    }

    #[test]
    fn derive_session_replaces_the_user_wholesale() {
        let token = extend_token(base_token(), Some(&identity()));
        let expires = Utc.timestamp_opt(1_700_086_400, 0).unwrap();
        let mut session = Session::expiring_at(expires);
        session.user = SessionUser {
            id: "someone-else".to_string(),
            name: Some("bob".to_string()),
            email: None,
        };

        let session = derive_session(session, &token);

        assert_eq!(session.user.id, "u1");
        assert_eq!(session.user.name.as_deref(), Some("alice"));
        assert_eq!(session.user.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn derive_session_keeps_the_expiry() {
        let token = extend_token(base_token(), Some(&identity()));
        let expires = Utc.timestamp_opt(1_700_086_400, 0).unwrap();

        let session = derive_session(Session::expiring_at(expires), &token);

        assert_eq!(session.expires, expires);
    }
}
