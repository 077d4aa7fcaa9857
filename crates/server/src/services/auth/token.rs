//! Stateless bearer tokens (HS256 JWT).
//!
//! The token itself is the session: it carries the account ID, email and
//! role, and is valid until `exp`. Nothing is stored server-side, so logout
//! is the client discarding the token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use store_ratings_core::{Email, Principal, Role, UserId};

use super::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account ID, as a decimal string.
    sub: String,
    email: Email,
    role: Role,
    iat: i64,
    exp: i64,
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies bearer tokens with a shared HMAC secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service signing with `secret`; tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl,
        }
    }

    /// Issue a token for `principal`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the token cannot be encoded.
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, AuthError> {
        self.issue_at(principal, Utc::now())
    }

    fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: principal.user_id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenSigning)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return the identity it carries.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the signature, expiry or claims
    /// do not check out.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(AuthError::InvalidToken)?;

        let user_id = data.claims.sub.parse::<i32>().map_err(|_| {
            AuthError::InvalidToken(jsonwebtoken::errors::ErrorKind::InvalidSubject.into())
        })?;

        Ok(Principal {
            user_id: UserId::new(user_id),
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn service() -> TokenService {
        TokenService::new(&secret("k3Yq9vLx2Rm7Tz4Wp8Nc6Bd1Fh5Gj0Sa"), Duration::hours(24))
    }

    fn alice() -> Principal {
        Principal {
            user_id: UserId::new(42),
            email: Email::parse("alice@example.com").unwrap(),
            role: Role::StoreOwner,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service();
        let issued = tokens.issue(&alice()).unwrap();
        assert_eq!(tokens.verify(&issued.token).unwrap(), alice());
    }

    #[test]
    fn test_expiry_is_ttl_from_now() {
        let now = Utc::now();
        let issued = service().issue_at(&alice(), now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::hours(24));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let issued = tokens
            .issue_at(&alice(), Utc::now() - Duration::hours(25))
            .unwrap();
        assert!(matches!(
            tokens.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = TokenService::new(
            &secret("Zp4Lm8Qw2Xr6Nv0Ty3Ks7Hd1Bf5Gc9Ja"),
            Duration::hours(24),
        );
        let issued = other.issue(&alice()).unwrap();
        assert!(service().verify(&issued.token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = service();
        let issued = tokens.issue(&alice()).unwrap();
        let mut tampered = issued.token;
        tampered.push('x');
        assert!(tokens.verify(&tampered).is_err());
        assert!(tokens.verify("not.a.token").is_err());
    }
}
