//! Argon2id password hashing, run on the blocking thread pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Well-formed hash that matches no password. Verified against when the
/// email is unknown so a login takes the same time either way.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$\
                          AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password using Argon2id with a fresh random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
}

/// Verify a password against a stored hash, or against a dummy hash when
/// there is no account.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match or
/// `stored_hash` is `None`.
pub async fn verify_password(password: &str, stored_hash: Option<String>) -> Result<(), AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_blocking(&password, &hash),
        None => {
            let _ = verify_blocking(&password, DUMMY_HASH);
            Err(AuthError::InvalidCredentials)
        }
    })
    .await?
}

fn hash_blocking(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_blocking(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("Valid@123").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("Valid@123"));

        assert!(verify_password("Valid@123", Some(hash.clone())).await.is_ok());
        assert!(matches!(
            verify_password("Valid@124", Some(hash)).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = hash_password("Valid@123").await.unwrap();
        let b = hash_password("Valid@123").await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_hash_parses() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
    }

    #[tokio::test]
    async fn test_missing_account_is_rejected() {
        assert!(matches!(
            verify_password("Valid@123", None).await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
