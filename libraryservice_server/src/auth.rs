use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::admins_repository::{AdminCredential, AdminsRepository, AdminsRepositoryError};
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Stored password hash is invalid: {0}")]
    InvalidHash(String),

    #[error(transparent)]
    Repository(#[from] AdminsRepositoryError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Hashes a password with argon2 and a random salt, returns the PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| AuthError::InvalidHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Returns the admin if the username exists and the password matches its hash
pub async fn authenticate(
    admins: &dyn AdminsRepository,
    username: &str,
    password: &str,
) -> Result<Option<AdminCredential>, AuthError> {
    let Some(admin) = admins.find_admin(username).await? else {
        return Ok(None);
    };
    if verify_password(password, &admin.password_hash)? {
        Ok(Some(admin))
    } else {
        Ok(None)
    }
}

/// Creates the admin unless one with the same username is already stored.
/// Returns true if the admin was created
pub async fn ensure_admin(
    admins: &dyn AdminsRepository,
    username: &str,
    password: &str,
) -> Result<bool, AuthError> {
    if admins.find_admin(username).await?.is_some() {
        tracing::info!(username, "Admin user already exists");
        return Ok(false);
    }
    match admins.add_admin(username, &hash_password(password)?).await {
        Ok(_) => {
            tracing::info!(username, "Admin user inserted successfully");
            Ok(true)
        }
        // another instance created it in the meantime
        Err(AdminsRepositoryError::AlreadyExists(_)) => Ok(false),
        Err(err) => Err(err.into()),
    }
}
