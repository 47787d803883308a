//! Credential hashing.
//!
//! One-way Argon2id hashing with a fresh random salt per call; the salt and
//! cost parameters are embedded in the PHC string that gets stored.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use std::fmt;
use std::sync::OnceLock;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Newtype for password hash
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for PasswordHashString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHashString(***)")
    }
}

/// Hash a password using Argon2id with the crate's fixed default cost.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Verify a password against a stored hash.
///
/// A mismatch is `false`, never an error. A stored hash that cannot be
/// parsed also yields `false` and is logged, since no password can match it.
pub fn verify_password(password: &Password, password_hash: &PasswordHashString) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash.as_str()) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    match Argon2::default().verify_password(password.as_str().as_bytes(), &parsed_hash) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            tracing::error!(error = %e, "Password verification failed unexpectedly");
            false
        }
    }
}

pub(crate) static DUMMY_PASSWORD_HASH: OnceLock<PasswordHashString> = OnceLock::new();

/// Hash that no submitted password matches. Verifying against it when an
/// account does not exist costs the same Argon2 work as a real mismatch.
pub fn dummy_password_hash() -> &'static PasswordHashString {
    DUMMY_PASSWORD_HASH.get_or_init(|| {
        hash_password(&generate_temporary_password()).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build dummy password hash");
            PasswordHashString::new(String::new())
        })
    })
}

/// Random throwaway password for invited accounts. Hashed and discarded;
/// the invitee sets a real one when accepting.
pub fn generate_temporary_password() -> Password {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    Password::new(hex::encode(bytes))
}
