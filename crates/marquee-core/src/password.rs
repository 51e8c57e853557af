// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id password hashing.
//!
//! A [`Password`] always carries a hash. The plaintext is only kept (as a
//! [`SecretString`]) on values built with [`Password::set`], so that length
//! rules can be checked after hashing; it is never persisted or serialized.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};

use crate::error::MarqueeError;

const SALT_LEN: usize = 16;

pub struct Password {
    plaintext: Option<SecretString>,
    hash: Vec<u8>,
}

impl Password {
    /// Hashes `plaintext` with Argon2id and a fresh random salt.
    pub fn set(plaintext: &str) -> Result<Self, MarqueeError> {
        let mut salt = [0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| MarqueeError::Internal("failed to generate password salt".into()))?;
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| MarqueeError::Internal(format!("failed to encode salt: {e}")))?;
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| MarqueeError::Internal(format!("failed to hash password: {e}")))?
            .to_string();

        Ok(Self {
            plaintext: Some(SecretString::from(plaintext.to_owned())),
            hash: hash.into_bytes(),
        })
    }

    /// Wraps a stored PHC hash string.
    pub fn from_hash(hash: Vec<u8>) -> Self {
        Self {
            plaintext: None,
            hash,
        }
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn plaintext(&self) -> Option<&str> {
        self.plaintext.as_ref().map(|p| p.expose_secret())
    }

    /// Checks `candidate` against the stored hash.
    pub fn matches(&self, candidate: &str) -> Result<bool, MarqueeError> {
        let encoded = std::str::from_utf8(&self.hash)
            .map_err(|e| MarqueeError::Internal(format!("stored password hash is not UTF-8: {e}")))?;
        let parsed = PasswordHash::new(encoded)
            .map_err(|e| MarqueeError::Internal(format!("malformed password hash: {e}")))?;
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(MarqueeError::Internal(format!(
                "password verification failed: {e}"
            ))),
        }
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("plaintext", &self.plaintext.as_ref().map(|_| "[REDACTED]"))
            .field("hash", &"[REDACTED]")
            .finish()
    }
}
