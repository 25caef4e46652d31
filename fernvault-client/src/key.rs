//! Local key format validation.
//!
//! A key is 32 bytes of URL-safe base64: exactly 44 characters drawn from
//! `[A-Za-z0-9-_]`. The check runs synchronously and blocks submission on
//! its own; a server confirmation may follow but never replaces it.

use crate::error::KeyError;
use std::fmt;

/// Required key length in characters.
pub const KEY_LENGTH: usize = 44;

/// Checks `key` against the format rules, reporting the first rule it breaks.
pub fn validate(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::MissingKey);
    }

    let actual = key.chars().count();
    if actual != KEY_LENGTH {
        return Err(KeyError::WrongLength {
            expected: KEY_LENGTH,
            actual,
        });
    }

    if !key.chars().all(is_key_char) {
        return Err(KeyError::InvalidCharacters);
    }

    Ok(())
}

/// Membership in the URL-safe base64 alphabet.
pub fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// A key string that passed [`validate`].
///
/// Only exists as transient form state; `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey(String);

impl EncryptionKey {
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        validate(key)?;
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}
