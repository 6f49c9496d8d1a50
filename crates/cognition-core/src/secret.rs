//! Redacting wrapper for credentials.
//!
//! Database passwords and API keys pulled from the environment are held in a
//! [`Secret`] so that they never show up in `Debug` output, log fields or
//! serialized diagnostics. The inner value is zeroed on drop.
//!
//! ```
//! use cognition_core::SecretString;
//!
//! let password = SecretString::from("hunter2");
//! assert_eq!(format!("{:?}", password), "[REDACTED]");
//! assert_eq!(password.expose_as_str(), "hunter2");
//! ```

use serde::{Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const REDACTED: &str = "[REDACTED]";

/// A value that cannot be exposed through formatting or serialization.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret<T: Zeroize> {
    inner: T,
}

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Borrow the secret value.
    ///
    /// The returned reference must not be logged or copied into error messages.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: Zeroize> Serialize for Secret<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(REDACTED)
    }
}

pub type SecretString = Secret<String>;

impl SecretString {
    pub fn expose_as_str(&self) -> &str {
        &self.inner
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Secret::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Secret::new(value.to_string())
    }
}
